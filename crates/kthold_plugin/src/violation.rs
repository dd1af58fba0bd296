//! Violation records reported by the analysis engine.

use serde::{Deserialize, Serialize};

/// A single rule finding at a specific location in a file.
///
/// Lines and columns are 1-based.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    /// Line of the finding (1-based).
    pub line: u32,

    /// Column of the finding (1-based).
    pub column: u32,

    /// The rule that produced this violation, namespaced by provider.
    pub rule_id: String,

    /// Human-readable message.
    pub message: String,

    /// Whether the engine can fix this violation mechanically.
    #[serde(default)]
    pub can_be_auto_corrected: bool,
}

impl Violation {
    /// Creates a new violation that cannot be auto-corrected.
    pub fn new(
        line: u32,
        column: u32,
        rule_id: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            column,
            rule_id: rule_id.into(),
            message: message.into(),
            can_be_auto_corrected: false,
        }
    }

    /// Marks the violation as auto-correctable.
    pub fn correctable(mut self) -> Self {
        self.can_be_auto_corrected = true;
        self
    }

    /// Returns the identity used to match this violation against a baseline.
    pub fn key(&self) -> ViolationKey {
        ViolationKey {
            line: self.line,
            column: self.column,
            rule_id: self.rule_id.clone(),
            message: self.message.clone(),
        }
    }
}

/// Position-sensitive identity of a violation.
///
/// Two violations with the same key are the same finding for baseline
/// purposes, regardless of whether they are auto-correctable.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ViolationKey {
    pub line: u32,
    pub column: u32,
    pub rule_id: String,
    pub message: String,
}

impl From<&Violation> for ViolationKey {
    fn from(violation: &Violation) -> Self {
        violation.key()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_violation_new() {
        let v = Violation::new(3, 7, "no-wildcard-imports", "Wildcard import");

        assert_eq!(v.line, 3);
        assert_eq!(v.column, 7);
        assert_eq!(v.rule_id, "no-wildcard-imports");
        assert!(!v.can_be_auto_corrected);
    }

    #[test]
    fn test_key_ignores_correctable_flag() {
        let plain = Violation::new(1, 1, "indent", "Unexpected indentation");
        let fixable = plain.clone().correctable();

        assert_ne!(plain, fixable);
        assert_eq!(plain.key(), fixable.key());
    }

    #[test]
    fn test_key_is_position_sensitive() {
        let a = Violation::new(10, 1, "indent", "Unexpected indentation");
        let b = Violation::new(11, 1, "indent", "Unexpected indentation");

        assert_ne!(a.key(), b.key());
    }

    #[test]
    fn test_deserialize_camel_case() {
        let json = r#"{"line":2,"column":5,"ruleId":"custom:bar","message":"m","canBeAutoCorrected":true}"#;
        let v: Violation = serde_json::from_str(json).unwrap();

        assert_eq!(v.rule_id, "custom:bar");
        assert!(v.can_be_auto_corrected);
    }

    #[test]
    fn test_deserialize_defaults_correctable_flag() {
        let json = r#"{"line":2,"column":5,"ruleId":"indent","message":"m"}"#;
        let v: Violation = serde_json::from_str(json).unwrap();

        assert!(!v.can_be_auto_corrected);
    }
}
