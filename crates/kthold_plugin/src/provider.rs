//! Rule provider abstraction.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Id of the provider whose rules are referenced without a namespace.
pub const STANDARD_PROVIDER_ID: &str = "standard";

/// A named collection of rules, either built into the engine or supplied by
/// a plugin archive.
pub trait RuleProvider: fmt::Debug + Send + Sync {
    /// Stable provider id (e.g. `standard`, `experimental`, `custom`).
    fn id(&self) -> &str;

    /// Rule ids contributed by this provider, in declaration order.
    fn rules(&self) -> &[String];
}

/// Plain provider backed by owned data.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RuleSet {
    pub id: String,
    #[serde(default)]
    pub rules: Vec<String>,
}

impl RuleSet {
    /// Creates a new rule set.
    pub fn new<I, S>(id: impl Into<String>, rules: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            rules: rules.into_iter().map(Into::into).collect(),
        }
    }

    /// Copies any provider into a `RuleSet`.
    pub fn from_provider(provider: &dyn RuleProvider) -> Self {
        Self {
            id: provider.id().to_string(),
            rules: provider.rules().to_vec(),
        }
    }
}

impl RuleProvider for RuleSet {
    fn id(&self) -> &str {
        &self.id
    }

    fn rules(&self) -> &[String] {
        &self.rules
    }
}

/// Returns the rule ids of a provider as exposed to configuration.
///
/// Rules of the `standard` provider keep their bare id; rules of any other
/// provider `P` become `P:rule`.
pub fn namespaced_rule_ids(provider: &dyn RuleProvider) -> Vec<String> {
    let id = provider.id();
    provider
        .rules()
        .iter()
        .map(|rule| {
            if id == STANDARD_PROVIDER_ID {
                rule.clone()
            } else {
                format!("{}:{}", id, rule)
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_standard_rules_are_bare() {
        let provider = RuleSet::new("standard", ["foo", "indent"]);
        assert_eq!(namespaced_rule_ids(&provider), vec!["foo", "indent"]);
    }

    #[test]
    fn test_other_rules_are_namespaced() {
        let provider = RuleSet::new("custom", ["bar"]);
        assert_eq!(namespaced_rule_ids(&provider), vec!["custom:bar"]);
    }

    #[test]
    fn test_standard_match_is_exact() {
        let provider = RuleSet::new("Standard", ["foo"]);
        assert_eq!(namespaced_rule_ids(&provider), vec!["Standard:foo"]);
    }

    #[test]
    fn test_from_provider_copies_rules() {
        let provider = RuleSet::new("experimental", ["a", "b"]);
        let copy = RuleSet::from_provider(&provider);
        assert_eq!(copy, provider);
    }
}
