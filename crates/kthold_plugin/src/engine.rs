//! Analysis engine abstraction.
//!
//! This module provides the `Engine` trait which abstracts the component
//! that actually parses Kotlin and applies rules. kthold only assembles the
//! input and consumes the reported violations.

use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

use thiserror::Error;

use crate::{RuleProvider, Violation};

/// Receives each violation as the engine discovers it.
///
/// The second argument is `true` when the engine fixed the violation during
/// a format pass.
pub type ViolationSink<'a> = dyn FnMut(Violation, bool) + 'a;

/// Input for one engine invocation.
#[derive(Debug, Clone, Copy)]
pub struct EngineParams<'a> {
    /// Absolute path of the file, or its display name when it has none.
    pub file_name: &'a str,
    /// Current text of the file.
    pub text: &'a str,
    /// Rule providers in discovery order.
    pub providers: &'a [Arc<dyn RuleProvider>],
    /// User options such as `android` and `disabled_rules`.
    pub user_data: &'a BTreeMap<String, String>,
    /// Whether the file is a Kotlin script.
    pub script: bool,
    /// Explicit `.editorconfig` location, if configured.
    pub editor_config_path: Option<&'a Path>,
}

/// Errors reported by an engine.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The engine could not parse the input.
    #[error("Parse error at {line}:{column}: {message}")]
    Parse {
        line: u32,
        column: u32,
        message: String,
    },

    /// The engine could not be started or reached.
    #[error("Engine unavailable: {0}")]
    Unavailable(String),

    /// The engine answered with something that does not follow the protocol.
    #[error("Protocol error: {0}")]
    Protocol(String),

    /// The engine reported an internal failure.
    #[error("Engine failure: {0}")]
    Internal(String),

    /// I/O error while talking to the engine.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl EngineError {
    /// Creates a parse error.
    pub fn parse(line: u32, column: u32, message: impl Into<String>) -> Self {
        Self::Parse {
            line,
            column,
            message: message.into(),
        }
    }

    /// Creates a protocol error.
    pub fn protocol(message: impl Into<String>) -> Self {
        Self::Protocol(message.into())
    }

    /// Returns whether this is a parse failure.
    pub fn is_parse(&self) -> bool {
        matches!(self, Self::Parse { .. })
    }
}

/// Trait for analysis engines.
///
/// Both passes deliver violations synchronously through `sink`, in the
/// order the engine discovers them.
pub trait Engine: Send + Sync {
    /// Providers compiled into the engine.
    fn builtin_providers(&self) -> Vec<Arc<dyn RuleProvider>>;

    /// Lints the text without modifying it.
    fn lint(&self, params: &EngineParams<'_>, sink: &mut ViolationSink<'_>)
    -> Result<(), EngineError>;

    /// Lints and corrects the text, returning the corrected text.
    fn format(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<String, EngineError>;

    /// Clears caches the engine keeps across invocations for environment
    /// discovery, such as `.editorconfig` lookups.
    fn invalidate_caches(&self) {}
}

impl<E: Engine + ?Sized> Engine for Arc<E> {
    fn builtin_providers(&self) -> Vec<Arc<dyn RuleProvider>> {
        (**self).builtin_providers()
    }

    fn lint(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<(), EngineError> {
        (**self).lint(params, sink)
    }

    fn format(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<String, EngineError> {
        (**self).format(params, sink)
    }

    fn invalidate_caches(&self) {
        (**self).invalidate_caches()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_error_display() {
        let err = EngineError::parse(3, 14, "Expecting ')'");
        assert_eq!(err.to_string(), "Parse error at 3:14: Expecting ')'");
        assert!(err.is_parse());
    }

    #[test]
    fn test_other_errors_are_not_parse() {
        assert!(!EngineError::protocol("bad json").is_parse());
        assert!(!EngineError::Unavailable("missing".into()).is_parse());
    }
}
