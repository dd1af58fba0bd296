//! Linter error types.

use thiserror::Error;

/// Errors that can occur while running kthold.
///
/// Parse failures never surface here; the linter turns them into an empty
/// result.
#[derive(Debug, Error)]
pub enum LinterError {
    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(String),

    /// Baseline error.
    #[error("Baseline error: {0}")]
    Baseline(String),

    /// Engine error.
    #[error("Engine error: {0}")]
    Engine(#[from] kthold_plugin::EngineError),

    /// Document write error.
    #[error("Document error: {0}")]
    Document(#[from] crate::DocumentError),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LinterError {
    /// Creates a configuration error.
    pub fn config(message: impl Into<String>) -> Self {
        Self::Config(message.into())
    }

    /// Creates a baseline error.
    pub fn baseline(message: impl Into<String>) -> Self {
        Self::Baseline(message.into())
    }
}
