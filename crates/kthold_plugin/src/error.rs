//! Plugin error types.

use thiserror::Error;

/// Errors that can occur while loading plugin archives.
#[derive(Debug, Error)]
pub enum PluginError {
    /// Failed to load a plugin archive.
    #[error("Failed to load plugin: {0}")]
    LoadError(String),

    /// Invalid plugin manifest.
    #[error("Invalid manifest: {0}")]
    InvalidManifest(String),

    /// Serialization error.
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl PluginError {
    /// Creates a load error.
    pub fn load(message: impl Into<String>) -> Self {
        Self::LoadError(message.into())
    }

    /// Creates an invalid manifest error.
    pub fn invalid_manifest(message: impl Into<String>) -> Self {
        Self::InvalidManifest(message.into())
    }
}
