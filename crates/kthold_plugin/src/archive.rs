//! Plugin archive loading.
//!
//! A plugin archive is either a JSON manifest file or a directory holding a
//! `kthold-plugin.json` manifest. One archive may contribute several
//! providers. Loaded archives are memoized in an [`ArchiveCache`] until the
//! owner calls [`ArchiveCache::invalidate`].

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, OnceLock};

use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::{PluginError, RuleProvider, RuleSet};

/// Manifest file name looked up inside directory archives.
pub const PLUGIN_MANIFEST_FILE: &str = "kthold-plugin.json";

/// Upper bound on manifest size; archives are metadata only.
const MAX_MANIFEST_SIZE: u64 = 1024 * 1024;

/// A provider declared by a plugin manifest.
pub type ProviderDefinition = RuleSet;

/// The structure of `kthold-plugin.json`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PluginManifest {
    /// Providers exported by the archive, in declaration order.
    pub providers: Vec<ProviderDefinition>,
}

impl PluginManifest {
    /// Parses and validates a manifest.
    pub fn from_json(json: &str) -> Result<Self, PluginError> {
        let manifest: Self = serde_json::from_str(json)?;
        manifest.validate()?;
        Ok(manifest)
    }

    /// Reads a manifest from an archive location.
    pub fn from_archive(path: &Path) -> Result<Self, PluginError> {
        let manifest_path = if path.is_dir() {
            path.join(PLUGIN_MANIFEST_FILE)
        } else {
            path.to_path_buf()
        };

        let metadata = fs::metadata(&manifest_path)?;
        if !metadata.is_file() {
            return Err(PluginError::load(format!(
                "Not a regular file: {}",
                manifest_path.display()
            )));
        }
        if metadata.len() > MAX_MANIFEST_SIZE {
            return Err(PluginError::load(format!(
                "Manifest exceeds limit of {} bytes: {}",
                MAX_MANIFEST_SIZE,
                manifest_path.display()
            )));
        }

        let content = fs::read_to_string(&manifest_path)?;
        Self::from_json(&content)
    }

    fn validate(&self) -> Result<(), PluginError> {
        for provider in &self.providers {
            if provider.id.trim().is_empty() {
                return Err(PluginError::invalid_manifest("provider id must not be empty"));
            }
            if provider.id.contains(':') {
                return Err(PluginError::invalid_manifest(format!(
                    "provider id '{}' must not contain ':'",
                    provider.id
                )));
            }
            if let Some(rule) = provider
                .rules
                .iter()
                .find(|r| r.is_empty() || r.contains(':'))
            {
                return Err(PluginError::invalid_manifest(format!(
                    "invalid rule id '{}' in provider '{}'",
                    rule, provider.id
                )));
            }
        }
        Ok(())
    }
}

type LoadedArchive = Arc<[Arc<dyn RuleProvider>]>;

/// Memoizes loaded plugin archives by location.
///
/// Discovery always goes through the cache; a caller that changes plugin
/// configuration must call [`invalidate`](Self::invalidate) so the next
/// discovery re-reads the archives.
#[derive(Default)]
pub struct ArchiveCache {
    entries: Mutex<HashMap<PathBuf, LoadedArchive>>,
}

impl ArchiveCache {
    /// Creates an empty cache.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the process-wide cache.
    pub fn global() -> Arc<ArchiveCache> {
        static GLOBAL: OnceLock<Arc<ArchiveCache>> = OnceLock::new();
        Arc::clone(GLOBAL.get_or_init(|| Arc::new(ArchiveCache::new())))
    }

    /// Loads the providers of an archive.
    ///
    /// Loading is best-effort: a missing or malformed archive is logged and
    /// contributes no providers. Failures are not cached.
    pub fn load(&self, path: impl AsRef<Path>) -> Vec<Arc<dyn RuleProvider>> {
        let path = path.as_ref();
        let key = fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());

        if let Some(loaded) = self.entries.lock().get(&key) {
            return loaded.to_vec();
        }

        match PluginManifest::from_archive(&key) {
            Ok(manifest) => {
                debug!(
                    "Loaded {} provider(s) from plugin archive {}",
                    manifest.providers.len(),
                    key.display()
                );
                let providers: LoadedArchive = manifest
                    .providers
                    .into_iter()
                    .map(|p| Arc::new(p) as Arc<dyn RuleProvider>)
                    .collect();
                self.entries.lock().insert(key, Arc::clone(&providers));
                providers.to_vec()
            }
            Err(e) => {
                warn!("Failed to load plugin archive '{}': {}", key.display(), e);
                Vec::new()
            }
        }
    }

    /// Drops every cached archive.
    pub fn invalidate(&self) {
        let mut entries = self.entries.lock();
        if !entries.is_empty() {
            debug!("Invalidating {} cached plugin archive(s)", entries.len());
        }
        entries.clear();
    }

    /// Returns the number of cached archives.
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Returns whether the cache holds no archives.
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }
}

impl std::fmt::Debug for ArchiveCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ArchiveCache")
            .field("archives", &self.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    const CUSTOM: &str = r#"{ "providers": [ { "id": "custom", "rules": ["bar", "baz"] } ] }"#;

    #[test]
    fn test_manifest_from_json() {
        let manifest = PluginManifest::from_json(CUSTOM).unwrap();
        assert_eq!(manifest.providers, vec![RuleSet::new("custom", ["bar", "baz"])]);
    }

    #[rstest]
    #[case::empty_id(r#"{ "providers": [ { "id": " ", "rules": [] } ] }"#)]
    #[case::namespaced_id(r#"{ "providers": [ { "id": "a:b", "rules": [] } ] }"#)]
    #[case::namespaced_rule(r#"{ "providers": [ { "id": "a", "rules": ["x:y"] } ] }"#)]
    #[case::empty_rule(r#"{ "providers": [ { "id": "a", "rules": [""] } ] }"#)]
    fn test_manifest_validation_errors(#[case] json: &str) {
        let err = PluginManifest::from_json(json).unwrap_err();
        assert!(matches!(err, PluginError::InvalidManifest(_)), "{err}");
    }

    #[test]
    fn test_manifest_syntax_error() {
        let err = PluginManifest::from_json("{ not json").unwrap_err();
        assert!(matches!(err, PluginError::Serialization(_)));
    }

    #[test]
    fn test_load_file_archive() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, CUSTOM).unwrap();

        let cache = ArchiveCache::new();
        let providers = cache.load(&path);

        assert_eq!(providers.len(), 1);
        assert_eq!(providers[0].id(), "custom");
        assert_eq!(providers[0].rules(), ["bar", "baz"]);
        assert_eq!(cache.len(), 1);
    }

    #[test]
    fn test_load_directory_archive() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join(PLUGIN_MANIFEST_FILE), CUSTOM).unwrap();

        let providers = ArchiveCache::new().load(dir.path());
        assert_eq!(providers.len(), 1);
    }

    #[test]
    fn test_load_is_memoized_until_invalidated() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("custom.json");
        fs::write(&path, CUSTOM).unwrap();

        let cache = ArchiveCache::new();
        assert_eq!(cache.load(&path)[0].rules().len(), 2);

        fs::write(&path, r#"{ "providers": [ { "id": "custom", "rules": ["bar"] } ] }"#).unwrap();
        assert_eq!(cache.load(&path)[0].rules().len(), 2);

        cache.invalidate();
        assert!(cache.is_empty());
        assert_eq!(cache.load(&path)[0].rules().len(), 1);
    }

    #[test]
    fn test_load_corrupt_archive_yields_nothing() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("broken.json");
        fs::write(&path, "garbage").unwrap();

        let cache = ArchiveCache::new();
        assert!(cache.load(&path).is_empty());
        assert!(cache.is_empty());
    }

    #[test]
    fn test_global_is_shared() {
        assert!(Arc::ptr_eq(&ArchiveCache::global(), &ArchiveCache::global()));
    }

    #[test]
    fn test_load_missing_archive_yields_nothing() {
        let dir = tempdir().unwrap();
        assert!(ArchiveCache::new().load(dir.path().join("missing.json")).is_empty());
    }
}
