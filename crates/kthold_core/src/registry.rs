//! Rule provider discovery and ordering.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use kthold_plugin::{ArchiveCache, RuleProvider, STANDARD_PROVIDER_ID, namespaced_rule_ids};
use tracing::debug;

/// Id of the provider that is only used when experimental rules are enabled.
pub const EXPERIMENTAL_PROVIDER_ID: &str = "experimental";

/// Prefix that sorts the standard provider before any printable id.
const STANDARD_SORT_PREFIX: char = '\u{0}';

/// Discovers rule providers from engine built-ins and plugin archives.
///
/// The registry holds no per-run state. Loaded archives live in a shared
/// [`ArchiveCache`] that callers invalidate when plugin configuration
/// changes.
#[derive(Debug, Clone)]
pub struct RuleSetRegistry {
    builtins: Vec<Arc<dyn RuleProvider>>,
    archives: Arc<ArchiveCache>,
}

impl RuleSetRegistry {
    /// Creates a registry backed by the process-wide archive cache.
    pub fn new(builtins: Vec<Arc<dyn RuleProvider>>) -> Self {
        Self::with_archive_cache(builtins, ArchiveCache::global())
    }

    /// Creates a registry backed by a specific archive cache.
    pub fn with_archive_cache(
        builtins: Vec<Arc<dyn RuleProvider>>,
        archives: Arc<ArchiveCache>,
    ) -> Self {
        Self { builtins, archives }
    }

    /// Returns the ordered, deduplicated providers for one run.
    ///
    /// Built-ins are visited first, then each existing plugin archive in
    /// order. When two providers share an id the later one wins. The
    /// `experimental` provider is dropped unless `include_experimental` is
    /// set, and `standard` always comes first.
    pub fn discover(
        &self,
        plugin_paths: &[PathBuf],
        include_experimental: bool,
    ) -> Vec<Arc<dyn RuleProvider>> {
        let archives: Vec<PathBuf> = plugin_paths
            .iter()
            .map(|path| expand_home(path))
            .filter(|path| {
                let exists = path.exists();
                if !exists {
                    debug!("Skipping missing plugin archive {}", path.display());
                }
                exists
            })
            .collect();

        let discovered = self
            .builtins
            .iter()
            .cloned()
            .chain(archives.iter().flat_map(|path| self.archives.load(path)));

        let mut by_key: BTreeMap<String, Arc<dyn RuleProvider>> = BTreeMap::new();
        for provider in discovered {
            by_key.insert(sort_key(provider.id()), provider);
        }

        by_key
            .into_values()
            .filter(|provider| include_experimental || provider.id() != EXPERIMENTAL_PROVIDER_ID)
            .collect()
    }

    /// Drops every cached plugin archive.
    pub fn invalidate(&self) {
        self.archives.invalidate();
    }

    /// Returns the archive cache backing this registry.
    pub fn archive_cache(&self) -> &Arc<ArchiveCache> {
        &self.archives
    }
}

fn sort_key(id: &str) -> String {
    if id == STANDARD_PROVIDER_ID {
        format!("{}{}", STANDARD_SORT_PREFIX, id)
    } else {
        id.to_string()
    }
}

/// Expands a leading `~` component to the home directory.
///
/// `~user` forms and paths without a leading `~` are returned unchanged, as
/// is everything when no home directory is known.
pub fn expand_home(path: &Path) -> PathBuf {
    match (path.strip_prefix("~"), dirs::home_dir()) {
        (Ok(rest), Some(home)) if rest.as_os_str().is_empty() => home,
        (Ok(rest), Some(home)) => home.join(rest),
        _ => path.to_path_buf(),
    }
}

/// Flattens providers into the namespaced rule ids offered for disabling.
pub fn all_rule_ids(providers: &[Arc<dyn RuleProvider>]) -> Vec<String> {
    providers
        .iter()
        .flat_map(|provider| namespaced_rule_ids(provider.as_ref()))
        .collect()
}
