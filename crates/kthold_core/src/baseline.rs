//! Baseline of previously accepted violations.
//!
//! A baseline lets a project adopt kthold without fixing every existing
//! issue first: violations recorded in it are suppressed, anything new is
//! reported. Matching is exact on line, column, rule id and message, so a
//! violation that moves is reported again.

use std::collections::{BTreeMap, HashMap, HashSet};
use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use kthold_plugin::{Violation, ViolationKey};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::LinterError;

/// Current baseline format version.
pub const BASELINE_VERSION: &str = "1";

fn default_version() -> String {
    BASELINE_VERSION.to_string()
}

/// Persisted baseline: project-relative path to accepted violations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Baseline {
    /// Version of the baseline format.
    #[serde(default = "default_version")]
    pub version: String,
    /// Accepted violations per project-relative path.
    #[serde(default)]
    pub files: BTreeMap<String, Vec<ViolationKey>>,
}

impl Default for Baseline {
    fn default() -> Self {
        Self::new()
    }
}

impl Baseline {
    /// Creates an empty baseline.
    pub fn new() -> Self {
        Self {
            version: default_version(),
            files: BTreeMap::new(),
        }
    }

    /// Loads a baseline from a JSON file.
    pub fn load(path: &Path) -> Result<Self, LinterError> {
        let content = fs::read_to_string(path)?;
        let baseline: Self = serde_json::from_str(&content).map_err(|e| {
            LinterError::baseline(format!("Invalid baseline '{}': {}", path.display(), e))
        })?;

        if baseline.version != BASELINE_VERSION {
            return Err(LinterError::baseline(format!(
                "Unsupported baseline version '{}' in '{}'",
                baseline.version,
                path.display()
            )));
        }
        Ok(baseline)
    }

    /// Saves the baseline as pretty-printed JSON, creating parent
    /// directories as needed.
    pub fn save(&self, path: &Path) -> Result<(), LinterError> {
        let content = serde_json::to_string_pretty(self)
            .map_err(|e| LinterError::baseline(format!("Failed to serialize baseline: {}", e)))?;

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)?;
        }
        fs::write(path, content + "\n")?;
        Ok(())
    }

    /// Records violations for a project-relative path.
    ///
    /// Entries stay sorted and free of duplicates. Paths without violations
    /// are not recorded.
    pub fn add<'a, I>(&mut self, path: impl Into<String>, violations: I)
    where
        I: IntoIterator<Item = &'a Violation>,
    {
        let mut keys: Vec<ViolationKey> = violations.into_iter().map(ViolationKey::from).collect();
        if keys.is_empty() {
            return;
        }

        let entries = self.files.entry(path.into()).or_default();
        entries.append(&mut keys);
        entries.sort();
        entries.dedup();
    }

    /// Returns the number of recorded violations across all paths.
    pub fn len(&self) -> usize {
        self.files.values().map(Vec::len).sum()
    }

    /// Returns whether no violations are recorded.
    pub fn is_empty(&self) -> bool {
        self.files.values().all(Vec::is_empty)
    }
}

/// Lookup structure built from a [`Baseline`].
#[derive(Debug, Clone, Default)]
pub struct BaselineIndex {
    files: HashMap<String, HashSet<ViolationKey>>,
}

impl BaselineIndex {
    /// Creates an index that accepts nothing.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Loads the index for an optional baseline location.
    ///
    /// No path, a missing file and an unreadable or malformed file all
    /// yield an empty index; only the last two are logged.
    pub fn load(path: Option<&Path>) -> Self {
        let Some(path) = path else {
            return Self::empty();
        };

        match Baseline::load(path) {
            Ok(baseline) => {
                debug!(
                    "Loaded baseline {} with {} accepted violation(s)",
                    path.display(),
                    baseline.len()
                );
                Self::from(&baseline)
            }
            Err(LinterError::Io(e)) if e.kind() == ErrorKind::NotFound => {
                debug!("Baseline {} not found", path.display());
                Self::empty()
            }
            Err(e) => {
                warn!("Ignoring baseline {}: {}", path.display(), e);
                Self::empty()
            }
        }
    }

    /// Returns the violations accepted for a project-relative path.
    pub fn lookup(&self, project_relative_path: &str) -> AcceptedViolations<'_> {
        AcceptedViolations {
            keys: self.files.get(project_relative_path),
        }
    }

    /// Returns whether the index accepts nothing.
    pub fn is_empty(&self) -> bool {
        self.files.values().all(HashSet::is_empty)
    }
}

impl From<&Baseline> for BaselineIndex {
    fn from(baseline: &Baseline) -> Self {
        let files = baseline
            .files
            .iter()
            .map(|(path, keys)| (path.clone(), keys.iter().cloned().collect()))
            .collect();
        Self { files }
    }
}

/// Violations accepted for one path.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptedViolations<'a> {
    keys: Option<&'a HashSet<ViolationKey>>,
}

impl AcceptedViolations<'_> {
    /// Returns whether `violation` matches an accepted entry.
    pub fn contains(&self, violation: &Violation) -> bool {
        self.keys.is_some_and(|keys| keys.contains(&violation.key()))
    }

    /// Returns the number of accepted entries.
    pub fn len(&self) -> usize {
        self.keys.map_or(0, HashSet::len)
    }

    /// Returns whether no entries are accepted.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use tempfile::tempdir;

    fn wildcard(line: u32) -> Violation {
        Violation::new(line, 1, "no-wildcard-imports", "Wildcard import")
    }

    fn index_with(path: &str, violations: &[Violation]) -> BaselineIndex {
        let mut baseline = Baseline::new();
        baseline.add(path, violations);
        BaselineIndex::from(&baseline)
    }

    #[test]
    fn test_lookup_matches_exact_violation() {
        let index = index_with("src/Main.kt", &[wildcard(3)]);
        let accepted = index.lookup("src/Main.kt");

        assert_eq!(accepted.len(), 1);
        assert!(accepted.contains(&wildcard(3)));
    }

    #[rstest]
    #[case::moved_line(Violation::new(4, 1, "no-wildcard-imports", "Wildcard import"))]
    #[case::moved_column(Violation::new(3, 2, "no-wildcard-imports", "Wildcard import"))]
    #[case::other_rule(Violation::new(3, 1, "custom:no-wildcards", "Wildcard import"))]
    #[case::other_message(Violation::new(3, 1, "no-wildcard-imports", "Wildcard import of java.util"))]
    fn test_lookup_is_exact(#[case] candidate: Violation) {
        let index = index_with("src/Main.kt", &[wildcard(3)]);
        assert!(!index.lookup("src/Main.kt").contains(&candidate));
    }

    #[test]
    fn test_lookup_ignores_correctable_flag() {
        let index = index_with("src/Main.kt", &[wildcard(3)]);
        assert!(index.lookup("src/Main.kt").contains(&wildcard(3).correctable()));
    }

    #[test]
    fn test_lookup_unknown_path_is_empty() {
        let index = index_with("src/Main.kt", &[wildcard(3)]);
        let accepted = index.lookup("src/Other.kt");

        assert!(accepted.is_empty());
        assert!(!accepted.contains(&wildcard(3)));
    }

    #[test]
    fn test_load_without_path_is_empty() {
        assert!(BaselineIndex::load(None).is_empty());
    }

    #[test]
    fn test_load_missing_file_is_empty() {
        let dir = tempdir().unwrap();
        let index = BaselineIndex::load(Some(&dir.path().join("baseline.json")));
        assert!(index.is_empty());
    }

    #[rstest]
    #[case::not_json("<baseline/>")]
    #[case::wrong_shape(r#"{ "files": ["src/Main.kt"] }"#)]
    #[case::future_version(r#"{ "version": "2", "files": {} }"#)]
    fn test_load_malformed_file_is_empty(#[case] content: &str) {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        fs::write(&path, content).unwrap();

        assert!(BaselineIndex::load(Some(&path)).is_empty());
        assert!(Baseline::load(&path).is_err());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config").join("baseline.json");

        let mut baseline = Baseline::new();
        baseline.add("src/Main.kt", &[wildcard(7), wildcard(3), wildcard(7)]);
        baseline.save(&path).unwrap();

        let loaded = Baseline::load(&path).unwrap();
        assert_eq!(loaded, baseline);
        assert_eq!(loaded.files["src/Main.kt"].len(), 2);
        assert_eq!(loaded.files["src/Main.kt"][0].line, 3);
    }

    #[test]
    fn test_add_skips_clean_files() {
        let mut baseline = Baseline::new();
        baseline.add("src/Clean.kt", &Vec::<Violation>::new());

        assert!(baseline.files.is_empty());
        assert!(baseline.is_empty());
    }

    #[test]
    fn test_file_format() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("baseline.json");
        fs::write(
            &path,
            r#"{
                "version": "1",
                "files": {
                    "src/Main.kt": [
                        { "line": 3, "column": 1, "ruleId": "no-wildcard-imports", "message": "Wildcard import" }
                    ]
                }
            }"#,
        )
        .unwrap();

        let index = BaselineIndex::load(Some(&path));
        assert!(index.lookup("src/Main.kt").contains(&wildcard(3)));
    }
}
