//! Engine input assembly for a single file.

use std::collections::BTreeMap;
use std::path::{Component, Path, PathBuf};
use std::sync::Arc;

use kthold_plugin::{EngineParams, RuleProvider};

use crate::RunConfig;

/// Name given to preview buffers that have no backing file. Such files are
/// never analyzed.
pub const FRAGMENT_PATH: &str = "/fragment.kt";

/// Extension of Kotlin source files. Anything else is linted as a script.
pub const KOTLIN_EXTENSION: &str = ".kt";

/// User option carrying the Android mode flag.
pub const ANDROID_KEY: &str = "android";

/// User option carrying the comma-separated disabled rules.
pub const DISABLED_RULES_KEY: &str = "disabled_rules";

/// A file as known to the caller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    path: Option<PathBuf>,
    display_name: String,
    project_root: Option<PathBuf>,
}

impl SourceFile {
    /// A file backed by a real path.
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let display_name = path
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| path.to_string_lossy().into_owned());
        Self {
            path: Some(path),
            display_name,
            project_root: None,
        }
    }

    /// A buffer without a backing file, known only by its display name.
    pub fn virtual_file(display_name: impl Into<String>) -> Self {
        Self {
            path: None,
            display_name: display_name.into(),
            project_root: None,
        }
    }

    /// Sets the project root used to compute baseline keys.
    pub fn with_project_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.project_root = Some(root.into());
        self
    }

    /// The real path, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The project root, if known.
    pub fn project_root(&self) -> Option<&Path> {
        self.project_root.as_deref()
    }

    /// The best known name: the full path when there is one, otherwise the
    /// display name.
    pub fn resolved_name(&self) -> String {
        match &self.path {
            Some(path) => path.to_string_lossy().into_owned(),
            None => self.display_name.clone(),
        }
    }

    /// The baseline lookup key: the resolved name relative to the project
    /// root, or the resolved name itself when it is outside the root or no
    /// root is known. The root is matched by whole path components, so
    /// `/proj` is not a prefix of `/project/Main.kt`.
    pub fn project_relative_path(&self) -> String {
        project_relative_path(&self.resolved_name(), self.project_root())
    }

    /// Whether this is a preview buffer that must not be analyzed.
    pub fn is_ephemeral(&self) -> bool {
        self.resolved_name() == FRAGMENT_PATH
    }
}

/// Everything the engine needs for one file, minus the rule providers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RunParams {
    pub file_name: String,
    pub text: String,
    /// Baseline lookup key.
    pub project_relative_path: String,
    pub script: bool,
    pub user_data: BTreeMap<String, String>,
    pub editor_config_path: Option<PathBuf>,
}

impl RunParams {
    pub fn build(file: &SourceFile, text: impl Into<String>, config: &RunConfig) -> Self {
        let file_name = file.resolved_name();
        Self {
            project_relative_path: file.project_relative_path(),
            script: is_script(&file_name),
            user_data: user_data(config),
            editor_config_path: config.editor_config_path.clone(),
            text: text.into(),
            file_name,
        }
    }

    /// Borrows these parameters for an engine call.
    pub fn engine_params<'a>(&'a self, providers: &'a [Arc<dyn RuleProvider>]) -> EngineParams<'a> {
        EngineParams {
            file_name: &self.file_name,
            text: &self.text,
            providers,
            user_data: &self.user_data,
            script: self.script,
            editor_config_path: self.editor_config_path.as_deref(),
        }
    }
}

fn user_data(config: &RunConfig) -> BTreeMap<String, String> {
    let mut data = BTreeMap::new();
    data.insert(ANDROID_KEY.to_string(), config.android_mode.to_string());
    // An empty entry would override the disabled rules of .editorconfig
    if !config.disabled_rules.is_empty() {
        let joined = config
            .disabled_rules
            .iter()
            .map(String::as_str)
            .collect::<Vec<_>>()
            .join(",");
        data.insert(DISABLED_RULES_KEY.to_string(), joined);
    }
    data
}

fn is_script(file_name: &str) -> bool {
    let len = KOTLIN_EXTENSION.len();
    let is_kotlin = file_name.len() >= len
        && file_name
            .get(file_name.len() - len..)
            .is_some_and(|ext| ext.eq_ignore_ascii_case(KOTLIN_EXTENSION));
    !is_kotlin
}

fn project_relative_path(file_name: &str, project_root: Option<&Path>) -> String {
    let Some(root) = project_root else {
        return file_name.to_string();
    };

    match Path::new(file_name).strip_prefix(root) {
        Ok(relative) => relative
            .components()
            .filter_map(|component| match component {
                Component::Normal(part) => Some(part.to_string_lossy()),
                _ => None,
            })
            .collect::<Vec<_>>()
            .join("/"),
        Err(_) => file_name.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::BTreeSet;

    fn config(disabled: &[&str]) -> RunConfig {
        RunConfig {
            disabled_rules: disabled.iter().map(|s| s.to_string()).collect(),
            ..RunConfig::default()
        }
    }

    #[rstest]
    #[case("/project/src/Main.kt", false)]
    #[case("/project/src/Main.KT", false)]
    #[case("/project/build.gradle.kts", true)]
    #[case("/project/script.main.kts", true)]
    #[case("Scratch", true)]
    #[case("kt", true)]
    fn test_script_detection(#[case] name: &str, #[case] script: bool) {
        assert_eq!(is_script(name), script);
    }

    #[rstest]
    #[case(Some("/project"), "/project/src/Main.kt", "src/Main.kt")]
    #[case(Some("/project/"), "/project/src/Main.kt", "src/Main.kt")]
    #[case(Some("/other"), "/project/src/Main.kt", "/project/src/Main.kt")]
    #[case(Some("/proj"), "/project/src/Main.kt", "/project/src/Main.kt")]
    #[case(None, "/project/src/Main.kt", "/project/src/Main.kt")]
    fn test_project_relative_path(
        #[case] root: Option<&str>,
        #[case] file_name: &str,
        #[case] expected: &str,
    ) {
        assert_eq!(project_relative_path(file_name, root.map(Path::new)), expected);
    }

    #[test]
    fn test_user_data_without_disabled_rules() {
        let first = user_data(&config(&[]));
        let second = user_data(&config(&[]));

        assert_eq!(first, second);
        assert!(!first.contains_key(DISABLED_RULES_KEY));
        assert_eq!(first.get(ANDROID_KEY).map(String::as_str), Some("false"));
    }

    #[test]
    fn test_user_data_joins_disabled_rules() {
        let mut run = config(&["no-wildcard-imports", "custom:bar", "indent"]);
        run.android_mode = true;

        let data = user_data(&run);
        assert_eq!(data[ANDROID_KEY], "true");
        assert_eq!(data[DISABLED_RULES_KEY], "custom:bar,indent,no-wildcard-imports");
    }

    #[test]
    fn test_build_for_real_file() {
        let file = SourceFile::from_path("/project/app/Main.kt").with_project_root("/project");
        let run = RunConfig {
            editor_config_path: Some(PathBuf::from("/project/.editorconfig")),
            disabled_rules: BTreeSet::new(),
            ..RunConfig::default()
        };

        let params = RunParams::build(&file, "fun main() {}\n", &run);
        assert_eq!(params.file_name, "/project/app/Main.kt");
        assert_eq!(params.project_relative_path, "app/Main.kt");
        assert!(!params.script);
        assert_eq!(params.text, "fun main() {}\n");
        assert_eq!(
            params.editor_config_path.as_deref(),
            Some(Path::new("/project/.editorconfig"))
        );
    }

    #[test]
    fn test_build_for_virtual_file() {
        let file = SourceFile::virtual_file("Scratch.kts");
        let params = RunParams::build(&file, "println(1)", &RunConfig::default());

        assert_eq!(params.file_name, "Scratch.kts");
        assert_eq!(params.project_relative_path, "Scratch.kts");
        assert!(params.script);
    }

    #[rstest]
    #[case::virtual_fragment(SourceFile::virtual_file("/fragment.kt"), true)]
    #[case::real_fragment(SourceFile::from_path("/fragment.kt"), true)]
    #[case::nested_fragment(SourceFile::from_path("/project/fragment.kt"), false)]
    #[case::virtual_named_fragment(SourceFile::virtual_file("fragment.kt"), false)]
    fn test_is_ephemeral(#[case] file: SourceFile, #[case] ephemeral: bool) {
        assert_eq!(file.is_ephemeral(), ephemeral);
    }

    #[test]
    fn test_engine_params_borrow_run_params() {
        let file = SourceFile::from_path("/project/Main.kt");
        let params = RunParams::build(&file, "val x = 1", &config(&["indent"]));
        let providers: Vec<Arc<dyn RuleProvider>> = Vec::new();

        let engine = params.engine_params(&providers);
        assert_eq!(engine.file_name, "/project/Main.kt");
        assert_eq!(engine.text, "val x = 1");
        assert_eq!(engine.user_data[DISABLED_RULES_KEY], "indent");
        assert!(engine.providers.is_empty());
    }
}
