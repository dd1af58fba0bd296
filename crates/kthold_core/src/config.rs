//! Linter configuration.

use std::collections::BTreeSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::OnceLock;

use jsonc_parser::ParseOptions;
use jsonschema::Validator;
use serde::{Deserialize, Serialize};

use crate::LinterError;

// Embed the schema
const SCHEMA_JSON: &str = include_str!("../../../schemas/v1/config.json");
static CONFIG_SCHEMA: OnceLock<Result<Validator, String>> = OnceLock::new();

/// Project configuration as stored in `.kthold.json` / `.kthold.jsonc`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LinterConfig {
    /// Lint using the Android Kotlin style guide.
    #[serde(default)]
    pub android: bool,

    /// Namespaced rule ids to disable.
    #[serde(default)]
    pub disabled_rules: Vec<String>,

    /// Plugin archive locations.
    #[serde(default)]
    pub plugins: Vec<String>,

    /// Whether the experimental provider is enabled.
    #[serde(default)]
    pub experimental: bool,

    /// Explicit `.editorconfig` location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub editor_config: Option<String>,

    /// Baseline file location.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub baseline: Option<String>,

    /// Engine command line.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<EngineCommand>,

    /// Directory containing the configuration file. Relative paths are
    /// resolved against it.
    #[serde(skip)]
    pub base_dir: Option<PathBuf>,
}

/// Command used to start the analysis engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineCommand {
    pub command: String,
    #[serde(default)]
    pub args: Vec<String>,
}

/// Immutable configuration for one lint or format run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RunConfig {
    /// Lint using the Android Kotlin style guide.
    pub android_mode: bool,
    /// Namespaced rule ids to disable. Empty means "not configured".
    pub disabled_rules: BTreeSet<String>,
    /// Plugin archive locations, possibly starting with `~`.
    pub plugin_paths: Vec<PathBuf>,
    /// Whether the experimental provider is enabled.
    pub use_experimental: bool,
    /// Explicit `.editorconfig` location.
    pub editor_config_path: Option<PathBuf>,
    /// Baseline file location.
    pub baseline_path: Option<PathBuf>,
}

impl LinterConfig {
    /// Configuration file names, in lookup order.
    pub const CONFIG_FILES: &'static [&'static str] = &[".kthold.jsonc", ".kthold.json"];

    /// Creates a new empty configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Finds the nearest configuration file, walking up from `start`.
    pub fn discover(start: impl AsRef<Path>) -> Option<PathBuf> {
        let start = start.as_ref();
        let start = fs::canonicalize(start).unwrap_or_else(|_| start.to_path_buf());

        start.ancestors().find_map(|dir| {
            Self::CONFIG_FILES
                .iter()
                .map(|name| dir.join(name))
                .find(|candidate| candidate.is_file())
        })
    }

    /// Loads configuration from a file.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LinterError> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)
            .map_err(|e| LinterError::config(format!("Failed to read config: {}", e)))?;

        let mut config = Self::from_json(&content)?;

        if let Some(parent) = path.parent() {
            config.base_dir = Some(parent.to_path_buf());
        }

        Ok(config)
    }

    /// Parses configuration from JSON (comments allowed) with schema
    /// validation.
    pub fn from_json(json: &str) -> Result<Self, LinterError> {
        let value = jsonc_parser::parse_to_serde_value(json, &ParseOptions::default())
            .map_err(|e| LinterError::config(format!("Invalid JSON: {}", e)))?
            .unwrap_or_else(|| serde_json::Value::Object(serde_json::Map::new()));

        let schema = CONFIG_SCHEMA
            .get_or_init(|| {
                let schema_json: serde_json::Value = serde_json::from_str(SCHEMA_JSON)
                    .map_err(|e| format!("Invalid embedded config schema: {}", e))?;
                Validator::new(&schema_json)
                    .map_err(|e| format!("Invalid config schema compilation: {}", e))
            })
            .as_ref()
            .map_err(|e| LinterError::config(e.clone()))?;

        if let Err(e) = schema.validate(&value) {
            let error_msg = format!("{} at {}", e, e.instance_path());
            return Err(LinterError::config(format!(
                "Config validation failed: {}",
                error_msg
            )));
        }

        serde_json::from_value(value)
            .map_err(|e| LinterError::config(format!("Invalid config: {}", e)))
    }

    /// Builds the configuration for a single run.
    ///
    /// Relative paths are resolved against [`base_dir`](Self::base_dir);
    /// paths starting with `~` are kept for the registry to expand.
    pub fn to_run_config(&self) -> RunConfig {
        RunConfig {
            android_mode: self.android,
            disabled_rules: self.disabled_rules.iter().cloned().collect(),
            plugin_paths: self.plugins.iter().map(|p| self.resolve(p)).collect(),
            use_experimental: self.experimental,
            editor_config_path: self.editor_config.as_deref().map(|p| self.resolve(p)),
            baseline_path: self.baseline.as_deref().map(|p| self.resolve(p)),
        }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        let path = Path::new(path);
        match &self.base_dir {
            Some(base) if path.is_relative() && !path.starts_with("~") => base.join(path),
            _ => path.to_path_buf(),
        }
    }
}
