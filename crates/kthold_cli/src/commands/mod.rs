//! Command implementations

pub mod baseline;
pub mod format;
pub mod lint;
pub mod rules;

use std::collections::HashSet;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use kthold_core::{Linter, LinterConfig, LinterError, RunConfig, SourceFile};
use kthold_plugin::ProcessEngine;
use miette::{IntoDiagnostic, Result};
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::cli::{Cli, ConfigOverrides};

/// Engine command used when neither the configuration nor the command line
/// names one.
pub const DEFAULT_ENGINE_COMMAND: &str = "kthold-engine";

/// Everything a command needs to run the linter.
pub struct Session {
    pub linter: Linter<ProcessEngine>,
    pub config: RunConfig,
    pub project_root: PathBuf,
}

impl Session {
    /// Loads configuration, applies overrides and starts the engine.
    pub fn load(cli: &Cli, overrides: &ConfigOverrides) -> Result<Self> {
        let file_config = load_config(cli)?;
        let config = apply_overrides(file_config.to_run_config(), overrides);
        let (command, args) = engine_command(&file_config, overrides);
        let project_root = project_root(cli, &file_config)?;

        debug!(
            "Using engine {} {:?}, project root {}",
            command,
            args,
            project_root.display()
        );

        Ok(Self {
            linter: Linter::new(ProcessEngine::new(command, args)),
            config,
            project_root,
        })
    }

    /// Describes `path` for the linter.
    pub fn source_file(&self, path: &Path) -> SourceFile {
        SourceFile::from_path(path).with_project_root(&self.project_root)
    }

    /// Runs `f` on every file in parallel, splitting successes from
    /// failures.
    pub fn for_each_file<T, F>(
        &self,
        files: &[PathBuf],
        f: F,
    ) -> (Vec<T>, Vec<(PathBuf, LinterError)>)
    where
        T: Send,
        F: Fn(&Path, SourceFile) -> Result<T, LinterError> + Sync,
    {
        let results: Vec<Result<T, (PathBuf, LinterError)>> = files
            .par_iter()
            .map(|path| f(path, self.source_file(path)).map_err(|e| (path.clone(), e)))
            .collect();

        let mut successes = Vec::new();
        let mut failures = Vec::new();
        for result in results {
            match result {
                Ok(value) => successes.push(value),
                Err((path, error)) => {
                    warn!("Failed to process {}: {}", path.display(), error);
                    failures.push((path, error));
                }
            }
        }
        (successes, failures)
    }
}

fn load_config(cli: &Cli) -> Result<LinterConfig> {
    if let Some(ref path) = cli.config {
        return LinterConfig::from_file(path).into_diagnostic();
    }

    let cwd = env::current_dir().into_diagnostic()?;
    match LinterConfig::discover(&cwd) {
        Some(path) => {
            info!("Using config {}", path.display());
            LinterConfig::from_file(&path).into_diagnostic()
        }
        None => {
            debug!("No configuration file found, using defaults");
            Ok(LinterConfig::new())
        }
    }
}

/// Applies command-line overrides on top of the file configuration.
pub fn apply_overrides(mut config: RunConfig, overrides: &ConfigOverrides) -> RunConfig {
    config.android_mode |= overrides.android;
    config.use_experimental |= overrides.experimental;
    config.disabled_rules.extend(
        overrides
            .disabled_rules
            .iter()
            .map(|rule| rule.trim().to_string())
            .filter(|rule| !rule.is_empty()),
    );
    config.plugin_paths.extend(overrides.plugins.iter().cloned());
    if let Some(ref baseline) = overrides.baseline {
        config.baseline_path = Some(baseline.clone());
    }
    if let Some(ref editorconfig) = overrides.editorconfig {
        config.editor_config_path = Some(editorconfig.clone());
    }
    config
}

fn engine_command(config: &LinterConfig, overrides: &ConfigOverrides) -> (String, Vec<String>) {
    match (&overrides.engine, &config.engine) {
        (Some(command), _) => (command.clone(), overrides.engine_args.clone()),
        (None, Some(engine)) if overrides.engine_args.is_empty() => {
            (engine.command.clone(), engine.args.clone())
        }
        (None, Some(engine)) => (engine.command.clone(), overrides.engine_args.clone()),
        (None, None) => (
            DEFAULT_ENGINE_COMMAND.to_string(),
            overrides.engine_args.clone(),
        ),
    }
}

fn project_root(cli: &Cli, config: &LinterConfig) -> Result<PathBuf> {
    let root = match (&cli.project_root, &config.base_dir) {
        (Some(root), _) => root.clone(),
        (None, Some(base)) => base.clone(),
        (None, None) => env::current_dir().into_diagnostic()?,
    };
    Ok(fs::canonicalize(&root).unwrap_or(root))
}

/// Resolves the requested files to canonical paths, dropping duplicates so
/// no file is processed by two workers.
pub fn resolve_files(files: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut seen = HashSet::new();
    let mut resolved = Vec::with_capacity(files.len());

    for file in files {
        let path = fs::canonicalize(file)
            .map_err(|e| miette::miette!("Cannot read {}: {}", file.display(), e))?;
        if seen.insert(path.clone()) {
            resolved.push(path);
        } else {
            debug!("Skipping duplicate {}", file.display());
        }
    }
    Ok(resolved)
}

/// Prints files that could not be processed.
pub fn report_failures(failures: &[(PathBuf, LinterError)], action: &str) {
    if failures.is_empty() {
        return;
    }
    eprintln!("\n{} file(s) failed to {}:", failures.len(), action);
    for (path, error) in failures {
        eprintln!("  {}: {}", path.display(), error);
    }
}
