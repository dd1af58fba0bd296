//! Baseline command implementation

use std::fs;
use std::path::{Path, PathBuf};

use kthold_core::{Baseline, LinterError};
use miette::{IntoDiagnostic, Result};

use super::{Session, report_failures, resolve_files};
use crate::cli::{Cli, ConfigOverrides};

/// Lints `files` and records every violation that is not fixed as accepted.
///
/// Violations already in the configured baseline are kept, so regenerating
/// the baseline never drops accepted entries for files that still have
/// them.
pub fn run_baseline(
    cli: &Cli,
    files: &[PathBuf],
    output: &Path,
    overrides: &ConfigOverrides,
) -> Result<bool> {
    let files = resolve_files(files)?;
    let session = Session::load(cli, overrides)?;

    let (entries, failures) = session.for_each_file(&files, |path, file| {
        let text = fs::read_to_string(path).map_err(LinterError::Io)?;
        let result = session.linter.lint(&file, &text, &session.config)?;
        Ok((file.project_relative_path(), result))
    });

    report_failures(&failures, "lint");
    if !failures.is_empty() {
        return Err(miette::miette!(
            "Baseline not written: {} file(s) could not be linted",
            failures.len()
        ));
    }

    let mut baseline = Baseline::new();
    for (path, result) in &entries {
        baseline.add(path.as_str(), result.reported.iter().chain(&result.suppressed));
    }
    baseline.save(output).into_diagnostic()?;

    println!(
        "Recorded {} violation(s) from {} file(s) in {}",
        baseline.len(),
        entries.len(),
        output.display()
    );
    Ok(false)
}
