//! Lint command implementation

use std::fs;
use std::path::PathBuf;

use kthold_core::{LinterError, RunMode};
use miette::Result;

use super::{Session, report_failures, resolve_files};
use crate::cli::{Cli, ConfigOverrides, OutputFormat};
use crate::output::{FileReport, output_results};

pub fn run_lint(
    cli: &Cli,
    files: &[PathBuf],
    format: OutputFormat,
    overrides: &ConfigOverrides,
) -> Result<bool> {
    let files = resolve_files(files)?;
    let session = Session::load(cli, overrides)?;

    let (reports, failures) = session.for_each_file(&files, |path, file| {
        let text = fs::read_to_string(path).map_err(LinterError::Io)?;
        let result = session.linter.lint(&file, &text, &session.config)?;
        Ok(FileReport {
            path: path.to_path_buf(),
            result,
        })
    });

    report_failures(&failures, "lint");
    let has_reported = output_results(&reports, format, RunMode::Lint)?;
    Ok(has_reported || !failures.is_empty())
}
