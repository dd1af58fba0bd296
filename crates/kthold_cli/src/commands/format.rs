//! Format command implementation

use std::path::PathBuf;

use kthold_core::{FileDocument, RunMode};
use miette::Result;
use tracing::info;

use super::{Session, report_failures, resolve_files};
use crate::cli::{Cli, ConfigOverrides, OutputFormat};
use crate::output::{FileReport, output_results};

pub fn run_format(
    cli: &Cli,
    files: &[PathBuf],
    format: OutputFormat,
    overrides: &ConfigOverrides,
) -> Result<bool> {
    // Deduplicated, so no file is written by two workers
    let files = resolve_files(files)?;
    let session = Session::load(cli, overrides)?;

    let (reports, failures) = session.for_each_file(&files, |path, file| {
        let mut document = FileDocument::open(path)?;
        let result = session.linter.format(&file, &mut document, &session.config)?;
        if !result.corrected.is_empty() {
            info!("Fixed {} issue(s) in {}", result.corrected.len(), path.display());
        }
        Ok(FileReport {
            path: path.to_path_buf(),
            result,
        })
    });

    report_failures(&failures, "format");
    let has_reported = output_results(&reports, format, RunMode::Format)?;
    Ok(has_reported || !failures.is_empty())
}
