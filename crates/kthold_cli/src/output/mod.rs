//! Output formatting module

mod json;
mod text;

use std::path::PathBuf;

use kthold_core::{RunMode, RunResult};
use miette::Result;
use serde::Serialize;

use crate::cli::OutputFormat;

/// Result of one file.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileReport {
    pub path: PathBuf,
    #[serde(flatten)]
    pub result: RunResult,
}

/// Prints results and returns whether any new violations were reported.
pub fn output_results(
    reports: &[FileReport],
    format: OutputFormat,
    mode: RunMode,
) -> Result<bool> {
    let has_reported = reports.iter().any(|r| r.result.has_reported());

    match format {
        OutputFormat::Json => json::output_json(reports)?,
        OutputFormat::Text => text::output_text(reports, mode),
    }

    Ok(has_reported)
}
