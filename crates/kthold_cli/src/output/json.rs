//! JSON output formatter

use miette::{IntoDiagnostic, Result};

use super::FileReport;

pub fn output_json(reports: &[FileReport]) -> Result<()> {
    println!("{}", render(reports)?);
    Ok(())
}

fn render(reports: &[FileReport]) -> Result<String> {
    serde_json::to_string_pretty(reports).into_diagnostic()
}
