//! Text output formatter

use std::fmt::Write;

use kthold_core::{RunMode, Violation};

use super::FileReport;

pub fn output_text(reports: &[FileReport], mode: RunMode) {
    print!("{}", render(reports, mode));
}

fn render(reports: &[FileReport], mode: RunMode) -> String {
    let mut out = String::new();

    for report in reports {
        let result = &report.result;
        if result.reported.is_empty() && result.corrected.is_empty() {
            continue;
        }

        let _ = writeln!(out, "\n{}:", report.path.display());
        for violation in &result.corrected {
            write_violation(&mut out, violation, Some("fixed"));
        }
        for violation in &result.reported {
            let note = (mode == RunMode::Lint && violation.can_be_auto_corrected)
                .then_some("fixable");
            write_violation(&mut out, violation, note);
        }
    }

    let reported: usize = reports.iter().map(|r| r.result.reported.len()).sum();
    let suppressed: usize = reports.iter().map(|r| r.result.suppressed.len()).sum();
    let corrected: usize = reports.iter().map(|r| r.result.corrected.len()).sum();

    let _ = writeln!(out);
    let _ = write!(
        out,
        "Checked {} files, found {} new issues ({} in baseline",
        reports.len(),
        reported,
        suppressed
    );
    if mode == RunMode::Format {
        let _ = write!(out, ", {} fixed", corrected);
    }
    let _ = writeln!(out, ")");
    out
}

fn write_violation(out: &mut String, violation: &Violation, note: Option<&str>) {
    let _ = write!(
        out,
        "  {}:{} [{}] {}",
        violation.line, violation.column, violation.rule_id, violation.message
    );
    match note {
        Some(note) => {
            let _ = writeln!(out, " ({})", note);
        }
        None => {
            let _ = writeln!(out);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kthold_core::RunResult;
    use std::path::PathBuf;

    fn report() -> FileReport {
        FileReport {
            path: PathBuf::from("/project/Main.kt"),
            result: RunResult {
                corrected: vec![Violation::new(2, 1, "indent", "Unexpected indentation")],
                reported: vec![
                    Violation::new(1, 1, "no-wildcard-imports", "Wildcard import"),
                    Violation::new(3, 5, "custom:no-println", "Avoid println").correctable(),
                ],
                suppressed: vec![Violation::new(4, 1, "max-line-length", "Line too long")],
            },
        }
    }

    #[test]
    fn test_render_lint() {
        let out = render(&[report()], RunMode::Lint);

        assert!(out.contains("/project/Main.kt:"));
        assert!(out.contains("  1:1 [no-wildcard-imports] Wildcard import\n"));
        assert!(out.contains("  3:5 [custom:no-println] Avoid println (fixable)\n"));
        assert!(!out.contains("max-line-length"));
        assert!(out.ends_with("Checked 1 files, found 2 new issues (1 in baseline)\n"));
    }

    #[test]
    fn test_render_format() {
        let out = render(&[report()], RunMode::Format);

        assert!(out.contains("  2:1 [indent] Unexpected indentation (fixed)\n"));
        assert!(out.contains("  3:5 [custom:no-println] Avoid println\n"));
        assert!(out.ends_with("(1 in baseline, 1 fixed)\n"));
    }

    #[test]
    fn test_render_clean_file() {
        let clean = FileReport {
            path: PathBuf::from("/project/Clean.kt"),
            result: RunResult::empty(),
        };

        let out = render(&[clean], RunMode::Lint);
        assert!(!out.contains("Clean.kt"));
        assert!(out.contains("Checked 1 files, found 0 new issues"));
    }
}
