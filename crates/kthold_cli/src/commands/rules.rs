//! Rules command implementation

use miette::Result;

use super::Session;
use crate::cli::{Cli, ConfigOverrides};

/// Prints every rule id that can be passed to `--disable` or listed in
/// `disabledRules`.
pub fn run_rules(cli: &Cli, overrides: &ConfigOverrides) -> Result<bool> {
    let session = Session::load(cli, overrides)?;

    let ids = session.linter.all_rule_ids(&session.config);
    if ids.is_empty() {
        eprintln!("No rules available. Is the engine installed?");
    }
    for id in ids {
        println!("{}", id);
    }
    Ok(false)
}
