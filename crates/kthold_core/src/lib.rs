//! # kthold_core
//!
//! Lint and format orchestration for kthold.
//!
//! This crate provides:
//! - The main `Linter` orchestrator
//! - Rule set discovery and ordering
//! - Baseline loading and suppression
//! - Configuration loading
//! - Scoped, failure-atomic document writes
//!
//! ## Example
//!
//! ```rust,ignore
//! use kthold_core::{FileDocument, Linter, LinterConfig, SourceFile};
//! use kthold_plugin::ProcessEngine;
//!
//! let config = LinterConfig::from_file(".kthold.json")?.to_run_config();
//! let linter = Linter::new(ProcessEngine::new("ktlint-engine", Vec::<String>::new()));
//!
//! let mut document = FileDocument::open("src/main/kotlin/Main.kt")?;
//! let file = SourceFile::from_path(document.path()).with_project_root(".");
//! let result = linter.lint(&file, document.text(), &config)?;
//! println!("{} new issues", result.reported.len());
//! ```

mod baseline;
mod config;
mod document;
mod error;
mod linter;
mod params;
mod registry;
mod result;

pub use baseline::{AcceptedViolations, BASELINE_VERSION, Baseline, BaselineIndex};
pub use config::{EngineCommand, LinterConfig, RunConfig};
pub use document::{Document, DocumentError, FileDocument, MemoryDocument, Transaction};
pub use error::LinterError;
pub use linter::Linter;
pub use params::{
    ANDROID_KEY, DISABLED_RULES_KEY, FRAGMENT_PATH, KOTLIN_EXTENSION, RunParams, SourceFile,
};
pub use registry::{EXPERIMENTAL_PROVIDER_ID, RuleSetRegistry, all_rule_ids, expand_home};
pub use result::{RunMode, RunResult};

pub use kthold_plugin::{RuleProvider, RuleSet, Violation};
