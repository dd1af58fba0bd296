//! # kthold_plugin
//!
//! Rule providers and the analysis engine contract for kthold.
//!
//! This crate provides:
//! - The `Violation` record produced by the analysis engine
//! - The `RuleProvider` trait and plugin archive loading
//! - A process-wide, invalidable archive cache
//! - The `Engine` trait and a subprocess-backed `ProcessEngine`
//!
//! ## Architecture
//!
//! kthold never parses Kotlin or checks rules itself. The engine is an
//! external collaborator reached through the [`Engine`] trait. The bundled
//! [`ProcessEngine`] spawns a configured command per request and exchanges
//! JSON over stdio.
//!
//! ## Features
//!
//! - `test-utils`: Enable [`test_utils::ScriptedEngine`], an in-memory engine
//!   that replays canned responses.
//!
//! ## Example
//!
//! ```rust,ignore
//! use kthold_plugin::{ArchiveCache, ProcessEngine};
//!
//! let engine = ProcessEngine::new("ktlint-engine", Vec::<String>::new());
//! let providers = ArchiveCache::global().load("~/.kthold/plugins/custom.json");
//! ```

mod archive;
mod engine;
mod error;
mod executor_process;
mod provider;
mod violation;

#[cfg(feature = "test-utils")]
pub mod test_utils;

pub use archive::{ArchiveCache, PLUGIN_MANIFEST_FILE, PluginManifest, ProviderDefinition};
pub use engine::{Engine, EngineError, EngineParams, ViolationSink};
pub use error::PluginError;
pub use executor_process::{EDITORCONFIG_FILE, ProcessEngine};
pub use provider::{RuleProvider, RuleSet, STANDARD_PROVIDER_ID, namespaced_rule_ids};
pub use violation::{Violation, ViolationKey};
