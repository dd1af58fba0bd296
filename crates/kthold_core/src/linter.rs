//! Lint and format orchestration.

use std::sync::Arc;

use kthold_plugin::{Engine, RuleProvider, Violation};
use tracing::{debug, warn};

use crate::document::{Document, Transaction};
use crate::params::{RunParams, SourceFile};
use crate::registry::{self, RuleSetRegistry};
use crate::result::{ResultBuilder, RunMode, RunResult};
use crate::{BaselineIndex, LinterError, RunConfig};

/// What one engine pass produced.
struct Outcome {
    result: RunResult,
    formatted: Option<String>,
}

impl Outcome {
    fn empty() -> Self {
        Self {
            result: RunResult::empty(),
            formatted: None,
        }
    }
}

/// Drives one lint or format pass per call.
///
/// The linter keeps no state between calls apart from the engine and the
/// shared plugin archive cache. Runs for different files may happen in
/// parallel; format runs for the same file must be serialized by the
/// caller.
#[derive(Debug)]
pub struct Linter<E: Engine> {
    engine: E,
    registry: RuleSetRegistry,
}

impl<E: Engine> Linter<E> {
    /// Creates a linter using the engine's built-in providers and the
    /// process-wide plugin archive cache.
    pub fn new(engine: E) -> Self {
        let registry = RuleSetRegistry::new(engine.builtin_providers());
        Self { engine, registry }
    }

    /// Creates a linter with a custom registry.
    pub fn with_registry(engine: E, registry: RuleSetRegistry) -> Self {
        Self { engine, registry }
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn registry(&self) -> &RuleSetRegistry {
        &self.registry
    }

    /// Forgets loaded plugin archives so the next run re-reads them.
    ///
    /// Call this after plugin configuration changes.
    pub fn invalidate_plugin_cache(&self) {
        self.registry.invalidate();
    }

    /// Providers a run with `config` would use, in order.
    pub fn providers(&self, config: &RunConfig) -> Vec<Arc<dyn RuleProvider>> {
        self.registry
            .discover(&config.plugin_paths, config.use_experimental)
    }

    /// Every namespaced rule id available under `config`.
    pub fn all_rule_ids(&self, config: &RunConfig) -> Vec<String> {
        registry::all_rule_ids(&self.providers(config))
    }

    /// Lints `text` without modifying anything.
    pub fn lint(
        &self,
        file: &SourceFile,
        text: &str,
        config: &RunConfig,
    ) -> Result<RunResult, LinterError> {
        self.execute(file, text, config, RunMode::Lint)
            .map(|outcome| outcome.result)
    }

    /// Lints and corrects `document`, committing the corrected text in a
    /// single transaction.
    pub fn format<D: Document + ?Sized>(
        &self,
        file: &SourceFile,
        document: &mut D,
        config: &RunConfig,
    ) -> Result<RunResult, LinterError> {
        self.run(file, document, config, RunMode::Format)
    }

    /// Runs a pass in the given mode.
    ///
    /// A parse failure yields an empty result and leaves the document
    /// untouched. Other engine failures and failed commits are returned as
    /// errors.
    pub fn run<D: Document + ?Sized>(
        &self,
        file: &SourceFile,
        document: &mut D,
        config: &RunConfig,
        mode: RunMode,
    ) -> Result<RunResult, LinterError> {
        let outcome = self.execute(file, document.text(), config, mode)?;

        if let Some(text) = outcome.formatted {
            let mut transaction = Transaction::begin(document);
            transaction.replace_text(text);
            transaction.commit()?;
        }

        Ok(outcome.result)
    }

    fn execute(
        &self,
        file: &SourceFile,
        text: &str,
        config: &RunConfig,
        mode: RunMode,
    ) -> Result<Outcome, LinterError> {
        if file.is_ephemeral() {
            debug!("Skipping preview buffer {}", file.resolved_name());
            return Ok(Outcome::empty());
        }

        let params = RunParams::build(file, text, config);
        let providers = self.providers(config);
        let baseline = BaselineIndex::load(config.baseline_path.as_deref());
        let accepted = baseline.lookup(&params.project_relative_path);

        debug!(
            "Running {} on {} with {} provider(s) and {} accepted violation(s)",
            mode,
            params.file_name,
            providers.len(),
            accepted.len()
        );

        // .editorconfig files may have changed since the previous run
        self.engine.invalidate_caches();

        let engine_params = params.engine_params(&providers);
        let mut builder = ResultBuilder::new(accepted);
        // Only a format pass can fix anything.
        let fixes = mode == RunMode::Format;
        let mut sink =
            |violation: Violation, corrected: bool| builder.push(violation, fixes && corrected);

        let formatted = match mode {
            RunMode::Lint => self.engine.lint(&engine_params, &mut sink).map(|()| None),
            RunMode::Format => self.engine.format(&engine_params, &mut sink).map(Some),
        };

        let formatted = match formatted {
            Ok(formatted) => formatted,
            Err(e) if e.is_parse() => {
                warn!("Not a valid Kotlin file {}: {}", params.file_name, e);
                return Ok(Outcome::empty());
            }
            Err(e) => return Err(e.into()),
        };

        Ok(Outcome {
            result: builder.finish(),
            formatted,
        })
    }
}
