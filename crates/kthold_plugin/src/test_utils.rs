//! In-memory engine for tests.

use std::collections::BTreeMap;
use std::sync::Arc;

use parking_lot::Mutex;

use crate::engine::{Engine, EngineError, EngineParams, ViolationSink};
use crate::{RuleProvider, RuleSet, Violation};

/// What the engine saw on its last invocation.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RecordedCall {
    pub file_name: String,
    pub text: String,
    pub provider_ids: Vec<String>,
    pub user_data: BTreeMap<String, String>,
    pub script: bool,
    pub editor_config_path: Option<std::path::PathBuf>,
    pub format: bool,
}

/// Engine that replays a fixed script of violations.
#[derive(Debug, Default)]
pub struct ScriptedEngine {
    builtins: Vec<RuleSet>,
    violations: Vec<(Violation, bool)>,
    formatted: Option<String>,
    parse_error: bool,
    calls: Mutex<Vec<RecordedCall>>,
    invalidations: Mutex<usize>,
}

impl ScriptedEngine {
    /// Creates an engine with no built-ins that reports nothing.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a built-in provider.
    pub fn with_builtin(mut self, provider: RuleSet) -> Self {
        self.builtins.push(provider);
        self
    }

    /// Reports `violation` as found but not fixed.
    pub fn reporting(mut self, violation: Violation) -> Self {
        self.violations.push((violation, false));
        self
    }

    /// Reports `violation` as fixed by a format pass.
    pub fn correcting(mut self, violation: Violation) -> Self {
        self.violations.push((violation, true));
        self
    }

    /// Text returned from format passes. Defaults to the input text.
    pub fn formatting_to(mut self, text: impl Into<String>) -> Self {
        self.formatted = Some(text.into());
        self
    }

    /// Fails every pass with a parse error after reporting the scripted
    /// violations.
    pub fn failing_to_parse(mut self) -> Self {
        self.parse_error = true;
        self
    }

    /// Returns every recorded invocation.
    pub fn calls(&self) -> Vec<RecordedCall> {
        self.calls.lock().clone()
    }

    /// Returns how many times caches were invalidated.
    pub fn invalidations(&self) -> usize {
        *self.invalidations.lock()
    }

    fn replay(
        &self,
        format: bool,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<(), EngineError> {
        self.calls.lock().push(RecordedCall {
            file_name: params.file_name.to_string(),
            text: params.text.to_string(),
            provider_ids: params.providers.iter().map(|p| p.id().to_string()).collect(),
            user_data: params.user_data.clone(),
            script: params.script,
            editor_config_path: params.editor_config_path.map(|p| p.to_path_buf()),
            format,
        });

        for (violation, corrected) in &self.violations {
            sink(violation.clone(), format && *corrected);
        }

        if self.parse_error {
            return Err(EngineError::parse(1, 1, "Expecting an element"));
        }
        Ok(())
    }
}

impl Engine for ScriptedEngine {
    fn builtin_providers(&self) -> Vec<Arc<dyn RuleProvider>> {
        self.builtins
            .iter()
            .cloned()
            .map(|p| Arc::new(p) as Arc<dyn RuleProvider>)
            .collect()
    }

    fn lint(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<(), EngineError> {
        self.replay(false, params, sink)
    }

    fn format(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<String, EngineError> {
        self.replay(true, params, sink)?;
        Ok(self
            .formatted
            .clone()
            .unwrap_or_else(|| params.text.to_string()))
    }

    fn invalidate_caches(&self) {
        *self.invalidations.lock() += 1;
    }
}
