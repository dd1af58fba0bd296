//! Subprocess-backed engine.
//!
//! Every request spawns the configured command once, writes a single JSON
//! request to its stdin and reads a single JSON response from its stdout.

use std::collections::{BTreeMap, HashMap};
use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::engine::{Engine, EngineError, EngineParams, ViolationSink};
use crate::{RuleProvider, RuleSet, Violation};

/// Name of the file the engine reads formatting settings from.
pub const EDITORCONFIG_FILE: &str = ".editorconfig";

#[derive(Debug, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum Request<'a> {
    Describe,
    Lint(AnalysisRequest<'a>),
    Format(AnalysisRequest<'a>),
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalysisRequest<'a> {
    file_name: &'a str,
    text: &'a str,
    providers: Vec<RuleSet>,
    user_data: &'a BTreeMap<String, String>,
    script: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    editor_config_path: Option<&'a Path>,
}

#[derive(Debug, Deserialize)]
struct DescribeResponse {
    #[serde(default)]
    providers: Vec<RuleSet>,
}

#[derive(Debug, Deserialize)]
struct AnalysisResponse {
    #[serde(default)]
    violations: Vec<ReportedViolation>,
    #[serde(default)]
    formatted: Option<String>,
    #[serde(default)]
    error: Option<ErrorPayload>,
}

#[derive(Debug, Deserialize)]
struct ReportedViolation {
    #[serde(flatten)]
    violation: Violation,
    #[serde(default)]
    corrected: bool,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
enum ErrorPayload {
    Parse {
        #[serde(default)]
        line: u32,
        #[serde(default)]
        column: u32,
        message: String,
    },
    Internal {
        message: String,
    },
}

impl From<ErrorPayload> for EngineError {
    fn from(payload: ErrorPayload) -> Self {
        match payload {
            ErrorPayload::Parse {
                line,
                column,
                message,
            } => EngineError::parse(line, column, message),
            ErrorPayload::Internal { message } => EngineError::Internal(message),
        }
    }
}

/// Engine that runs an external command per request.
///
/// # Example
///
/// ```rust,ignore
/// use kthold_plugin::ProcessEngine;
///
/// let engine = ProcessEngine::new("ktlint-engine", ["--stdio"]);
/// let builtins = engine.builtin_providers();
/// ```
pub struct ProcessEngine {
    /// Program to spawn.
    command: OsString,
    /// Arguments passed on every spawn.
    args: Vec<OsString>,
    /// Built-in providers reported by the engine, once known.
    builtins: Mutex<Option<Vec<RuleSet>>>,
    /// Nearest `.editorconfig` per directory.
    editorconfig_cache: Mutex<HashMap<PathBuf, Option<PathBuf>>>,
}

impl ProcessEngine {
    /// Creates an engine for the given command line.
    pub fn new<I, S>(command: impl Into<OsString>, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        Self {
            command: command.into(),
            args: args.into_iter().map(Into::into).collect(),
            builtins: Mutex::new(None),
            editorconfig_cache: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the nearest `.editorconfig` for `file_name`, walking up from
    /// its directory.
    pub fn find_editorconfig(&self, file_name: &str) -> Option<PathBuf> {
        let dir = Path::new(file_name).parent()?;
        if dir.as_os_str().is_empty() {
            return None;
        }

        if let Some(cached) = self.editorconfig_cache.lock().get(dir) {
            return cached.clone();
        }

        let found = dir
            .ancestors()
            .map(|d| d.join(EDITORCONFIG_FILE))
            .find(|candidate| candidate.is_file());
        self.editorconfig_cache
            .lock()
            .insert(dir.to_path_buf(), found.clone());
        found
    }

    /// Number of directories with a cached `.editorconfig` lookup.
    pub fn cached_lookups(&self) -> usize {
        self.editorconfig_cache.lock().len()
    }

    fn analyze(
        &self,
        format: bool,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<Option<String>, EngineError> {
        let discovered;
        let editor_config_path = match params.editor_config_path {
            Some(path) => Some(path),
            None => {
                discovered = self.find_editorconfig(params.file_name);
                discovered.as_deref()
            }
        };

        let request = AnalysisRequest {
            file_name: params.file_name,
            text: params.text,
            providers: params
                .providers
                .iter()
                .map(|p| RuleSet::from_provider(p.as_ref()))
                .collect(),
            user_data: params.user_data,
            script: params.script,
            editor_config_path,
        };
        let request = if format {
            Request::Format(request)
        } else {
            Request::Lint(request)
        };

        let response: AnalysisResponse = self.call(&request)?;
        if let Some(error) = response.error {
            return Err(error.into());
        }

        for reported in response.violations {
            sink(reported.violation, format && reported.corrected);
        }

        if format {
            let formatted = response
                .formatted
                .ok_or_else(|| EngineError::protocol("format response has no 'formatted' text"))?;
            Ok(Some(formatted))
        } else {
            Ok(None)
        }
    }

    fn call<T: DeserializeOwned>(&self, request: &Request<'_>) -> Result<T, EngineError> {
        let payload = serde_json::to_vec(request)
            .map_err(|e| EngineError::protocol(format!("Failed to serialize request: {}", e)))?;

        debug!(
            "Spawning engine {:?} ({} byte request)",
            self.command,
            payload.len()
        );
        let mut child = Command::new(&self.command)
            .args(&self.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                EngineError::Unavailable(format!("Failed to spawn {:?}: {}", self.command, e))
            })?;

        let mut stdin = child
            .stdin
            .take()
            .ok_or_else(|| EngineError::Unavailable("engine stdin is not piped".to_string()))?;
        let writer = std::thread::spawn(move || -> std::io::Result<()> {
            stdin.write_all(&payload)?;
            stdin.flush()
        });

        let output = child.wait_with_output()?;
        match writer.join() {
            Ok(Ok(())) => {}
            Ok(Err(e)) if e.kind() == std::io::ErrorKind::BrokenPipe => {
                debug!("Engine closed stdin before reading the full request");
            }
            Ok(Err(e)) => return Err(e.into()),
            Err(_) => return Err(EngineError::Internal("stdin writer panicked".to_string())),
        }

        if !output.status.success() && output.stdout.is_empty() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(EngineError::Internal(format!(
                "engine exited with {}: {}",
                output.status,
                stderr.trim()
            )));
        }

        serde_json::from_slice(&output.stdout)
            .map_err(|e| EngineError::protocol(format!("Invalid engine response: {}", e)))
    }
}

impl std::fmt::Debug for ProcessEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProcessEngine")
            .field("command", &self.command)
            .field("args", &self.args)
            .finish()
    }
}

impl Engine for ProcessEngine {
    fn builtin_providers(&self) -> Vec<Arc<dyn RuleProvider>> {
        let mut builtins = self.builtins.lock();
        if builtins.is_none() {
            match self.call::<DescribeResponse>(&Request::Describe) {
                Ok(response) => *builtins = Some(response.providers),
                Err(e) => {
                    warn!("Failed to query built-in rule providers: {}", e);
                    return Vec::new();
                }
            }
        }

        builtins
            .iter()
            .flatten()
            .cloned()
            .map(|p| Arc::new(p) as Arc<dyn RuleProvider>)
            .collect()
    }

    fn lint(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<(), EngineError> {
        self.analyze(false, params, sink).map(|_| ())
    }

    fn format(
        &self,
        params: &EngineParams<'_>,
        sink: &mut ViolationSink<'_>,
    ) -> Result<String, EngineError> {
        self.analyze(true, params, sink)?
            .ok_or_else(|| EngineError::protocol("format produced no text"))
    }

    fn invalidate_caches(&self) {
        self.editorconfig_cache.lock().clear();
    }
}
