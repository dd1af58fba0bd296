//! Run result types.

use std::fmt;

use kthold_plugin::Violation;
use serde::{Deserialize, Serialize};

use crate::AcceptedViolations;

/// Kind of pass to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RunMode {
    /// Report violations without touching the text.
    Lint,
    /// Report violations and rewrite the text to fix what can be fixed.
    Format,
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Lint => f.write_str("lint"),
            Self::Format => f.write_str("format"),
        }
    }
}

/// Classified violations of one run.
///
/// Every violation the engine reported lands in exactly one sequence, in
/// the order the engine reported it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunResult {
    /// Fixed by the engine during a format pass.
    pub corrected: Vec<Violation>,
    /// New violations not covered by the baseline.
    pub reported: Vec<Violation>,
    /// Violations accepted by the baseline.
    pub suppressed: Vec<Violation>,
}

impl RunResult {
    /// A result with nothing in it.
    pub fn empty() -> Self {
        Self::default()
    }

    /// Returns true if all three sequences are empty.
    pub fn is_empty(&self) -> bool {
        self.corrected.is_empty() && self.reported.is_empty() && self.suppressed.is_empty()
    }

    /// Total number of violations.
    pub fn len(&self) -> usize {
        self.corrected.len() + self.reported.len() + self.suppressed.len()
    }

    /// Returns true if there is anything the user still has to look at.
    pub fn has_reported(&self) -> bool {
        !self.reported.is_empty()
    }

    /// Iterates over every violation: corrected, then reported, then
    /// suppressed.
    pub fn violations(&self) -> impl Iterator<Item = &Violation> {
        self.corrected
            .iter()
            .chain(&self.reported)
            .chain(&self.suppressed)
    }
}

/// Accumulates engine callbacks into a [`RunResult`].
#[derive(Debug)]
pub(crate) struct ResultBuilder<'a> {
    accepted: AcceptedViolations<'a>,
    result: RunResult,
}

impl<'a> ResultBuilder<'a> {
    pub(crate) fn new(accepted: AcceptedViolations<'a>) -> Self {
        Self {
            accepted,
            result: RunResult::empty(),
        }
    }

    /// Files one violation. Corrections win over baseline matches.
    pub(crate) fn push(&mut self, violation: Violation, corrected: bool) {
        if corrected {
            self.result.corrected.push(violation);
        } else if self.accepted.contains(&violation) {
            self.result.suppressed.push(violation);
        } else {
            self.result.reported.push(violation);
        }
    }

    pub(crate) fn finish(self) -> RunResult {
        self.result
    }
}
