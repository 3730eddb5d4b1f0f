//! Execution metrics
//!
//! Wall-clock and process-memory deltas around `apply`, plus a
//! deterministic complexity estimate. Every number here is a pure
//! function of its inputs or a direct OS measurement; nothing is sampled
//! randomly.

use serde::{Deserialize, Serialize};
use sysinfo::{Pid, System};

/// Metrics recorded for one transformation application
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionMetrics {
    /// Total lines covered by the produced changes
    pub lines_changed: u32,
    /// Complexity estimate of the original content
    pub complexity_before: u32,
    /// Complexity estimate of the proposed content
    pub complexity_after: u32,
    /// Wall-clock duration of the `apply` call
    pub execution_time_ms: u64,
    /// Process memory delta around the `apply` call (bytes; negative
    /// when memory was released)
    pub memory_delta_bytes: i64,
}

/// Branch tokens counted by the complexity estimate
const BRANCH_TOKENS: &[&str] = &[
    "if ", "for ", "while ", "match ", "case ", "elif ", "except", "catch", "&&", "||", "?.",
];

/// Deterministic cyclomatic-style complexity estimate
///
/// One plus the number of branch tokens in the source. Coarse, but
/// stable: the same content always scores the same.
#[must_use]
pub fn complexity_estimate(source: &str) -> u32 {
    let branches: usize = BRANCH_TOKENS
        .iter()
        .map(|token| source.matches(token).count())
        .sum();
    1 + branches as u32
}

/// Probe for the current process's memory usage
///
/// Degrades to `None` readings on platforms where the pid or process
/// table cannot be resolved; metrics then record a zero delta.
#[derive(Debug)]
pub(crate) struct MemoryProbe {
    system: System,
    pid: Option<Pid>,
}

impl MemoryProbe {
    pub(crate) fn new() -> Self {
        Self {
            system: System::new(),
            pid: sysinfo::get_current_pid().ok(),
        }
    }

    /// Current resident memory in bytes, if measurable
    pub(crate) fn current_bytes(&mut self) -> Option<u64> {
        let pid = self.pid?;
        self.system.refresh_process(pid);
        self.system.process(pid).map(|p| p.memory())
    }
}

/// Signed delta between two optional readings
pub(crate) fn memory_delta(before: Option<u64>, after: Option<u64>) -> i64 {
    match (before, after) {
        (Some(b), Some(a)) => a as i64 - b as i64,
        _ => 0,
    }
}
