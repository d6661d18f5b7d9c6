use std::fmt;

use serde::Serialize;

/// Lifecycle of the single supervised run.
///
/// - `Idle`: nothing has run yet.
/// - `Running`: the test runner process is live and its output is streaming.
/// - `Stopping`: `stop` was requested; the process has been signalled but the
///   streaming loop has not finalized the run yet.
/// - `Finished` / `Failed`: terminal states of the last run. A new run may
///   start from either.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum RunState {
    #[default]
    Idle,
    Running,
    Stopping,
    Finished,
    Failed,
}

impl RunState {
    /// True while a process may still be alive.
    pub fn is_active(self) -> bool {
        matches!(self, RunState::Running | RunState::Stopping)
    }

    /// True when `start` is allowed.
    pub fn accepts_start(self) -> bool {
        matches!(self, RunState::Idle | RunState::Finished | RunState::Failed)
    }
}

impl fmt::Display for RunState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RunState::Idle => "idle",
            RunState::Running => "running",
            RunState::Stopping => "stopping",
            RunState::Finished => "finished",
            RunState::Failed => "failed",
        };
        f.write_str(s)
    }
}

/// Progress counters derived from the runner output.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct ProgressSnapshot {
    pub passed: u64,
    pub failed: u64,
    pub skipped: u64,
    pub pending: u64,
    pub running: u64,
    pub total: u64,
    pub yet_to_run: u64,
}

impl ProgressSnapshot {
    /// Number of tests that have reached an outcome.
    pub fn done(&self) -> u64 {
        self.passed
            .saturating_add(self.failed)
            .saturating_add(self.pending)
    }

    /// Whole-number completion percentage, 0 when the total is unknown.
    pub fn percent(&self) -> u64 {
        if self.total == 0 {
            return 0;
        }
        (self.done().saturating_mul(100) / self.total).min(100)
    }
}

impl fmt::Display for ProgressSnapshot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "total={} passed={} failed={} skipped={} pending={} running={} yet_to_run={}",
            self.total,
            self.passed,
            self.failed,
            self.skipped,
            self.pending,
            self.running,
            self.yet_to_run
        )
    }
}

/// How the runner process ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RunExit {
    /// Exit code, `None` when the process was ended by a signal.
    pub code: Option<i32>,
    pub success: bool,
}

impl RunExit {
    pub fn from_code(code: i32) -> Self {
        Self {
            code: Some(code),
            success: code == 0,
        }
    }

    pub fn signalled() -> Self {
        Self {
            code: None,
            success: false,
        }
    }
}

impl From<std::process::ExitStatus> for RunExit {
    fn from(status: std::process::ExitStatus) -> Self {
        Self {
            code: status.code(),
            success: status.success(),
        }
    }
}
