// src/supervisor/run_slot.rs

//! Pure run-state machine.
//!
//! `RunSlot` decides which lifecycle transitions are legal and what the
//! terminal state of a run is. It has no channels, no Tokio types and does
//! no IO; the [`Supervisor`](super::Supervisor) wraps it in a mutex and
//! drives it from the caller side (`begin`, `request_stop`) and from the
//! streaming loop (`mark_completed`, `finish`).

use crate::errors::{Result, SmokerunError};
use crate::types::{RunExit, RunState};

/// How a run ended, as observed by the streaming loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunOutcome {
    /// The runner process exited.
    Exited { exit: RunExit, wrote_stderr: bool },
    /// `stop` arrived before the runner was spawned.
    CancelledBeforeSpawn,
    /// The executable was missing or could not be spawned.
    SetupFailed,
    /// Reading output or waiting for the process failed.
    StreamFailed,
    /// `max_run_duration` elapsed.
    TimedOut,
}

#[derive(Debug, Clone, Default)]
pub struct RunSlot {
    state: RunState,
    run_id: u64,
    completed: bool,
    stop_requested: bool,
}

impl RunSlot {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn state(&self) -> RunState {
        self.state
    }

    /// Id of the current (or last) run; 0 before the first run.
    pub fn run_id(&self) -> u64 {
        self.run_id
    }

    /// Whether the completion sentinel was seen in the current run.
    pub fn completed(&self) -> bool {
        self.completed
    }

    pub fn stop_requested(&self) -> bool {
        self.stop_requested
    }

    /// Claim the slot for a new run.
    pub fn begin(&mut self) -> Result<u64> {
        if !self.state.accepts_start() {
            return Err(SmokerunError::AlreadyRunning);
        }
        self.run_id += 1;
        self.state = RunState::Running;
        self.completed = false;
        self.stop_requested = false;
        Ok(self.run_id)
    }

    /// Move a running run to `Stopping`.
    pub fn request_stop(&mut self) -> Result<u64> {
        if self.state != RunState::Running {
            return Err(SmokerunError::NotRunning);
        }
        self.state = RunState::Stopping;
        self.stop_requested = true;
        Ok(self.run_id)
    }

    /// Record the completion sentinel. Returns true the first time.
    pub fn mark_completed(&mut self, run_id: u64) -> bool {
        if run_id != self.run_id || !self.state.is_active() || self.completed {
            return false;
        }
        self.completed = true;
        true
    }

    /// Settle the run into its terminal state.
    ///
    /// Calls for a run that is not the current one are ignored.
    pub fn finish(&mut self, run_id: u64, outcome: RunOutcome) -> RunState {
        if run_id != self.run_id || !self.state.is_active() {
            return self.state;
        }

        self.state = match outcome {
            RunOutcome::SetupFailed | RunOutcome::StreamFailed | RunOutcome::TimedOut => {
                RunState::Failed
            }
            RunOutcome::CancelledBeforeSpawn => RunState::Finished,
            RunOutcome::Exited { .. } if self.stop_requested => RunState::Finished,
            RunOutcome::Exited { exit, wrote_stderr } => {
                if !exit.success && wrote_stderr {
                    RunState::Failed
                } else {
                    RunState::Finished
                }
            }
        };
        self.state
    }
}
