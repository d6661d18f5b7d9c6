// src/api.rs

//! Response types of the collaborator-facing API.
//!
//! These are what an HTTP/UI layer hands back to its clients, so they
//! derive `Serialize` and keep the field names of the wire format.

use serde::Serialize;

use crate::errors::Result;
use crate::types::{ProgressSnapshot, RunState};

/// Result of [`Supervisor::start_run`](crate::Supervisor::start_run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StartOutcome {
    pub started: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StartOutcome {
    pub fn from_result(result: Result<u64>) -> Self {
        match result {
            Ok(_) => Self {
                started: true,
                reason: None,
            },
            Err(err) => Self {
                started: false,
                reason: Some(err.to_string()),
            },
        }
    }
}

/// Result of [`Supervisor::stop_run`](crate::Supervisor::stop_run).
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StopOutcome {
    pub stopped: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

impl StopOutcome {
    pub fn from_result(result: Result<()>) -> Self {
        match result {
            Ok(()) => Self {
                stopped: true,
                reason: None,
            },
            Err(err) => Self {
                stopped: false,
                reason: Some(err.to_string()),
            },
        }
    }
}

/// Combined read-only view of the supervisor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunStatus {
    pub state: RunState,
    pub progress: ProgressSnapshot,
    pub output: String,
    /// The completion sentinel has been printed; pollers may stop.
    pub completed: bool,
    pub run_id: u64,
}

impl RunStatus {
    /// Whether a poller still needs to keep polling.
    pub fn is_live(&self) -> bool {
        self.state.is_active() && !self.completed
    }
}
