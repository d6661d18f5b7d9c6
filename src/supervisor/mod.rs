// src/supervisor/mod.rs

//! Run supervisor.
//!
//! A [`Supervisor`] owns at most one test-runner process at a time. Callers
//! interact with it through cheap, non-blocking methods:
//!
//! - [`Supervisor::start`] / [`Supervisor::start_run`] claim the run slot,
//!   reset output and progress, and spawn the streaming loop;
//! - [`Supervisor::stop`] / [`Supervisor::stop_run`] ask the runner to
//!   terminate;
//! - [`Supervisor::status`] / [`Supervisor::get_status`] return the latest
//!   consistent view;
//! - [`Supervisor::subscribe`] pushes every progress change.
//!
//! The lifecycle rules live in the pure [`run_slot`] state machine; the
//! async IO half is in [`stream`].

pub mod accumulator;
pub mod output_log;
pub mod run_slot;
mod stream;

use std::fmt;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tokio::sync::{oneshot, watch};
use tracing::{debug, info};

use crate::api::{RunStatus, StartOutcome, StopOutcome};
use crate::config::SupervisorConfig;
use crate::errors::Result;
use crate::exec::{RealRunnerBackend, RunnerBackend};
use crate::types::{ProgressSnapshot, RunState};

pub use accumulator::ProgressAccumulator;
pub use output_log::OutputLog;
pub use run_slot::{RunOutcome, RunSlot};

/// Lifecycle state plus the stop signal of the current run.
#[derive(Debug, Default)]
struct Control {
    slot: RunSlot,
    cancel: Option<oneshot::Sender<()>>,
}

/// State shared between the supervisor handle and the streaming loop.
struct Shared {
    config: SupervisorConfig,
    backend: Arc<dyn RunnerBackend>,
    control: Mutex<Control>,
    state_tx: watch::Sender<RunState>,
    output: OutputLog,
    progress: ProgressAccumulator,
}

impl Shared {
    fn control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Handle to the run supervisor. Clones share the same run slot.
#[derive(Clone)]
pub struct Supervisor {
    shared: Arc<Shared>,
}

impl fmt::Debug for Supervisor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let control = self.shared.control();
        f.debug_struct("Supervisor")
            .field("slot", &control.slot)
            .field("command", &self.shared.config.command_line())
            .finish_non_exhaustive()
    }
}

impl Supervisor {
    /// Supervisor that launches real processes.
    pub fn new(config: SupervisorConfig) -> Self {
        Self::with_backend(config, Arc::new(RealRunnerBackend))
    }

    /// Supervisor with a custom runner backend (tests use a scripted one).
    pub fn with_backend(config: SupervisorConfig, backend: Arc<dyn RunnerBackend>) -> Self {
        let (state_tx, _rx) = watch::channel(RunState::Idle);
        Self {
            shared: Arc::new(Shared {
                config,
                backend,
                control: Mutex::new(Control::default()),
                state_tx,
                output: OutputLog::new(),
                progress: ProgressAccumulator::new(),
            }),
        }
    }

    pub fn config(&self) -> &SupervisorConfig {
        &self.shared.config
    }

    /// Start a new run.
    ///
    /// Returns the new run id, or `AlreadyRunning` if a run is still active.
    /// The runner is located and spawned on a background Tokio task, so this
    /// must be called from within a Tokio runtime. Setup failures (missing
    /// executable, spawn errors) end the run as `Failed` with a diagnostic in
    /// the output rather than being returned here.
    pub fn start(&self) -> Result<u64> {
        let (run_id, cancel_rx) = {
            let mut control = self.shared.control();
            let run_id = control.slot.begin()?;

            self.shared.output.clear();
            self.shared.progress.reset();

            let (cancel_tx, cancel_rx) = oneshot::channel::<()>();
            control.cancel = Some(cancel_tx);
            self.shared.state_tx.send_replace(RunState::Running);
            (run_id, cancel_rx)
        };

        info!(run_id, command = %self.shared.config.command_line(), "starting smoke test run");

        let shared = Arc::clone(&self.shared);
        tokio::spawn(async move {
            stream::supervise_run(shared, run_id, cancel_rx).await;
            debug!(run_id, "streaming loop finished");
        });

        Ok(run_id)
    }

    /// Request termination of the running process.
    ///
    /// Returns as soon as the request is recorded; the process may still be
    /// alive. The state is `Stopping` until the streaming loop settles it.
    pub fn stop(&self) -> Result<()> {
        let mut control = self.shared.control();
        let run_id = control.slot.request_stop()?;
        self.shared.state_tx.send_replace(RunState::Stopping);

        if let Some(cancel) = control.cancel.take() {
            if cancel.send(()).is_err() {
                debug!(run_id, "streaming loop already gone while stopping");
            }
        }

        info!(run_id, "stop requested for smoke test run");
        Ok(())
    }

    /// Latest state, progress and output.
    pub fn status(&self) -> RunStatus {
        let (state, completed, run_id) = {
            let control = self.shared.control();
            (
                control.slot.state(),
                control.slot.completed(),
                control.slot.run_id(),
            )
        };
        let (output, progress) = self.shared.output.read_with(|| self.shared.progress.get());

        RunStatus {
            state,
            progress,
            output,
            completed,
            run_id,
        }
    }

    pub fn state(&self) -> RunState {
        self.shared.control().slot.state()
    }

    pub fn progress(&self) -> ProgressSnapshot {
        self.shared.progress.get()
    }

    /// Current output as individual lines.
    pub fn output_lines(&self) -> Vec<String> {
        self.shared.output.lines()
    }

    /// Receive every progress change of every run.
    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.shared.progress.subscribe()
    }

    /// Receive every run state transition.
    pub fn subscribe_state(&self) -> watch::Receiver<RunState> {
        self.shared.state_tx.subscribe()
    }

    /// Wait until no run is active and return the settled state.
    pub async fn wait(&self) -> RunState {
        let mut rx = self.shared.state_tx.subscribe();
        match rx.wait_for(|state| !state.is_active()).await {
            Ok(state) => *state,
            Err(_) => self.state(),
        }
    }

    /// Collaborator API: start a run.
    pub fn start_run(&self) -> StartOutcome {
        StartOutcome::from_result(self.start())
    }

    /// Collaborator API: stop the current run.
    pub fn stop_run(&self) -> StopOutcome {
        StopOutcome::from_result(self.stop())
    }

    /// Collaborator API: combined status view.
    pub fn get_status(&self) -> RunStatus {
        self.status()
    }
}
