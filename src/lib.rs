// src/lib.rs

pub mod api;
pub mod config;
pub mod errors;
pub mod exec;
pub mod logging;
pub mod parser;
pub mod supervisor;
pub mod types;

use anyhow::Result;
use tracing::{info, warn};

pub use api::{RunStatus, StartOutcome, StopOutcome};
pub use config::SupervisorConfig;
pub use parser::{parse_output, ProgressParser};
pub use supervisor::Supervisor;
pub use types::{ProgressSnapshot, RunState};

/// High-level entry point used by `main.rs`.
///
/// This wires together:
/// - one run of the configured test runner
/// - a progress printer (one line on stdout per snapshot change)
/// - Ctrl-C handling, mapped to `stop`
///
/// Returns the final status once the run has settled.
pub async fn run(config: SupervisorConfig) -> Result<RunStatus> {
    let supervisor = Supervisor::new(config);

    let outcome = supervisor.start_run();
    if !outcome.started {
        anyhow::bail!(
            "could not start run: {}",
            outcome.reason.unwrap_or_default()
        );
    }

    // Print every progress change.
    let printer = {
        let mut rx = supervisor.subscribe();
        tokio::spawn(async move {
            while rx.changed().await.is_ok() {
                let snapshot = *rx.borrow_and_update();
                println!("[{:>3}%] {snapshot}", snapshot.percent());
            }
        })
    };

    // Ctrl-C → stop.
    {
        let supervisor = supervisor.clone();
        tokio::spawn(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                eprintln!("failed to listen for Ctrl+C: {e}");
                return;
            }
            let stop = supervisor.stop_run();
            if !stop.stopped {
                warn!(reason = ?stop.reason, "Ctrl-C received but nothing to stop");
            }
        });
    }

    let state = supervisor.wait().await;
    printer.abort();

    let status = supervisor.status();
    info!(%state, progress = %status.progress, completed = status.completed, "run finished");
    Ok(status)
}
