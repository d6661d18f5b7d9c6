// src/supervisor/stream.rs

//! The per-run streaming loop.

use std::io;
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncBufReadExt, BufReader, Split};
use tokio::sync::oneshot;
use tokio::time::{interval, sleep_until, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::errors::SmokerunError;
use crate::exec::{OutputStream, RunnerProcess};
use crate::parser::{parse_output, ProgressParser};
use crate::types::RunExit;

use super::run_slot::RunOutcome;
use super::Shared;

type LineReader = Split<BufReader<OutputStream>>;

/// Locate, spawn and follow one run, then settle its final state.
///
/// Never returns an error: every failure is written to the output log and
/// turns into a `Failed` run.
pub(super) async fn supervise_run(
    shared: Arc<Shared>,
    run_id: u64,
    mut cancel_rx: oneshot::Receiver<()>,
) {
    let mut recorder = Recorder::new(&shared, run_id);
    let outcome = run_inner(&shared, &mut recorder, &mut cancel_rx).await;

    // Last full parse over everything that was recorded.
    let final_progress = parse_output(&shared.output.text());
    shared.progress.set(final_progress);

    let state = {
        let mut control = shared.control();
        let state = control.slot.finish(run_id, outcome);
        control.cancel = None;
        shared.state_tx.send_replace(state);
        state
    };

    info!(
        run_id,
        ?outcome,
        %state,
        progress = %final_progress,
        "smoke test run settled"
    );
}

async fn run_inner(
    shared: &Shared,
    recorder: &mut Recorder<'_>,
    cancel_rx: &mut oneshot::Receiver<()>,
) -> RunOutcome {
    let run_id = recorder.run_id;
    let program = shared.config.runner.program.as_str();

    let Some(path) = shared.backend.locate(program) else {
        let err = SmokerunError::ExecutableNotFound(program.to_string());
        warn!(run_id, program, "runner executable not found");
        recorder.record(format!("Error: {err}"));
        return RunOutcome::SetupFailed;
    };

    if cancel_rx.try_recv().is_ok() {
        info!(run_id, "stop requested before the runner was spawned");
        recorder.record("Run stopped before the test runner was started.");
        return RunOutcome::CancelledBeforeSpawn;
    }

    let process = match shared.backend.spawn(&path, &shared.config.runner) {
        Ok(p) => p,
        Err(e) => {
            let err = SmokerunError::ProcessSpawn {
                program: path.display().to_string(),
                reason: format!("{e:#}"),
            };
            error!(run_id, error = %err, "failed to spawn runner");
            recorder.record(format!("Error: {err}"));
            return RunOutcome::SetupFailed;
        }
    };

    info!(
        run_id,
        pid = ?process.id(),
        program = %path.display(),
        "runner process started"
    );

    let follower = Follower {
        shared,
        process,
        cancel_open: true,
        deadline: shared.config.max_run_duration.map(|d| Instant::now() + d),
        timed_out: false,
        kill_at: None,
        killed: false,
    };
    follower.follow(recorder, cancel_rx).await
}

/// Drives a spawned process until it exits and its pipes are drained.
struct Follower<'a> {
    shared: &'a Shared,
    process: Box<dyn RunnerProcess>,
    cancel_open: bool,
    deadline: Option<Instant>,
    timed_out: bool,
    /// Set by the first termination request; the process is killed when it
    /// passes.
    kill_at: Option<Instant>,
    killed: bool,
}

impl Follower<'_> {
    async fn follow(
        mut self,
        recorder: &mut Recorder<'_>,
        cancel_rx: &mut oneshot::Receiver<()>,
    ) -> RunOutcome {
        let run_id = recorder.run_id;
        let mut stdout: Option<LineReader> =
            self.process.take_stdout().map(|s| BufReader::new(s).split(b'\n'));
        let mut stderr: Option<LineReader> =
            self.process.take_stderr().map(|s| BufReader::new(s).split(b'\n'));
        let mut stderr_lines: Vec<String> = Vec::new();
        let mut read_failure: Option<SmokerunError> = None;

        let mut ticker = interval(self.shared.config.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        let mut exit: Option<RunExit> = None;
        let mut drain_deadline: Option<Instant> = None;

        while stdout.is_some() || stderr.is_some() {
            tokio::select! {
                res = &mut *cancel_rx, if self.cancel_open => {
                    self.cancel_open = false;
                    if res.is_ok() {
                        self.terminate(run_id, "stop requested");
                    }
                }

                line = next_line(&mut stdout) => match line {
                    Ok(Some(line)) => {
                        debug!(run_id, "stdout: {}", line);
                        recorder.record(line);
                    }
                    Ok(None) => stdout = None,
                    Err(source) => {
                        warn!(run_id, error = %source, "reading runner stdout failed");
                        read_failure = Some(SmokerunError::StreamRead { stream: "stdout", source });
                        stdout = None;
                    }
                },

                line = next_line(&mut stderr) => match line {
                    Ok(Some(line)) => {
                        debug!(run_id, "stderr: {}", line);
                        stderr_lines.push(line);
                    }
                    Ok(None) => stderr = None,
                    Err(source) => {
                        warn!(run_id, error = %source, "reading runner stderr failed");
                        read_failure = Some(SmokerunError::StreamRead { stream: "stderr", source });
                        stderr = None;
                    }
                },

                _ = ticker.tick(), if exit.is_none() => {
                    match self.process.try_wait() {
                        Ok(Some(status)) => {
                            debug!(run_id, exit_code = ?status.code, "runner exited; draining output");
                            exit = Some(status);
                            drain_deadline = Some(Instant::now() + self.shared.config.drain_timeout);
                        }
                        Ok(None) => {}
                        Err(e) => warn!(run_id, error = %e, "polling runner process failed"),
                    }
                }

                _ = sleep_opt(drain_deadline) => {
                    // Something outlived the runner and still holds the pipes.
                    warn!(run_id, "output not drained within drain_timeout; abandoning pipes");
                    break;
                }

                _ = sleep_opt(self.deadline), if !self.timed_out => {
                    self.on_deadline(recorder);
                }

                _ = sleep_opt(self.kill_at), if !self.killed && exit.is_none() => {
                    self.kill(run_id, "termination request ignored for stop_grace");
                }
            }
        }

        let exit = match exit {
            Some(exit) => Ok(exit),
            None => self.wait_exit(recorder, cancel_rx).await,
        };

        if !stderr_lines.is_empty() {
            recorder.record("");
            recorder.record("Error:");
            for line in stderr_lines.iter() {
                recorder.record(line.as_str());
            }
        }

        if self.timed_out {
            return RunOutcome::TimedOut;
        }

        if let Some(err) = read_failure {
            recorder.record(format!("Error: {err}"));
            return RunOutcome::StreamFailed;
        }

        match exit {
            Ok(exit) => {
                info!(
                    run_id,
                    exit_code = ?exit.code,
                    success = exit.success,
                    "runner process exited"
                );
                RunOutcome::Exited {
                    exit,
                    wrote_stderr: !stderr_lines.is_empty(),
                }
            }
            Err(e) => {
                error!(run_id, error = %e, "waiting for runner process failed");
                recorder.record(format!("Error: waiting for the test runner failed: {e}"));
                RunOutcome::StreamFailed
            }
        }
    }

    /// Pipes are closed; wait for the exit status while still honouring
    /// `stop` and the run deadline.
    async fn wait_exit(
        &mut self,
        recorder: &mut Recorder<'_>,
        cancel_rx: &mut oneshot::Receiver<()>,
    ) -> io::Result<RunExit> {
        let run_id = recorder.run_id;
        loop {
            tokio::select! {
                res = self.process.wait() => return res,

                res = &mut *cancel_rx, if self.cancel_open => {
                    self.cancel_open = false;
                    if res.is_ok() {
                        self.terminate(run_id, "stop requested");
                    }
                }

                _ = sleep_opt(self.deadline), if !self.timed_out => {
                    self.on_deadline(recorder);
                }

                _ = sleep_opt(self.kill_at), if !self.killed => {
                    self.kill(run_id, "termination request ignored for stop_grace");
                }
            }
        }
    }

    fn on_deadline(&mut self, recorder: &mut Recorder<'_>) {
        self.timed_out = true;
        let limit = self.shared.config.max_run_duration.unwrap_or(Duration::ZERO);
        warn!(run_id = recorder.run_id, ?limit, "run exceeded max_run_duration");
        recorder.record(format!(
            "Error: run exceeded max_run_duration of {limit:?}; killing the test runner."
        ));
        self.kill(recorder.run_id, "max_run_duration elapsed");
    }

    fn terminate(&mut self, run_id: u64, why: &str) {
        info!(run_id, reason = why, "requesting runner termination");
        if let Err(e) = self.process.terminate() {
            warn!(run_id, error = %e, "failed to signal runner process");
        }
        if self.kill_at.is_none() {
            self.kill_at = Some(Instant::now() + self.shared.config.stop_grace);
        }
    }

    fn kill(&mut self, run_id: u64, why: &str) {
        if self.killed {
            return;
        }
        self.killed = true;
        warn!(run_id, reason = why, "killing runner process");
        if let Err(e) = self.process.kill() {
            warn!(run_id, error = %e, "failed to kill runner process");
        }
    }
}

/// Next line from an optional reader; pending forever once it is gone.
///
/// Undecodable bytes are replaced rather than failing the stream.
async fn next_line(reader: &mut Option<LineReader>) -> io::Result<Option<String>> {
    let Some(split) = reader else {
        return std::future::pending().await;
    };
    Ok(split.next_segment().await?.map(|mut bytes| {
        if bytes.last() == Some(&b'\r') {
            bytes.pop();
        }
        String::from_utf8_lossy(&bytes).into_owned()
    }))
}

async fn sleep_opt(deadline: Option<Instant>) {
    match deadline {
        Some(at) => sleep_until(at).await,
        None => std::future::pending().await,
    }
}

/// Feeds recorded lines to the output log, the parser and the accumulator.
struct Recorder<'a> {
    shared: &'a Shared,
    run_id: u64,
    parser: ProgressParser,
    completed: bool,
}

impl<'a> Recorder<'a> {
    fn new(shared: &'a Shared, run_id: u64) -> Self {
        Self {
            shared,
            run_id,
            parser: ProgressParser::new(),
            completed: false,
        }
    }

    fn record(&mut self, line: impl Into<String>) {
        let line = line.into();
        self.parser.feed_line(&line);
        let snapshot = self.parser.snapshot();
        let sentinel = !self.completed && self.shared.config.finished_sentinel.is_match(&line);

        let shared = self.shared;
        shared
            .output
            .append_and(line, || shared.progress.set(snapshot));

        if sentinel {
            self.completed = true;
            if shared.control().slot.mark_completed(self.run_id) {
                info!(run_id = self.run_id, progress = %snapshot, "completion sentinel seen");
            }
        }
    }
}
