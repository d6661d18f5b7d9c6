use std::io;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use tokio::io::{AsyncWriteExt, DuplexStream};
use tokio::sync::{watch, Notify};

use smokerun::config::RunnerSection;
use smokerun::exec::{OutputStream, RunnerBackend, RunnerProcess, WaitFuture};
use smokerun::types::RunExit;

/// What a scripted runner process prints and how it exits.
#[derive(Debug, Clone, Default)]
pub struct RunnerScript {
    pub stdout: Vec<String>,
    pub stderr: Vec<String>,
    pub exit_code: i32,
    /// Pause before each stdout line.
    pub line_delay: Duration,
    /// Keep the process alive after the script until it is terminated.
    pub hold_until_terminated: bool,
    /// Only a kill ends the process; polite termination is ignored.
    pub ignore_terminate: bool,
}

impl RunnerScript {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stdout_line(mut self, line: &str) -> Self {
        self.stdout.push(line.to_string());
        self
    }

    pub fn stdout_lines(mut self, lines: &[&str]) -> Self {
        self.stdout.extend(lines.iter().map(|l| l.to_string()));
        self
    }

    pub fn stderr_line(mut self, line: &str) -> Self {
        self.stderr.push(line.to_string());
        self
    }

    pub fn exit_code(mut self, code: i32) -> Self {
        self.exit_code = code;
        self
    }

    pub fn line_delay(mut self, delay: Duration) -> Self {
        self.line_delay = delay;
        self
    }

    pub fn hold_until_terminated(mut self) -> Self {
        self.hold_until_terminated = true;
        self
    }

    pub fn ignore_terminate(mut self) -> Self {
        self.ignore_terminate = true;
        self
    }
}

/// A fake runner backend that:
/// - "spawns" processes which play back a [`RunnerScript`]
/// - counts spawns, termination requests and kills
/// - can simulate a missing executable or a spawn failure.
#[derive(Debug, Clone)]
pub struct ScriptedRunner {
    script: RunnerScript,
    executable_present: bool,
    spawn_error: Option<String>,
    spawned: Arc<AtomicUsize>,
    terminations: Arc<AtomicUsize>,
    kills: Arc<AtomicUsize>,
}

impl ScriptedRunner {
    pub fn new(script: RunnerScript) -> Self {
        Self {
            script,
            executable_present: true,
            spawn_error: None,
            spawned: Arc::new(AtomicUsize::new(0)),
            terminations: Arc::new(AtomicUsize::new(0)),
            kills: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub fn missing_executable() -> Self {
        Self {
            executable_present: false,
            ..Self::new(RunnerScript::new())
        }
    }

    pub fn failing_spawn(message: &str) -> Self {
        Self {
            spawn_error: Some(message.to_string()),
            ..Self::new(RunnerScript::new())
        }
    }

    pub fn spawn_count(&self) -> usize {
        self.spawned.load(Ordering::SeqCst)
    }

    pub fn termination_count(&self) -> usize {
        self.terminations.load(Ordering::SeqCst)
    }

    pub fn kill_count(&self) -> usize {
        self.kills.load(Ordering::SeqCst)
    }
}

impl RunnerBackend for ScriptedRunner {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.executable_present.then(|| PathBuf::from(program))
    }

    fn spawn(
        &self,
        _program: &Path,
        _runner: &RunnerSection,
    ) -> anyhow::Result<Box<dyn RunnerProcess>> {
        if let Some(msg) = &self.spawn_error {
            anyhow::bail!("{msg}");
        }
        self.spawned.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(ScriptedProcess::start(
            self.script.clone(),
            Arc::clone(&self.terminations),
            Arc::clone(&self.kills),
        )))
    }
}

struct ScriptedProcess {
    stdout: Option<OutputStream>,
    stderr: Option<OutputStream>,
    exit_rx: watch::Receiver<Option<RunExit>>,
    /// Wakes the playback task; fired by `terminate` unless it is ignored,
    /// and always by `kill`.
    terminate: Arc<Notify>,
    ignore_terminate: bool,
    terminations: Arc<AtomicUsize>,
    kills: Arc<AtomicUsize>,
}

impl ScriptedProcess {
    fn start(
        script: RunnerScript,
        terminations: Arc<AtomicUsize>,
        kills: Arc<AtomicUsize>,
    ) -> Self {
        let (out_w, out_r) = tokio::io::duplex(64 * 1024);
        let (err_w, err_r) = tokio::io::duplex(64 * 1024);
        let (exit_tx, exit_rx) = watch::channel(None);
        let terminate = Arc::new(Notify::new());
        let ignore_terminate = script.ignore_terminate;

        tokio::spawn(play(script, out_w, err_w, exit_tx, Arc::clone(&terminate)));

        Self {
            stdout: Some(Box::new(out_r)),
            stderr: Some(Box::new(err_r)),
            exit_rx,
            terminate,
            ignore_terminate,
            terminations,
            kills,
        }
    }
}

async fn play(
    script: RunnerScript,
    mut out: DuplexStream,
    mut err: DuplexStream,
    exit_tx: watch::Sender<Option<RunExit>>,
    terminate: Arc<Notify>,
) {
    let mut terminated = false;

    for line in &script.stdout {
        if !script.line_delay.is_zero() {
            tokio::select! {
                _ = terminate.notified() => {
                    terminated = true;
                    break;
                }
                _ = tokio::time::sleep(script.line_delay) => {}
            }
        }
        if out.write_all(format!("{line}\n").as_bytes()).await.is_err() {
            break;
        }
    }

    if !terminated {
        for line in &script.stderr {
            let _ = err.write_all(format!("{line}\n").as_bytes()).await;
        }
    }

    if script.hold_until_terminated && !terminated {
        terminate.notified().await;
        terminated = true;
    }

    drop(out);
    drop(err);

    let exit = if terminated {
        RunExit::signalled()
    } else {
        RunExit::from_code(script.exit_code)
    };
    let _ = exit_tx.send(Some(exit));
}

impl RunnerProcess for ScriptedProcess {
    fn id(&self) -> Option<u32> {
        None
    }

    fn take_stdout(&mut self) -> Option<OutputStream> {
        self.stdout.take()
    }

    fn take_stderr(&mut self) -> Option<OutputStream> {
        self.stderr.take()
    }

    fn try_wait(&mut self) -> io::Result<Option<RunExit>> {
        Ok(*self.exit_rx.borrow())
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        let mut rx = self.exit_rx.clone();
        Box::pin(async move {
            let exit = rx
                .wait_for(|e| e.is_some())
                .await
                .map_err(|_| io::Error::other("scripted runner vanished"))?;
            (*exit).ok_or_else(|| io::Error::other("scripted runner exited without status"))
        })
    }

    fn terminate(&mut self) -> io::Result<()> {
        self.terminations.fetch_add(1, Ordering::SeqCst);
        if !self.ignore_terminate {
            self.terminate.notify_one();
        }
        Ok(())
    }

    fn kill(&mut self) -> io::Result<()> {
        self.kills.fetch_add(1, Ordering::SeqCst);
        self.terminate.notify_one();
        Ok(())
    }
}
