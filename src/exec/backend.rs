// src/exec/backend.rs

//! Pluggable runner backend abstraction.
//!
//! The supervisor talks to a `RunnerBackend` instead of `tokio::process`
//! directly. This makes it easy to swap in a scripted fake runner in tests
//! while keeping the production implementation here.
//!
//! - `RealRunnerBackend` is the default implementation. It looks the program
//!   up on `PATH` and spawns it with stdout/stderr piped.
//! - Tests can provide their own backend whose processes emit scripted lines
//!   and exit codes without touching the OS.

use std::future::Future;
use std::io;
use std::path::{Path, PathBuf};
use std::pin::Pin;
use std::process::Stdio;

use anyhow::{Context, Result};
use tokio::io::AsyncRead;
use tokio::process::{Child, Command};
use tracing::debug;

use crate::config::RunnerSection;
use crate::types::RunExit;

use super::locate::locate_executable;

/// One of the runner's output pipes.
pub type OutputStream = Box<dyn AsyncRead + Send + Unpin>;

/// Future returned by [`RunnerProcess::wait`].
pub type WaitFuture<'a> = Pin<Box<dyn Future<Output = io::Result<RunExit>> + Send + 'a>>;

/// A spawned runner process, exclusively owned by the streaming loop.
pub trait RunnerProcess: Send {
    /// OS process id, if there is one.
    fn id(&self) -> Option<u32>;

    /// Take the stdout pipe. Returns `None` after the first call.
    fn take_stdout(&mut self) -> Option<OutputStream>;

    /// Take the stderr pipe. Returns `None` after the first call.
    fn take_stderr(&mut self) -> Option<OutputStream>;

    /// Non-blocking exit check.
    fn try_wait(&mut self) -> io::Result<Option<RunExit>>;

    /// Wait for the process to exit.
    fn wait(&mut self) -> WaitFuture<'_>;

    /// Ask the process to terminate. Must not block and must not force-kill
    /// where a polite signal is available.
    fn terminate(&mut self) -> io::Result<()>;

    /// Force-kill the process. Used once a termination request has been
    /// ignored for too long.
    fn kill(&mut self) -> io::Result<()>;
}

/// Trait abstracting how the runner is located and started.
///
/// Production code uses [`RealRunnerBackend`]; tests can provide their own
/// implementation that doesn't spawn real processes.
pub trait RunnerBackend: Send + Sync {
    /// Resolve the configured program to something spawnable.
    fn locate(&self, program: &str) -> Option<PathBuf>;

    /// Start the runner with stdout and stderr captured.
    fn spawn(&self, program: &Path, runner: &RunnerSection) -> Result<Box<dyn RunnerProcess>>;
}

/// Real backend used in production.
#[derive(Debug, Clone, Copy, Default)]
pub struct RealRunnerBackend;

impl RunnerBackend for RealRunnerBackend {
    fn locate(&self, program: &str) -> Option<PathBuf> {
        locate_executable(program)
    }

    fn spawn(&self, program: &Path, runner: &RunnerSection) -> Result<Box<dyn RunnerProcess>> {
        let mut cmd = Command::new(program);
        cmd.args(&runner.args)
            .envs(&runner.env)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        if let Some(dir) = &runner.working_dir {
            cmd.current_dir(dir);
        }

        let child = cmd
            .spawn()
            .with_context(|| format!("spawning runner process '{}'", program.display()))?;

        debug!(pid = ?child.id(), program = %program.display(), "runner process spawned");

        Ok(Box::new(ChildProcess { child }))
    }
}

/// [`RunnerProcess`] backed by a `tokio::process::Child`.
#[derive(Debug)]
pub struct ChildProcess {
    child: Child,
}

impl RunnerProcess for ChildProcess {
    fn id(&self) -> Option<u32> {
        self.child.id()
    }

    fn take_stdout(&mut self) -> Option<OutputStream> {
        self.child
            .stdout
            .take()
            .map(|s| Box::new(s) as OutputStream)
    }

    fn take_stderr(&mut self) -> Option<OutputStream> {
        self.child
            .stderr
            .take()
            .map(|s| Box::new(s) as OutputStream)
    }

    fn try_wait(&mut self) -> io::Result<Option<RunExit>> {
        Ok(self.child.try_wait()?.map(RunExit::from))
    }

    fn wait(&mut self) -> WaitFuture<'_> {
        Box::pin(async move { Ok(RunExit::from(self.child.wait().await?)) })
    }

    #[cfg(unix)]
    fn terminate(&mut self) -> io::Result<()> {
        use nix::sys::signal::{kill, Signal};
        use nix::unistd::Pid;

        // `id()` is `None` once the child has been reaped.
        match self.child.id() {
            Some(pid) => kill(Pid::from_raw(pid as i32), Signal::SIGTERM).map_err(io::Error::from),
            None => Ok(()),
        }
    }

    #[cfg(not(unix))]
    fn terminate(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }

    fn kill(&mut self) -> io::Result<()> {
        self.child.start_kill()
    }
}
