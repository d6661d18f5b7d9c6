// src/supervisor/output_log.rs

use std::sync::{Mutex, MutexGuard, PoisonError};

/// Append-only log of everything the runner printed during the current run.
///
/// Cleared only when the next run starts.
#[derive(Debug, Default)]
pub struct OutputLog {
    lines: Mutex<Vec<String>>,
}

impl OutputLog {
    pub fn new() -> Self {
        Self::default()
    }

    fn guard(&self) -> MutexGuard<'_, Vec<String>> {
        // Poisoning is ignored: a push never leaves the Vec half-written.
        self.lines.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn append(&self, line: impl Into<String>) {
        self.guard().push(line.into());
    }

    /// Append `line` and run `then` before the lock is released, so readers
    /// using [`OutputLog::read_with`] see both or neither.
    pub fn append_and(&self, line: impl Into<String>, then: impl FnOnce()) {
        let mut lines = self.guard();
        lines.push(line.into());
        then();
    }

    /// Full text plus whatever `f` reads, taken under one lock.
    pub fn read_with<T>(&self, f: impl FnOnce() -> T) -> (String, T) {
        let lines = self.guard();
        let extra = f();
        (lines.join("\n"), extra)
    }

    pub fn clear(&self) {
        self.guard().clear();
    }

    pub fn text(&self) -> String {
        self.guard().join("\n")
    }

    pub fn lines(&self) -> Vec<String> {
        self.guard().clone()
    }

    pub fn len(&self) -> usize {
        self.guard().len()
    }

    pub fn is_empty(&self) -> bool {
        self.guard().is_empty()
    }
}
