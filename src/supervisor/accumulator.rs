// src/supervisor/accumulator.rs

use tokio::sync::watch;

use crate::types::ProgressSnapshot;

/// Single-slot holder for the latest [`ProgressSnapshot`].
///
/// Backed by a `watch` channel. `set` swaps the whole value under the
/// channel's lock and wakes subscribers when it changed.
#[derive(Debug)]
pub struct ProgressAccumulator {
    tx: watch::Sender<ProgressSnapshot>,
}

impl ProgressAccumulator {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(ProgressSnapshot::default());
        Self { tx }
    }

    /// Replace the stored snapshot. Subscribers are only notified when the
    /// value actually changed.
    pub fn set(&self, snapshot: ProgressSnapshot) {
        self.tx.send_if_modified(|current| {
            if *current == snapshot {
                return false;
            }
            *current = snapshot;
            true
        });
    }

    pub fn get(&self) -> ProgressSnapshot {
        *self.tx.borrow()
    }

    pub fn reset(&self) {
        self.set(ProgressSnapshot::default());
    }

    pub fn subscribe(&self) -> watch::Receiver<ProgressSnapshot> {
        self.tx.subscribe()
    }
}

impl Default for ProgressAccumulator {
    fn default() -> Self {
        Self::new()
    }
}
