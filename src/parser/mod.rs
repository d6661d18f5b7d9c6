// src/parser/mod.rs

//! Derives a [`ProgressSnapshot`] from the raw output of the test runner.
//!
//! The runner emits three families of markers (see [`patterns`]):
//!
//! 1. **live** batch updates (`Passed: 3, Failed: 1, Skipped: 2`), summed
//!    across the whole output;
//! 2. **structural** counters (`Total:`, `In Progress:`, `Yet to Run:`,
//!    `Pending:`), each overwriting its own field;
//! 3. **final** summaries (`Passed Count:` etc. or the combined
//!    `All N Passed P Failed F Flaky K Skipped S` line), which replace the
//!    counts outright.
//!
//! The result for a given output is always the same as re-deriving it from
//! the whole text. [`ProgressParser`] keeps one small state record per marker
//! family so that feeding a line is O(1); [`parse_output`] is just a fresh
//! parser fed with every line.
//!
//! Precedence when live and final markers are both present: whichever family
//! appeared last wins. A final summary overrides the live batches printed
//! before it; a live batch printed after the final summary brings back the
//! live sums.

pub mod patterns;

use crate::types::ProgressSnapshot;

use patterns::{
    capture_count, capture_counts, FAILED_COUNT, FINAL_SUMMARY, IN_PROGRESS, LIVE_RESULT,
    PASSED_COUNT, PENDING, SKIPPED_COUNT, TOTAL, YET_TO_RUN,
};

/// Parse a complete block of runner output.
pub fn parse_output(output: &str) -> ProgressSnapshot {
    let mut parser = ProgressParser::new();
    for line in output.lines() {
        parser.feed_line(line);
    }
    parser.snapshot()
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct Structural {
    /// First non-zero `Total:` wins.
    total: u64,
    running: Option<u64>,
    yet_to_run: Option<u64>,
    pending: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct LiveTotals {
    passed: u64,
    failed: u64,
    skipped: u64,
    last_line: Option<u64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct FinalCounts {
    passed: u64,
    failed: u64,
    skipped: u64,
    /// `N` from the latest combined summary line.
    total: Option<u64>,
    last_line: Option<u64>,
}

impl FinalCounts {
    fn any_positive(&self) -> bool {
        self.passed > 0 || self.failed > 0 || self.skipped > 0
    }
}

/// Incremental progress parser.
///
/// Owned by whoever reads the output stream; not shared.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgressParser {
    lines_seen: u64,
    structural: Structural,
    live: LiveTotals,
    finals: FinalCounts,
}

impl ProgressParser {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of lines fed so far.
    pub fn lines_seen(&self) -> u64 {
        self.lines_seen
    }

    /// Account for one line of output. Lines that match nothing are ignored.
    pub fn feed_line(&mut self, line: &str) {
        let idx = self.lines_seen;
        self.lines_seen += 1;

        if let Some([passed, failed, skipped]) = capture_counts::<3>(&LIVE_RESULT, line) {
            self.live.passed = self.live.passed.saturating_add(passed);
            self.live.failed = self.live.failed.saturating_add(failed);
            self.live.skipped = self.live.skipped.saturating_add(skipped);
            self.live.last_line = Some(idx);
        }

        self.feed_structural(line);
        self.feed_final(line, idx);
    }

    fn feed_structural(&mut self, line: &str) {
        let s = &mut self.structural;

        if s.total == 0 {
            if let Some(total) = capture_count(&TOTAL, line) {
                s.total = total;
            }
        }
        if let Some(running) = capture_count(&IN_PROGRESS, line) {
            s.running = Some(running);
        }
        if let Some(yet) = capture_count(&YET_TO_RUN, line) {
            s.yet_to_run = Some(yet);
        }
        if let Some(pending) = capture_count(&PENDING, line) {
            s.pending = Some(pending);
        }
    }

    fn feed_final(&mut self, line: &str, idx: u64) {
        let f = &mut self.finals;
        let mut matched = false;

        if let Some(n) = capture_count(&PASSED_COUNT, line) {
            f.passed = n;
            matched = true;
        }
        if let Some(n) = capture_count(&FAILED_COUNT, line) {
            f.failed = n;
            matched = true;
        }
        if let Some(n) = capture_count(&SKIPPED_COUNT, line) {
            f.skipped = n;
            matched = true;
        }
        if let Some([total, passed, failed, _flaky, skipped]) =
            capture_counts::<5>(&FINAL_SUMMARY, line)
        {
            f.total = Some(total);
            f.passed = passed;
            f.failed = failed;
            f.skipped = skipped;
            matched = true;
        }

        if matched {
            f.last_line = Some(idx);
        }
    }

    /// Current snapshot for everything fed so far.
    pub fn snapshot(&self) -> ProgressSnapshot {
        let final_is_latest = match (self.finals.last_line, self.live.last_line) {
            (Some(fin), Some(live)) => fin >= live,
            (Some(_), None) => true,
            (None, _) => false,
        };

        if self.finals.any_positive() && final_is_latest {
            self.final_snapshot()
        } else if self.live.last_line.is_some() {
            self.live_snapshot()
        } else {
            self.structural_snapshot()
        }
    }

    fn live_snapshot(&self) -> ProgressSnapshot {
        let s = &self.structural;
        ProgressSnapshot {
            passed: self.live.passed,
            failed: self.live.failed,
            skipped: self.live.skipped,
            pending: self.live.skipped,
            running: s.running.unwrap_or(0),
            total: s.total,
            yet_to_run: s.yet_to_run.unwrap_or(0),
        }
    }

    fn final_snapshot(&self) -> ProgressSnapshot {
        let f = &self.finals;
        let total = match f.total {
            Some(n) if n > 0 => n,
            _ => self.structural.total,
        };
        let done = f.passed.saturating_add(f.failed).saturating_add(f.skipped);

        ProgressSnapshot {
            passed: f.passed,
            failed: f.failed,
            skipped: f.skipped,
            pending: f.skipped,
            running: 0,
            total,
            yet_to_run: total.saturating_sub(done),
        }
    }

    fn structural_snapshot(&self) -> ProgressSnapshot {
        let s = &self.structural;
        let pending = s.pending.unwrap_or(0);
        let running = s.running.unwrap_or(0);
        let yet_to_run = match s.yet_to_run {
            Some(n) => n,
            None if s.total > 0 => s.total.saturating_sub(pending.saturating_add(running)),
            None => 0,
        };

        ProgressSnapshot {
            passed: 0,
            failed: 0,
            skipped: 0,
            pending,
            running,
            total: s.total,
            yet_to_run,
        }
    }
}
