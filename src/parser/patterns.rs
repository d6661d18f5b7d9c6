// src/parser/patterns.rs

//! Textual markers emitted by the test runner's reporter.
//!
//! Every pattern is case-insensitive and matches anywhere in a line, so
//! prefixes like `RESULT#` or timestamps added by the runner are tolerated.

use std::sync::LazyLock;

use regex::Regex;

/// Live batch update: `Passed: 3, Failed: 1, Skipped: 2`.
pub static LIVE_RESULT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)Passed:\s*(\d+),\s*Failed:\s*(\d+),\s*Skipped:\s*(\d+)").unwrap()
});

pub static TOTAL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Total:\s*(\d+)").unwrap());

pub static IN_PROGRESS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)In Progress:\s*(\d+)").unwrap());

pub static YET_TO_RUN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Yet to Run:\s*(\d+)").unwrap());

pub static PENDING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Pending:\s*(\d+)").unwrap());

pub static PASSED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Passed Count:\s*(\d+)").unwrap());

pub static FAILED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Failed Count:\s*(\d+)").unwrap());

pub static SKIPPED_COUNT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)Skipped Count:\s*(\d+)").unwrap());

/// Combined summary: `All 10 Passed 8 Failed 1 Flaky 0 Skipped 1`.
pub static FINAL_SUMMARY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i)All\s+(\d+)\s+Passed\s+(\d+)\s+Failed\s+(\d+)\s+Flaky\s+(\d+)\s+Skipped\s+(\d+)",
    )
    .unwrap()
});

/// Default completion sentinel, printed by the reporter's `onEnd` hook.
pub const DEFAULT_FINISHED_SENTINEL: &str = r"(?i)all tests finished";

/// First capture group of `re` in `line`, parsed as a count.
///
/// Values that overflow `u64` are treated as unmatched.
pub fn capture_count(re: &Regex, line: &str) -> Option<u64> {
    re.captures(line)
        .and_then(|caps| caps.get(1))
        .and_then(|m| m.as_str().parse().ok())
}

/// All numeric capture groups of `re` in `line`, or `None` if the line does
/// not match or any group overflows.
pub fn capture_counts<const N: usize>(re: &Regex, line: &str) -> Option<[u64; N]> {
    let caps = re.captures(line)?;
    let mut out = [0u64; N];
    for (i, slot) in out.iter_mut().enumerate() {
        *slot = caps.get(i + 1)?.as_str().parse().ok()?;
    }
    Some(out)
}
