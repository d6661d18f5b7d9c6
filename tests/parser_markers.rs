// tests/parser_markers.rs

use smokerun::parser::patterns::{capture_count, capture_counts, FINAL_SUMMARY, TOTAL};
use smokerun::{parse_output, ProgressParser, ProgressSnapshot};

fn snap(
    passed: u64,
    failed: u64,
    skipped: u64,
    running: u64,
    total: u64,
    yet_to_run: u64,
) -> ProgressSnapshot {
    ProgressSnapshot {
        passed,
        failed,
        skipped,
        pending: skipped,
        running,
        total,
        yet_to_run,
    }
}

#[test]
fn single_live_update() {
    let p = parse_output("Passed: 3, Failed: 1, Skipped: 2");
    assert_eq!(p, snap(3, 1, 2, 0, 0, 0));
}

#[test]
fn live_updates_are_summed() {
    let p = parse_output("Passed: 3, Failed: 1, Skipped: 2\nPassed: 2, Failed: 0, Skipped: 1");
    assert_eq!(p.passed, 5);
    assert_eq!(p.failed, 1);
    assert_eq!(p.pending, 3);
}

#[test]
fn structural_total_survives_live_update() {
    let p = parse_output("Total: 10\nPassed: 1, Failed: 0, Skipped: 0");
    assert_eq!(p.total, 10);
    assert_eq!(p.passed, 1);
    assert_eq!(p.yet_to_run, 0);
}

#[test]
fn combined_summary_overrides_live_and_structural() {
    let out = "Total: 12\n\
               In Progress: 3\n\
               Passed: 3, Failed: 0, Skipped: 0\n\
               All 10 Passed 8 Failed 1 Flaky 0 Skipped 1";
    assert_eq!(parse_output(out), snap(8, 1, 1, 0, 10, 0));
}

#[test]
fn separate_count_lines_use_structural_total() {
    let out = "Total: 20\n\
               Passed: 5, Failed: 0, Skipped: 0\n\
               Passed Count: 15\n\
               Failed Count: 2\n\
               Skipped Count: 1";
    assert_eq!(parse_output(out), snap(15, 2, 1, 0, 20, 2));
}

#[test]
fn live_update_after_final_summary_brings_back_live_sums() {
    let out = "All 4 Passed 4 Failed 0 Flaky 0 Skipped 0\n\
               Passed: 1, Failed: 0, Skipped: 0";
    let p = parse_output(out);
    assert_eq!(p.passed, 1);
    assert_eq!(p.total, 0);
}

#[test]
fn all_zero_final_summary_is_ignored() {
    let out = "Passed: 2, Failed: 0, Skipped: 0\n\
               All 0 Passed 0 Failed 0 Flaky 0 Skipped 0";
    let p = parse_output(out);
    assert_eq!(p.passed, 2);
}

#[test]
fn structural_only_derives_yet_to_run() {
    let p = parse_output("Total: 10\nIn Progress: 2\nPending: 3");
    assert_eq!(p.total, 10);
    assert_eq!(p.running, 2);
    assert_eq!(p.pending, 3);
    assert_eq!(p.skipped, 0);
    assert_eq!(p.yet_to_run, 5);
}

#[test]
fn explicit_yet_to_run_wins_over_derived() {
    let p = parse_output("Total: 10\nIn Progress: 2\nYet to Run: 4");
    assert_eq!(p.yet_to_run, 4);
}

#[test]
fn first_non_zero_total_wins() {
    let p = parse_output("Total: 0\nTotal: 7\nTotal: 9");
    assert_eq!(p.total, 7);
}

#[test]
fn later_structural_values_overwrite_earlier_ones() {
    let p = parse_output("Total: 10\nIn Progress: 4\nIn Progress: 1");
    assert_eq!(p.running, 1);
    assert_eq!(p.yet_to_run, 9);
}

#[test]
fn markers_are_case_insensitive_and_tolerate_prefixes() {
    let p = parse_output("RESULT# passed: 1, failed: 2, skipped: 0");
    assert_eq!(p.passed, 1);
    assert_eq!(p.failed, 2);

    let p = parse_output("[12:00:01] TOTAL: 6");
    assert_eq!(p.total, 6);
}

#[test]
fn yet_to_run_saturates_at_zero() {
    let p = parse_output("Total: 3\nIn Progress: 5");
    assert_eq!(p.yet_to_run, 0);

    let p = parse_output("Total: 2\nPassed Count: 5");
    assert_eq!(p.total, 2);
    assert_eq!(p.yet_to_run, 0);
}

#[test]
fn unmatched_and_empty_output_is_zero() {
    assert_eq!(parse_output(""), ProgressSnapshot::default());
    assert_eq!(
        parse_output("Running 10 tests using 4 workers\n  ok 1 login.spec.ts\n"),
        ProgressSnapshot::default()
    );
}

#[test]
fn overflowing_counts_are_treated_as_unmatched() {
    let p = parse_output("Passed: 99999999999999999999999, Failed: 0, Skipped: 0");
    assert_eq!(p, ProgressSnapshot::default());
}

#[test]
fn incremental_snapshots_track_the_full_parse() {
    let lines = [
        "Running 4 tests using 2 workers",
        "Total: 4",
        "In Progress: 2",
        "RESULT# Passed: 1, Failed: 0, Skipped: 0",
        "RESULT# Passed: 1, Failed: 1, Skipped: 0",
        "All 4 Passed 2 Failed 1 Flaky 0 Skipped 1",
        "All tests finished.",
    ];

    let mut parser = ProgressParser::new();
    for (i, line) in lines.iter().enumerate() {
        parser.feed_line(line);
        let so_far = lines[..=i].join("\n");
        assert_eq!(parser.snapshot(), parse_output(&so_far), "after line {i}");
    }
    assert_eq!(parser.lines_seen(), lines.len() as u64);
    assert_eq!(parser.snapshot().percent(), 100);
}

#[test]
fn capture_helpers() {
    assert_eq!(capture_count(&TOTAL, "Total: 42"), Some(42));
    assert_eq!(capture_count(&TOTAL, "Totals"), None);
    assert_eq!(
        capture_counts::<5>(&FINAL_SUMMARY, "All 10 Passed 8 Failed 1 Flaky 0 Skipped 1"),
        Some([10, 8, 1, 0, 1])
    );
}

#[test]
fn snapshot_display_and_percent() {
    let p = snap(8, 1, 1, 0, 10, 0);
    assert_eq!(p.done(), 10);
    assert_eq!(p.percent(), 100);
    assert_eq!(
        p.to_string(),
        "total=10 passed=8 failed=1 skipped=1 pending=1 running=0 yet_to_run=0"
    );
    assert_eq!(ProgressSnapshot::default().percent(), 0);

    // Structural `Pending:` is not a skipped count.
    let structural = parse_output("Total: 10\nPending: 3");
    assert!(structural.to_string().contains("skipped=0 pending=3"));
}

#[test]
fn huge_counts_do_not_overflow_percent() {
    let p = parse_output("Total: 1\nPassed: 18446744073709551615, Failed: 1, Skipped: 0");
    assert_eq!(p.passed, u64::MAX);
    assert_eq!(p.done(), u64::MAX);
    assert_eq!(p.percent(), 100);
}
