use proptest::prelude::*;
use regex::Regex;
use smokerun::parser::patterns::{
    capture_count, capture_counts, FAILED_COUNT, FINAL_SUMMARY, IN_PROGRESS, LIVE_RESULT,
    PASSED_COUNT, PENDING, SKIPPED_COUNT, TOTAL, YET_TO_RUN,
};
use smokerun::{parse_output, ProgressParser, ProgressSnapshot};

// Counts are mostly small, with the occasional value at the top of u64.
fn count_strategy() -> impl Strategy<Value = u64> {
    prop_oneof![
        9 => 0u64..50,
        1 => (u64::MAX - 3)..=u64::MAX,
    ]
}

// One line of runner output: a marker with random counts, or noise.
fn line_strategy() -> impl Strategy<Value = String> {
    let n = count_strategy;
    prop_oneof![
        (n(), n(), n())
            .prop_map(|(p, f, s)| format!("RESULT# Passed: {p}, Failed: {f}, Skipped: {s}")),
        n().prop_map(|t| format!("Total: {t}")),
        n().prop_map(|r| format!("In Progress: {r}")),
        n().prop_map(|y| format!("Yet to Run: {y}")),
        n().prop_map(|p| format!("Pending: {p}")),
        n().prop_map(|p| format!("Passed Count: {p}")),
        n().prop_map(|f| format!("Failed Count: {f}")),
        n().prop_map(|s| format!("Skipped Count: {s}")),
        (n(), n(), n(), n(), n()).prop_map(|(t, p, f, k, s)| {
            format!("All {t} Passed {p} Failed {f} Flaky {k} Skipped {s}")
        }),
        "[a-zA-Z0-9 :,#.]{0,40}",
    ]
}

fn last_count(lines: &[String], re: &Regex) -> Option<u64> {
    lines.iter().filter_map(|l| capture_count(re, l)).last()
}

/// Derives the snapshot from the whole buffer at once, rule by rule:
/// live batches summed, first non-zero `Total:`, last structural values,
/// final counts replacing everything when they come after the last live
/// batch, and `yet_to_run` clamped at zero.
fn whole_buffer_snapshot(lines: &[String]) -> ProgressSnapshot {
    let live: Vec<(usize, [u64; 3])> = lines
        .iter()
        .enumerate()
        .filter_map(|(i, l)| capture_counts::<3>(&LIVE_RESULT, l).map(|c| (i, c)))
        .collect();

    let total = lines
        .iter()
        .filter_map(|l| capture_count(&TOTAL, l))
        .find(|&n| n > 0)
        .unwrap_or(0);
    let running = last_count(lines, &IN_PROGRESS);
    let yet_to_run = last_count(lines, &YET_TO_RUN);
    let pending = last_count(lines, &PENDING);

    let summary = |l: &String| capture_counts::<5>(&FINAL_SUMMARY, l);
    let final_field = |idx: usize, re: &Regex| {
        lines
            .iter()
            .filter_map(|l| summary(l).map(|s| s[idx]).or_else(|| capture_count(re, l)))
            .last()
            .unwrap_or(0)
    };
    let final_passed = final_field(1, &PASSED_COUNT);
    let final_failed = final_field(2, &FAILED_COUNT);
    let final_skipped = final_field(4, &SKIPPED_COUNT);
    let summary_total = lines.iter().filter_map(summary).map(|s| s[0]).last();

    let last_final = lines.iter().rposition(|l| {
        summary(l).is_some()
            || capture_count(&PASSED_COUNT, l).is_some()
            || capture_count(&FAILED_COUNT, l).is_some()
            || capture_count(&SKIPPED_COUNT, l).is_some()
    });
    let last_live = live.last().map(|(i, _)| *i);

    let final_after_live = match (last_final, last_live) {
        (Some(f), Some(l)) => f >= l,
        (Some(_), None) => true,
        (None, _) => false,
    };
    let final_positive = final_passed > 0 || final_failed > 0 || final_skipped > 0;

    if final_positive && final_after_live {
        let total = summary_total.filter(|&n| n > 0).unwrap_or(total);
        let done = final_passed
            .saturating_add(final_failed)
            .saturating_add(final_skipped);
        return ProgressSnapshot {
            passed: final_passed,
            failed: final_failed,
            skipped: final_skipped,
            pending: final_skipped,
            running: 0,
            total,
            yet_to_run: total.saturating_sub(done),
        };
    }

    if !live.is_empty() {
        let sum = |k: usize| live.iter().fold(0u64, |acc, (_, c)| acc.saturating_add(c[k]));
        return ProgressSnapshot {
            passed: sum(0),
            failed: sum(1),
            skipped: sum(2),
            pending: sum(2),
            running: running.unwrap_or(0),
            total,
            yet_to_run: yet_to_run.unwrap_or(0),
        };
    }

    let pending = pending.unwrap_or(0);
    let running = running.unwrap_or(0);
    ProgressSnapshot {
        passed: 0,
        failed: 0,
        skipped: 0,
        pending,
        running,
        total,
        yet_to_run: yet_to_run
            .unwrap_or_else(|| total.saturating_sub(pending.saturating_add(running))),
    }
}

proptest! {
    #[test]
    fn incremental_parser_matches_whole_buffer_rules(
        lines in proptest::collection::vec(line_strategy(), 0..40)
    ) {
        let mut parser = ProgressParser::new();
        for (i, line) in lines.iter().enumerate() {
            parser.feed_line(line);
            prop_assert_eq!(parser.snapshot(), whole_buffer_snapshot(&lines[..=i]));
        }
        prop_assert_eq!(parse_output(&lines.join("\n")), whole_buffer_snapshot(&lines));
    }

    #[test]
    fn trailing_combined_summary_is_authoritative(
        lines in proptest::collection::vec(line_strategy(), 0..20),
        (t, p, f, s) in (1u64..100, 0u64..50, 0u64..50, 1u64..50),
    ) {
        let mut out = lines.join("\n");
        out.push_str(&format!("\nAll {t} Passed {p} Failed {f} Flaky 0 Skipped {s}"));

        let snap = parse_output(&out);
        prop_assert_eq!(snap.total, t);
        prop_assert_eq!((snap.passed, snap.failed, snap.pending), (p, f, s));
        prop_assert_eq!(snap.running, 0);
        prop_assert_eq!(snap.yet_to_run, t.saturating_sub(p + f + s));
    }

    #[test]
    fn arbitrary_text_never_panics(
        text in "\\PC{0,200}",
        big in (u64::MAX - 3)..=u64::MAX,
    ) {
        let out = format!("Total: 1\n{text}\nPassed: {big}, Failed: {big}, Skipped: {big}\n");
        let snap = parse_output(&out);
        prop_assert!(snap.percent() <= 100);
        prop_assert!(snap.done() >= big);
        prop_assert!(!snap.to_string().is_empty());
    }
}
