// tests/run_slot.rs

use smokerun::errors::SmokerunError;
use smokerun::supervisor::{RunOutcome, RunSlot};
use smokerun::types::{RunExit, RunState};

fn exited(code: i32, wrote_stderr: bool) -> RunOutcome {
    RunOutcome::Exited {
        exit: RunExit::from_code(code),
        wrote_stderr,
    }
}

#[test]
fn begin_claims_the_slot_once() {
    let mut slot = RunSlot::new();
    assert_eq!(slot.state(), RunState::Idle);
    assert_eq!(slot.run_id(), 0);

    assert_eq!(slot.begin().unwrap(), 1);
    assert_eq!(slot.state(), RunState::Running);
    assert!(matches!(slot.begin(), Err(SmokerunError::AlreadyRunning)));
}

#[test]
fn stop_requires_a_running_run() {
    let mut slot = RunSlot::new();
    assert!(matches!(slot.request_stop(), Err(SmokerunError::NotRunning)));

    slot.begin().unwrap();
    assert_eq!(slot.request_stop().unwrap(), 1);
    assert_eq!(slot.state(), RunState::Stopping);
    assert!(slot.stop_requested());

    // Second stop while already stopping is rejected.
    assert!(matches!(slot.request_stop(), Err(SmokerunError::NotRunning)));
    // And so is a new start.
    assert!(matches!(slot.begin(), Err(SmokerunError::AlreadyRunning)));
}

#[test]
fn clean_exit_finishes() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    assert_eq!(slot.finish(id, exited(0, false)), RunState::Finished);
}

#[test]
fn failing_tests_without_stderr_still_finish() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    assert_eq!(slot.finish(id, exited(1, false)), RunState::Finished);
}

#[test]
fn nonzero_exit_with_stderr_fails() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    assert_eq!(slot.finish(id, exited(1, true)), RunState::Failed);
}

#[test]
fn stderr_with_clean_exit_finishes() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    assert_eq!(slot.finish(id, exited(0, true)), RunState::Finished);
}

#[test]
fn stopped_run_finishes_even_when_killed() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    slot.request_stop().unwrap();
    let outcome = RunOutcome::Exited {
        exit: RunExit::signalled(),
        wrote_stderr: true,
    };
    assert_eq!(slot.finish(id, outcome), RunState::Finished);
}

#[test]
fn setup_stream_and_timeout_failures_fail() {
    for outcome in [
        RunOutcome::SetupFailed,
        RunOutcome::StreamFailed,
        RunOutcome::TimedOut,
    ] {
        let mut slot = RunSlot::new();
        let id = slot.begin().unwrap();
        assert_eq!(slot.finish(id, outcome), RunState::Failed, "{outcome:?}");
    }
}

#[test]
fn cancelled_before_spawn_finishes() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    slot.request_stop().unwrap();
    assert_eq!(
        slot.finish(id, RunOutcome::CancelledBeforeSpawn),
        RunState::Finished
    );
}

#[test]
fn stale_run_ids_are_ignored() {
    let mut slot = RunSlot::new();
    let first = slot.begin().unwrap();
    slot.finish(first, exited(0, false));

    let second = slot.begin().unwrap();
    assert_eq!(second, first + 1);

    // A late report about the first run must not settle the second one.
    assert_eq!(slot.finish(first, RunOutcome::SetupFailed), RunState::Running);
    assert!(!slot.mark_completed(first));
    assert_eq!(slot.state(), RunState::Running);
}

#[test]
fn completion_is_marked_once_and_reset_by_begin() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    assert!(slot.mark_completed(id));
    assert!(!slot.mark_completed(id));
    assert!(slot.completed());

    slot.finish(id, exited(0, false));
    assert!(slot.completed());
    assert!(!slot.mark_completed(id));

    slot.begin().unwrap();
    assert!(!slot.completed());
}

#[test]
fn restart_allowed_after_failure() {
    let mut slot = RunSlot::new();
    let id = slot.begin().unwrap();
    slot.finish(id, RunOutcome::SetupFailed);
    assert_eq!(slot.state(), RunState::Failed);
    assert!(slot.begin().is_ok());
}
