//! Test: Failure Handling - fail-fast default and recovered aborts

use crate::helpers::*;
use serde_json::json;
use tasks::{Event, Handler, SequenceStatus, SequencerError, Step, StepError, StepFailure};

/// Without an error handler the failure escapes `start`
#[test]
fn test_failure_without_handler_propagates() {
    let (seq, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    seq.on(Event::Done, recorder.handler("done"));
    seq.push_step(Step::named("risky", |s, _| s.fail("oops")));
    seq.push_step(Step::named("after", recorder.step("after")));

    let err = seq.start(vec![json!(1)]).unwrap_err();

    assert!(err.is_step_failure());
    assert_eq!(err.to_string(), "Step 'risky' failed: oops");
    assert!(seq.has_failed());
    assert_eq!(seq.step_names(), vec!["after"], "queue must not be cleared");
    assert!(recorder.entries().is_empty(), "no events fire on fail-fast");
}

/// With an error handler the sequence aborts into error + done
#[test]
fn test_failure_with_handler_aborts() {
    let (seq, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    seq.push_step(Step::named("risky", |_, _| {
        Err(StepError::Other(anyhow::anyhow!("disk full")))
    }));
    seq.push_step(Step::named("never", recorder.step("never")));

    let seen = recorder.clone();
    seq.on(
        Event::Error,
        Handler::new(move |_, args| {
            let failure = StepFailure::from_args(args).expect("error carries a failure");
            seen.push(format!("error {} {}", failure.message, serde_json::Value::from(failure.arguments)));
            Ok(())
        }),
    );
    seq.on(Event::Done, recorder.handler("done"));
    seq.on(Event::Success, recorder.handler("success"));

    seq.start(vec![json!(1)]).unwrap();

    assert_recorded(&recorder, &["error disk full [1]", "done[1]"]);
    assert!(seq.has_failed());
    assert!(seq.is_empty());
    assert_eq!(seq.status(), SequenceStatus::Failed);
}

/// `fail` takes the same path as any other step error
#[test]
fn test_fail_matches_returned_error() {
    let (via_fail, _) = manual_sequencer(30.0);
    let (via_err, _) = manual_sequencer(30.0);
    let fail_log = Recorder::new();
    let err_log = Recorder::new();

    via_fail.push(|s, _| s.fail("same"));
    via_err.push(|_, _| Err(StepError::Failed("same".to_string())));
    via_fail.on(Event::Error, fail_log.handler("error"));
    via_err.on(Event::Error, err_log.handler("error"));

    via_fail.start(vec![]).unwrap();
    via_err.start(vec![]).unwrap();
    assert_eq!(fail_log.entries(), err_log.entries());
}

/// A failure deep in a synchronous chain is handled once
#[test]
fn test_nested_failure_handled_once() {
    let (seq, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    seq.push(recorder.step("a"));
    seq.push(recorder.step("b"));
    seq.push_step(Step::named("c", |s, _| s.fail("c broke")));
    seq.push(recorder.step("d"));
    seq.on(Event::Error, recorder.handler("error"));
    seq.on(Event::Done, recorder.handler("done"));

    seq.start(vec![]).unwrap();

    let entries = recorder.entries();
    assert_eq!(entries.len(), 4, "got {:?}", entries);
    assert_eq!(entries[0], "a");
    assert_eq!(entries[1], "b");
    assert!(entries[2].starts_with("error"));
    assert!(entries[2].contains("c broke"));
    assert_eq!(entries[3], "done[]");
}

/// Handler failures surface to whoever notified, not as step failures
#[test]
fn test_handler_failure_surfaces_to_caller() {
    let (seq, _) = manual_sequencer(30.0);
    seq.on(Event::Done, Handler::new(|_, _| anyhow::bail!("listener crashed")));
    seq.push(|s, _| {
        s.next(vec![])?;
        Ok(())
    });

    let err = seq.start(vec![]).unwrap_err();
    match err {
        SequencerError::Handler { event, .. } => assert_eq!(event, Event::Done),
        other => panic!("Expected handler failure, got {:?}", other),
    }
}

/// Removing the last error handler restores fail-fast
#[test]
fn test_off_restores_fail_fast() {
    let (seq, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    let handler = recorder.handler("error");
    seq.on(Event::Error, handler.clone());
    seq.off(Event::Error, &handler);
    seq.push(|s, _| s.fail("loud"));

    assert!(seq.start(vec![]).is_err());
    assert!(recorder.entries().is_empty());
}
