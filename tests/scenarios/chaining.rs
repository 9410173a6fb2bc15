//! Test: Chaining - sequencers that start when another is done

use crate::helpers::*;
use serde_json::json;
use std::time::Duration;
use tasks::{Event, SequenceStatus};

#[test]
fn test_chained_sequencer_waits_for_done() {
    let (first, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    first.push(recorder.step("first.a")).push(recorder.step("first.b"));

    let second = first.then_start(vec![json!("handoff")]);
    second.push(recorder.step("second.a"));
    second.on(Event::Done, recorder.handler("second.done"));

    assert!(!second.has_started());
    first.start(vec![]).unwrap();

    assert_recorded(
        &recorder,
        &["first.a", "first.b", "second.a", r#"second.done["handoff"]"#],
    );
    assert_eq!(second.status(), SequenceStatus::Succeeded);
}

#[test]
fn test_chain_of_three() {
    let (first, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    first.push(recorder.step("1"));
    let second = first.then_start(vec![]);
    second.push(recorder.step("2"));
    let third = second.then_start(vec![]);
    third.push(recorder.step("3"));

    first.start(vec![]).unwrap();
    assert_recorded(&recorder, &["1", "2", "3"]);
    assert!(third.has_started());
}

#[test]
fn test_then_start_on_empty_queue_is_never_synchronous() {
    let (first, scheduler) = manual_sequencer(30.0);
    let recorder = Recorder::new();

    let second = first.then_start(vec![json!(5)]);
    second.on(Event::Done, recorder.handler("done"));

    assert!(!second.has_started());
    assert!(recorder.entries().is_empty());

    scheduler.run_ready();
    assert!(second.has_started());
    assert_recorded(&recorder, &["done[5]"]);
}

#[test]
fn test_chain_continues_after_handled_failure() {
    let (first, _) = manual_sequencer(30.0);
    let recorder = Recorder::new();
    first.push(|s, _| s.fail("first broke"));
    first.on(Event::Error, recorder.handler("error"));

    let second = first.then_start(vec![]);
    second.push(recorder.step("second"));

    first.start(vec![]).unwrap();

    let entries = recorder.entries();
    assert_eq!(entries.len(), 2, "got {:?}", entries);
    assert!(entries[0].starts_with("error"));
    assert_eq!(entries[1], "second");
}

#[test]
fn test_chain_continues_after_timeout() {
    let (first, scheduler) = manual_sequencer(0.03);
    let recorder = Recorder::new();
    first.push(recorder.stalled_step("stuck"));
    first.push(recorder.step("unreached"));
    let second = first.then_start(vec![]);
    second.push(recorder.step("second"));

    first.start(vec![]).unwrap();
    scheduler.advance(Duration::from_millis(30));

    assert_recorded(&recorder, &["stuck", "second"]);
    assert_eq!(first.status(), SequenceStatus::TimedOut);
    assert!(first.is_empty());
    assert_eq!(second.status(), SequenceStatus::Succeeded);
}

#[test]
fn test_chained_sequencer_inherits_timeout() {
    let (first, _) = manual_sequencer(0.25);
    let second = first.then_start(vec![]);
    assert_eq!(second.timeout_duration(), first.timeout_duration());
}

#[tokio::test]
async fn test_then_start_on_real_scheduler() {
    let (first, scheduler) = local_sequencer(30.0);
    scheduler.run_until(async {
        let recorder = Recorder::new();
        let second = first.then_start(vec![json!(true)]);
        second.on(Event::Done, recorder.handler("done"));

        assert!(recorder.entries().is_empty());
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_recorded(&recorder, &["done[true]"]);
    })
    .await;
}
