//! Test utility functions for sequencer scenarios

#![allow(dead_code)]

use serde_json::Value;
use std::cell::RefCell;
use std::rc::Rc;
use tasks::{Handler, LocalScheduler, ManualScheduler, Sequencer, SequencerConfig, StepResult};

/// Sequencer on a virtual clock with the given timeout
pub fn manual_sequencer(timeout_secs: f64) -> (Sequencer, ManualScheduler) {
    let scheduler = ManualScheduler::new();
    let sequencer = Sequencer::with_scheduler(
        SequencerConfig::new().with_timeout_secs(timeout_secs),
        Rc::new(scheduler.clone()),
    );
    (sequencer, scheduler)
}

/// Sequencer on real tokio timers; drive it with `LocalScheduler::run_until`
pub fn local_sequencer(timeout_secs: f64) -> (Sequencer, LocalScheduler) {
    let scheduler = LocalScheduler::new();
    let sequencer = Sequencer::with_scheduler(
        SequencerConfig::new().with_timeout_secs(timeout_secs),
        Rc::new(scheduler.clone()),
    );
    (sequencer, scheduler)
}

/// Records what steps and handlers saw, in order
#[derive(Clone, Default)]
pub struct Recorder {
    entries: Rc<RefCell<Vec<String>>>,
}

impl Recorder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&self, entry: impl Into<String>) {
        self.entries.borrow_mut().push(entry.into());
    }

    pub fn entries(&self) -> Vec<String> {
        self.entries.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.borrow().len()
    }

    /// A step that records `label` and continues with the same arguments
    pub fn step(&self, label: &'static str) -> impl Fn(&Sequencer, &[Value]) -> StepResult + 'static {
        let recorder = self.clone();
        move |seq, args| {
            recorder.push(label);
            seq.next(args.to_vec())?;
            Ok(())
        }
    }

    /// A step that records `label` and never continues
    pub fn stalled_step(&self, label: &'static str) -> impl Fn(&Sequencer, &[Value]) -> StepResult + 'static {
        let recorder = self.clone();
        move |_, _| {
            recorder.push(label);
            Ok(())
        }
    }

    /// A handler that records `label` followed by the arguments as JSON
    pub fn handler(&self, label: &'static str) -> Handler {
        let recorder = self.clone();
        Handler::new(move |_, args| {
            recorder.push(format!("{}{}", label, Value::from(args.to_vec())));
            Ok(())
        })
    }
}

/// Assert the recorded entries match exactly
pub fn assert_recorded(recorder: &Recorder, expected: &[&str]) {
    let actual = recorder.entries();
    assert_eq!(
        actual, expected,
        "Recorded entries differ.\n  expected: {:?}\n  actual:   {:?}",
        expected, actual
    );
}
