//! Test: Extension - sequencers carrying their own state and operations

use crate::helpers::*;
use serde_json::json;
use std::rc::Rc;
use tasks::{Event, Extended, Extension, Handler, ManualScheduler, Sequencer, SequencerConfig};

/// Collects the results produced by each step
#[derive(Default)]
struct Collector {
    results: Vec<i64>,
    handlers_before_init: usize,
}

impl Extension for Collector {
    fn initialize(&mut self, sequencer: &Sequencer) -> anyhow::Result<()> {
        self.handlers_before_init = usize::from(sequencer.has_handlers(Event::Done));
        sequencer.on(
            Event::Success,
            Handler::new(|seq, args| {
                if let (Some(collector), Some(total)) =
                    (seq.extension::<Collector>(), args.first().and_then(|v| v.as_i64()))
                {
                    collector.borrow_mut().results.push(total);
                }
                Ok(())
            }),
        );
        Ok(())
    }
}

/// Operations an extended sequencer adds on top of the base ones
trait Accumulate {
    fn add(&self, amount: i64) -> &Self;
}

impl Accumulate for Extended<Collector> {
    fn add(&self, amount: i64) -> &Self {
        self.push(move |s, args| {
            let total = args.first().and_then(|v| v.as_i64()).unwrap_or(0) + amount;
            if let Some(collector) = s.extension::<Collector>() {
                collector.borrow_mut().results.push(total);
            }
            s.next(vec![json!(total)])?;
            Ok(())
        });
        self
    }
}

fn collector() -> Extended<Collector> {
    Extended::with_scheduler(
        SequencerConfig::new(),
        Rc::new(ManualScheduler::new()),
        Collector::default(),
    )
    .unwrap()
}

#[test]
fn test_extended_sequencer_runs_added_operations() {
    let seq = collector();
    seq.add(1).add(2).add(3);

    seq.start(vec![json!(0)]).unwrap();

    // Running totals, then the final total seen by the success handler
    assert_eq!(seq.ext().results, vec![1, 3, 6, 6]);
}

#[test]
fn test_base_operations_are_inherited() {
    let seq = collector();
    let recorder = Recorder::new();
    seq.on(Event::Done, recorder.handler("done"));
    seq.add(10);
    seq.unshift(recorder.step("setup"));
    assert_eq!(seq.len(), 2);

    seq.start(vec![json!(5)]).unwrap();
    assert_recorded(&recorder, &["setup", "done[15]"]);
}

#[test]
fn test_extension_initialized_on_fresh_base() {
    let seq = collector();
    assert_eq!(seq.ext().handlers_before_init, 0);
    assert!(seq.has_handlers(Event::Success));
    assert!(seq.is_empty());
}

#[test]
fn test_clones_share_extension_state() {
    let seq = collector();
    let clone = seq.clone();
    clone.ext_mut().results.push(99);
    assert_eq!(seq.ext().results, vec![99]);
    assert_eq!(seq.id(), clone.sequencer().id());
}
