//! Turning a script's step actions into runnable steps

use crate::core::config::{ScriptConfig, ScriptStep, StepAction};
use crate::core::step::Step;
use crate::execution::{Scheduler, Sequencer};
use std::rc::Rc;
use std::time::Duration;
use tracing::info;

impl ScriptConfig {
    /// Build a sequencer with every script step queued, not yet started
    pub fn to_sequencer(&self, scheduler: Rc<dyn Scheduler>) -> Sequencer {
        self.to_sequencer_with(scheduler, |_, step| step)
    }

    /// Like [`to_sequencer`](Self::to_sequencer), passing each step and its
    /// index through `wrap` before it is queued
    pub fn to_sequencer_with<W>(&self, scheduler: Rc<dyn Scheduler>, wrap: W) -> Sequencer
    where
        W: Fn(usize, Step) -> Step,
    {
        let sequencer = Sequencer::with_scheduler(self.sequencer_config(), scheduler);
        for (index, step) in self.steps.iter().enumerate() {
            sequencer.push_step(wrap(index, step.to_step()));
        }
        sequencer
    }
}

impl ScriptStep {
    /// The step that performs this action
    pub fn to_step(&self) -> Step {
        let id = self.id.clone();
        match self.action.clone() {
            StepAction::Pass => Step::named(id, |seq, args| {
                seq.next(args.to_vec())?;
                Ok(())
            }),
            StepAction::SetArgs { args: replacement } => Step::named(id, move |seq, _| {
                seq.next(replacement.clone())?;
                Ok(())
            }),
            StepAction::Emit { event } => Step::named(id, move |seq, args| {
                seq.notify(event.as_str(), args)?;
                seq.next(args.to_vec())?;
                Ok(())
            }),
            StepAction::Delay { ms } => Step::named(id, move |seq, args| {
                seq.next_after(Duration::from_millis(ms), args.to_vec());
                Ok(())
            }),
            StepAction::Fail { message } => {
                Step::named(id, move |seq, _| seq.fail(message.clone()))
            }
            StepAction::Skip { count } => Step::named(id, move |seq, args| {
                seq.skip(count);
                seq.next(args.to_vec())?;
                Ok(())
            }),
            StepAction::SkipAll => Step::named(id, |seq, args| {
                seq.skip_all(args.to_vec())?;
                Ok(())
            }),
            StepAction::ResetTimeout => Step::named(id, |seq, args| {
                seq.reset_timeout();
                seq.next(args.to_vec())?;
                Ok(())
            }),
            StepAction::Stall => Step::named(id.clone(), move |_, _| {
                info!("Step '{}' is waiting for a continuation that never comes", id);
                Ok(())
            }),
        }
    }
}
