//! Step domain model

use crate::core::error::StepError;
use crate::execution::Sequencer;
use serde_json::Value;
use std::fmt;
use std::rc::Rc;

/// Result returned by every step body
pub type StepResult = Result<(), StepError>;

type StepFn = dyn Fn(&Sequencer, &[Value]) -> StepResult;

/// A single unit of deferred work in a sequencer's queue
///
/// Steps are cheap to clone; clones share the same body. A step receives
/// the sequencer running it and the arguments of the current transition,
/// and is responsible for calling `next` (now or later) to continue.
#[derive(Clone)]
pub struct Step {
    /// Name used in logs and failure reports
    pub name: String,

    body: Rc<StepFn>,
}

impl Step {
    /// Create an anonymous step
    pub fn new<F>(body: F) -> Self
    where
        F: Fn(&Sequencer, &[Value]) -> StepResult + 'static,
    {
        Self::named("anonymous", body)
    }

    /// Create a step with a name for logging
    pub fn named<F>(name: impl Into<String>, body: F) -> Self
    where
        F: Fn(&Sequencer, &[Value]) -> StepResult + 'static,
    {
        Self {
            name: name.into(),
            body: Rc::new(body),
        }
    }

    /// Invoke the step body
    pub fn run(&self, sequencer: &Sequencer, args: &[Value]) -> StepResult {
        (self.body)(sequencer, args)
    }
}

impl fmt::Debug for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step").field("name", &self.name).finish_non_exhaustive()
    }
}
