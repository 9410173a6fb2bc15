//! Failure types raised by steps, handlers, and the engine

use crate::core::event::Event;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use thiserror::Error;

/// Error returned by a step body
#[derive(Debug, Error)]
pub enum StepError {
    /// Raised explicitly through `Sequencer::fail`
    #[error("{0}")]
    Failed(String),

    /// A nested `next` call failed and the step propagated it
    #[error(transparent)]
    Sequence(Box<SequencerError>),

    /// Any other error the step body produced
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl From<SequencerError> for StepError {
    fn from(err: SequencerError) -> Self {
        StepError::Sequence(Box::new(err))
    }
}

/// Error surfaced to whoever drove the sequencer
#[derive(Debug, Error)]
pub enum SequencerError {
    /// A step failed and no `error` handler was registered
    #[error("Step '{step}' failed: {source}")]
    Step {
        step: String,
        arguments: Vec<Value>,
        #[source]
        source: StepError,
    },

    /// An event handler failed while being notified
    #[error("Handler for '{event}' failed: {source}")]
    Handler {
        event: Event,
        #[source]
        source: anyhow::Error,
    },
}

impl SequencerError {
    /// Whether this error came from a step body rather than a handler
    pub fn is_step_failure(&self) -> bool {
        matches!(self, SequencerError::Step { .. })
    }
}

/// The payload handed to `error` handlers
///
/// Carries the failure message together with the arguments the failing
/// step was invoked with.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepFailure {
    /// Name of the step that failed
    pub step: String,

    /// Human-readable failure message
    pub message: String,

    /// Arguments the step was invoked with
    pub arguments: Vec<Value>,
}

impl StepFailure {
    pub fn new(step: impl Into<String>, message: impl Into<String>, arguments: Vec<Value>) -> Self {
        Self {
            step: step.into(),
            message: message.into(),
            arguments,
        }
    }

    /// Encode as the single argument passed to `error` handlers
    pub fn to_args(&self) -> Vec<Value> {
        vec![serde_json::to_value(self).unwrap_or(Value::Null)]
    }

    /// Decode from the arguments an `error` handler received
    pub fn from_args(args: &[Value]) -> Option<Self> {
        args.first()
            .and_then(|value| serde_json::from_value(value.clone()).ok())
    }
}
