//! tasks - a single-threaded sequential task runner
//!
//! Steps are queued on a [`Sequencer`] and run one at a time. Each step
//! decides when to continue, may rearrange the remaining queue, and the
//! outcome is reported through `success`, `error`, `timeout`, and `done`
//! events.

pub mod cli;
pub mod core;
pub mod execution;

// Re-export commonly used types
pub use crate::core::{Event, Handler, SequenceStatus, SequencerError, SequencerState, Step, StepError, StepFailure, StepResult};
pub use crate::core::config::{ScriptConfig, SequencerConfig};
pub use crate::execution::{Args, Extended, Extension, LocalScheduler, ManualScheduler, Scheduler, Sequencer};
