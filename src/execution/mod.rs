//! Sequencer execution engine

pub mod extension;
pub mod scheduler;
pub mod sequencer;
pub mod timeout;

pub use extension::{Extended, Extension};
pub use scheduler::{LocalScheduler, ManualScheduler, Scheduler, Task, TimerHandle};
pub use sequencer::{Args, Sequencer};
pub use timeout::{TimeoutSupervisor, DEFAULT_TIMEOUT};
