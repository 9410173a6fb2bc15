//! Deadline supervision between consecutive `next` calls

use crate::execution::scheduler::{Scheduler, TimerHandle};
use serde_json::Value;
use std::cell::{Cell, RefCell};
use std::time::Duration;

/// Default time a step may take before the sequence times out
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Keeps at most one deadline armed for a sequencer
///
/// Each arm bumps a generation counter; a deadline only counts as fired if
/// its generation is still current when the scheduler runs it.
#[derive(Debug)]
pub struct TimeoutSupervisor {
    duration: Cell<Duration>,
    armed: RefCell<Option<TimerHandle>>,
    generation: Cell<u64>,
    args: RefCell<Vec<Value>>,
}

impl TimeoutSupervisor {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration: Cell::new(duration),
            armed: RefCell::new(None),
            generation: Cell::new(0),
            args: RefCell::new(Vec::new()),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration.get()
    }

    /// Takes effect on the next arm
    pub fn set_duration(&self, duration: Duration) {
        self.duration.set(duration);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.borrow().is_some()
    }

    /// Arguments of the transition the deadline was armed for
    pub fn args(&self) -> Vec<Value> {
        self.args.borrow().clone()
    }

    /// Arm a fresh deadline for a transition carrying `args`
    ///
    /// Replaces any deadline already armed. `fire` receives the generation
    /// to hand back to [`claim`](Self::claim).
    pub fn arm<F>(&self, scheduler: &dyn Scheduler, args: Vec<Value>, fire: F) -> u64
    where
        F: FnOnce(u64) + 'static,
    {
        *self.args.borrow_mut() = args;
        self.rearm(scheduler, fire)
    }

    /// Re-arm with the current duration, keeping the stored arguments
    pub fn rearm<F>(&self, scheduler: &dyn Scheduler, fire: F) -> u64
    where
        F: FnOnce(u64) + 'static,
    {
        self.disarm();
        let generation = self.generation.get() + 1;
        self.generation.set(generation);
        let handle = scheduler.schedule(self.duration(), Box::new(move || fire(generation)));
        *self.armed.borrow_mut() = Some(handle);
        generation
    }

    /// Cancel the pending deadline, if any; returns whether one was armed
    pub fn disarm(&self) -> bool {
        let handle = self.armed.borrow_mut().take();
        match handle {
            Some(handle) => {
                handle.cancel();
                true
            }
            None => false,
        }
    }

    /// Accept a fired deadline if it is still the current one
    ///
    /// Returns the arguments to report with the timeout.
    pub fn claim(&self, generation: u64) -> Option<Vec<Value>> {
        if generation != self.generation.get() || !self.is_armed() {
            return None;
        }
        self.armed.borrow_mut().take();
        Some(self.args())
    }
}

impl Default for TimeoutSupervisor {
    fn default() -> Self {
        Self::new(DEFAULT_TIMEOUT)
    }
}
