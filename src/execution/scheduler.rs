//! Deferred-callback scheduling for timeouts and chained starts
//!
//! Everything a sequencer does later (timeout deadlines, starting a chained
//! sequencer) goes through a [`Scheduler`]. Tasks never run inline from
//! `schedule`, even with a zero delay.

use std::cell::{Cell, RefCell};
use std::collections::BTreeMap;
use std::fmt;
use std::future::Future;
use std::rc::{Rc, Weak};
use std::time::Duration;
use tokio::task::LocalSet;
use tracing::debug;

/// A deferred unit of work
pub type Task = Box<dyn FnOnce()>;

/// Cancels a scheduled task that has not run yet
///
/// Dropping the handle leaves the task scheduled.
pub struct TimerHandle {
    cancel: Option<Box<dyn FnOnce()>>,
}

impl TimerHandle {
    pub fn new<F: FnOnce() + 'static>(cancel: F) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    pub fn cancel(mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
        }
    }
}

impl fmt::Debug for TimerHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TimerHandle")
            .field("cancellable", &self.cancel.is_some())
            .finish()
    }
}

/// Cooperative deferred-callback facility shared by sequencers
pub trait Scheduler {
    /// Run `task` once after `delay`, on a later turn of the scheduler
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle;
}

/// Scheduler backed by a tokio `LocalSet` it owns
///
/// Scheduling never needs a runtime: tasks wait in the set until it is driven
/// through [`run_until`](Self::run_until) on a current-thread runtime. Clones
/// share the same set.
#[derive(Debug, Clone, Default)]
pub struct LocalScheduler {
    tasks: Rc<LocalSet>,
}

impl LocalScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Drive `future` to completion, running scheduled tasks alongside it
    pub async fn run_until<F: Future>(&self, future: F) -> F::Output {
        self.tasks.run_until(future).await
    }
}

impl Scheduler for LocalScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let join = self.tasks.spawn_local(async move {
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            task();
        });
        let abort = join.abort_handle();
        TimerHandle::new(move || abort.abort())
    }
}

type Key = (Duration, u64);

#[derive(Default)]
struct ManualQueue {
    now: Cell<Duration>,
    seq: Cell<u64>,
    tasks: RefCell<BTreeMap<Key, Task>>,
}

/// Scheduler driven by a virtual clock
///
/// Nothing runs until the owner calls [`advance`](Self::advance) or
/// [`run_ready`](Self::run_ready), which makes timeout behavior testable
/// without real sleeps.
#[derive(Clone, Default)]
pub struct ManualScheduler {
    queue: Rc<ManualQueue>,
}

impl ManualScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current virtual time
    pub fn now(&self) -> Duration {
        self.queue.now.get()
    }

    /// Number of tasks still waiting to run
    pub fn pending(&self) -> usize {
        self.queue.tasks.borrow().len()
    }

    /// Run tasks that are already due, without moving the clock
    pub fn run_ready(&self) -> usize {
        self.advance(Duration::ZERO)
    }

    /// Move the clock forward, running every task due on the way
    ///
    /// Tasks run in deadline order, ties in scheduling order. Tasks scheduled
    /// while advancing run too if they fall due before the target time.
    pub fn advance(&self, by: Duration) -> usize {
        let target = self.now() + by;
        let mut ran = 0;
        loop {
            let next = {
                let mut tasks = self.queue.tasks.borrow_mut();
                match tasks.first_key_value() {
                    Some((&(due, _), _)) if due <= target => tasks.pop_first(),
                    _ => None,
                }
            };
            let Some(((due, _), task)) = next else { break };
            if due > self.now() {
                self.queue.now.set(due);
            }
            task();
            ran += 1;
        }
        self.queue.now.set(target);
        if ran > 0 {
            debug!("Manual scheduler ran {} task(s), now at {:?}", ran, target);
        }
        ran
    }
}

impl Scheduler for ManualScheduler {
    fn schedule(&self, delay: Duration, task: Task) -> TimerHandle {
        let seq = self.queue.seq.get();
        self.queue.seq.set(seq + 1);
        let key = (self.now() + delay, seq);
        self.queue.tasks.borrow_mut().insert(key, task);

        let queue: Weak<ManualQueue> = Rc::downgrade(&self.queue);
        TimerHandle::new(move || {
            if let Some(queue) = queue.upgrade() {
                queue.tasks.borrow_mut().remove(&key);
            }
        })
    }
}

impl fmt::Debug for ManualScheduler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ManualScheduler")
            .field("now", &self.now())
            .field("pending", &self.pending())
            .finish()
    }
}
