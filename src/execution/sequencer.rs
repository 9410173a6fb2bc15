//! The sequencer - queue, event table, timeout supervisor, and execution engine
//!
//! A [`Sequencer`] runs its steps one at a time. Each step receives the
//! sequencer and the current arguments, and decides when to continue by
//! calling [`Sequencer::next`], immediately or later from a scheduled task.
//! Completion, failure, and timeout are reported through events.

use crate::core::{
    config::SequencerConfig,
    error::{SequencerError, StepError, StepFailure},
    event::{Event, EventTable, Handler},
    queue::TaskQueue,
    state::{SequenceStatus, SequencerState},
    step::{Step, StepResult},
};
use crate::execution::scheduler::{Scheduler, TimerHandle};
use crate::execution::timeout::TimeoutSupervisor;
use serde_json::Value;
use std::any::Any;
use std::cell::RefCell;
use std::fmt;
use std::rc::Rc;
use std::time::Duration;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

/// Arguments passed between steps and to event handlers
pub type Args = Vec<Value>;

struct Inner {
    queue: RefCell<TaskQueue>,
    events: RefCell<EventTable>,
    state: RefCell<SequencerState>,
    timeout: TimeoutSupervisor,
    scheduler: Rc<dyn Scheduler>,
    extension: RefCell<Option<Rc<dyn Any>>>,
}

/// Handle to a single-threaded sequential task runner
///
/// Clones share the same queue, handlers, and state.
#[derive(Clone)]
pub struct Sequencer {
    inner: Rc<Inner>,
}

impl Sequencer {
    /// Create an empty sequencer with default settings on `scheduler`
    pub fn new(scheduler: Rc<dyn Scheduler>) -> Self {
        Self::with_scheduler(SequencerConfig::default(), scheduler)
    }

    /// Create an empty sequencer on the given scheduler
    pub fn with_scheduler(config: SequencerConfig, scheduler: Rc<dyn Scheduler>) -> Self {
        Self {
            inner: Rc::new(Inner {
                queue: RefCell::new(TaskQueue::new()),
                events: RefCell::new(EventTable::new()),
                state: RefCell::new(SequencerState::new()),
                timeout: TimeoutSupervisor::new(config.timeout()),
                scheduler,
                extension: RefCell::new(None),
            }),
        }
    }

    pub fn id(&self) -> Uuid {
        self.inner.state.borrow().id
    }

    fn tag(&self) -> String {
        self.inner.state.borrow().short_id()
    }

    /// The scheduler deadlines and deferred starts run on
    pub fn scheduler(&self) -> Rc<dyn Scheduler> {
        self.inner.scheduler.clone()
    }

    // Queue operations

    /// Append a step to the back of the queue
    pub fn push<F>(&self, body: F) -> &Self
    where
        F: Fn(&Sequencer, &[Value]) -> StepResult + 'static,
    {
        self.push_step(Step::new(body))
    }

    pub fn push_step(&self, step: Step) -> &Self {
        self.inner.queue.borrow_mut().push(step);
        self
    }

    /// Prepend a step so it runs next, even while another step is executing
    pub fn unshift<F>(&self, body: F) -> &Self
    where
        F: Fn(&Sequencer, &[Value]) -> StepResult + 'static,
    {
        self.unshift_step(Step::new(body))
    }

    pub fn unshift_step(&self, step: Step) -> &Self {
        self.inner.queue.borrow_mut().unshift(step);
        self
    }

    /// Remove and return the front step without running it
    pub fn shift(&self) -> Option<Step> {
        self.inner.queue.borrow_mut().shift()
    }

    /// Remove and return the back step
    pub fn pop(&self) -> Option<Step> {
        self.inner.queue.borrow_mut().pop()
    }

    /// Drop the front step without running it
    pub fn skip_one(&self) -> &Self {
        self.skip(1)
    }

    /// Drop up to `count` steps from the front without running them
    ///
    /// Clamps at the end of the queue; a `count` of zero drops nothing.
    pub fn skip(&self, count: usize) -> &Self {
        let removed = self.inner.queue.borrow_mut().skip(count);
        debug!("Sequencer {}: skipped {} step(s)", self.tag(), removed);
        self
    }

    /// Clear the queue and report success with `args`
    pub fn skip_all(&self, args: Args) -> Result<&Self, SequencerError> {
        let dropped = {
            let mut queue = self.inner.queue.borrow_mut();
            let dropped = queue.len();
            queue.clear();
            dropped
        };
        self.inner.state.borrow_mut().succeed();
        info!(
            "Sequencer {}: skipping {} remaining step(s) to success",
            self.tag(),
            dropped
        );
        self.notify(Event::Success, &args)?;
        self.notify(Event::Done, &args)?;
        Ok(self)
    }

    pub fn len(&self) -> usize {
        self.inner.queue.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.queue.borrow().is_empty()
    }

    /// Names of the pending steps, front first
    pub fn step_names(&self) -> Vec<String> {
        self.inner.queue.borrow().names()
    }

    // Execution

    /// Begin running steps with `args`
    pub fn start(&self, args: Args) -> Result<&Self, SequencerError> {
        self.inner.state.borrow_mut().start();
        info!(
            "Sequencer {}: starting with {} step(s)",
            self.tag(),
            self.len()
        );
        self.next(args)?;
        Ok(self)
    }

    /// Run the next step with `args`, or finish if the queue is empty
    ///
    /// A failing step is recovered into `error` + `done` when an `error`
    /// handler is registered; otherwise the failure is returned here and the
    /// rest of the queue is left untouched.
    pub fn next(&self, args: Args) -> Result<(), SequencerError> {
        self.inner.timeout.disarm();

        let (step, remaining) = {
            let mut queue = self.inner.queue.borrow_mut();
            (queue.shift(), queue.len())
        };
        let step = match step {
            Some(step) => step,
            None => return self.finish(args),
        };

        // The last step may end the run by simply not continuing
        if remaining > 0 {
            self.arm_timeout(args.clone());
        }
        self.inner.state.borrow_mut().dispatch();
        debug!("Sequencer {}: running step '{}'", self.tag(), step.name);

        match step.run(self, &args) {
            Ok(()) => Ok(()),
            Err(err) => self.recover(&step, args, err),
        }
    }

    /// Run `next` with `args` after `delay`, on this sequencer's scheduler
    pub fn next_after(&self, delay: Duration, args: Args) -> TimerHandle {
        let sequencer = self.clone();
        self.inner.scheduler.schedule(
            delay,
            Box::new(move || {
                if let Err(err) = sequencer.next(args) {
                    error!("Sequencer {}: {}", sequencer.tag(), err);
                }
            }),
        )
    }

    /// Fail the current step with `message`
    ///
    /// Meant to be returned from a step body: `return seq.fail("...")`.
    pub fn fail(&self, message: impl Into<String>) -> StepResult {
        Err(StepError::Failed(message.into()))
    }

    fn finish(&self, args: Args) -> Result<(), SequencerError> {
        let status = self.status();
        if status.is_failure() {
            warn!(
                "Sequencer {}: ignoring continuation after {:?}",
                self.tag(),
                status
            );
            return Ok(());
        }

        self.inner.state.borrow_mut().succeed();
        info!("Sequencer {}: completed successfully", self.tag());
        self.notify(Event::Success, &args)?;
        self.notify(Event::Done, &args)?;
        Ok(())
    }

    fn recover(&self, step: &Step, args: Args, err: StepError) -> Result<(), SequencerError> {
        self.inner.timeout.disarm();
        self.inner.state.borrow_mut().fail();

        if !self.has_handlers(Event::Error) {
            error!(
                "Sequencer {}: step '{}' failed with no error handler: {}",
                self.tag(),
                step.name,
                err
            );
            return Err(match err {
                StepError::Sequence(inner) => *inner,
                source => SequencerError::Step {
                    step: step.name.clone(),
                    arguments: args,
                    source,
                },
            });
        }

        self.inner.queue.borrow_mut().clear();
        warn!(
            "Sequencer {}: step '{}' failed, aborting sequence: {}",
            self.tag(),
            step.name,
            err
        );
        let failure = StepFailure::new(step.name.clone(), err.to_string(), args.clone());
        self.notify(Event::Error, &failure.to_args())?;
        self.notify(Event::Done, &args)?;
        Ok(())
    }

    // Events

    /// Register `handler` for `event`
    pub fn on(&self, event: impl Into<Event>, handler: Handler) -> &Self {
        self.inner.events.borrow_mut().on(event.into(), handler);
        self
    }

    /// Remove every registration of `handler` for `event`
    pub fn off(&self, event: impl Into<Event>, handler: &Handler) -> &Self {
        self.inner.events.borrow_mut().off(&event.into(), handler);
        self
    }

    pub fn has_handlers(&self, event: impl Into<Event>) -> bool {
        self.inner.events.borrow().has_handlers(&event.into())
    }

    /// Invoke the handlers registered for `event`, in registration order
    ///
    /// A failing handler stops the notification and its error is returned.
    pub fn notify(&self, event: impl Into<Event>, args: &[Value]) -> Result<&Self, SequencerError> {
        let event = event.into();
        if self.is_empty() && self.inner.timeout.disarm() {
            debug!("Sequencer {}: queue empty, deadline disarmed", self.tag());
        }

        let handlers = self.inner.events.borrow().handlers(&event);
        for handler in handlers {
            handler
                .call(self, args)
                .map_err(|source| SequencerError::Handler {
                    event: event.clone(),
                    source,
                })?;
        }
        Ok(self)
    }

    // Timeout

    pub fn timeout_duration(&self) -> Duration {
        self.inner.timeout.duration()
    }

    /// Takes effect on the next arm or reset
    pub fn set_timeout_duration(&self, duration: Duration) -> &Self {
        self.inner.timeout.set_duration(duration);
        self
    }

    /// Like [`set_timeout_duration`](Self::set_timeout_duration), in fractional seconds
    pub fn set_timeout_secs(&self, secs: f64) -> &Self {
        self.set_timeout_duration(SequencerConfig::new().with_timeout_secs(secs).timeout())
    }

    /// Re-arm the deadline with the current timeout duration
    ///
    /// No-op when nothing is queued.
    pub fn reset_timeout(&self) -> &Self {
        if self.is_empty() {
            return self;
        }
        self.inner
            .timeout
            .rearm(&*self.inner.scheduler, self.deadline());
        debug!(
            "Sequencer {}: deadline reset to {:?}",
            self.tag(),
            self.timeout_duration()
        );
        self
    }

    fn arm_timeout(&self, args: Args) {
        self.inner
            .timeout
            .arm(&*self.inner.scheduler, args, self.deadline());
    }

    fn deadline(&self) -> impl FnOnce(u64) + 'static {
        let inner = Rc::downgrade(&self.inner);
        move |generation| {
            if let Some(inner) = inner.upgrade() {
                Sequencer { inner }.expire(generation);
            }
        }
    }

    fn expire(&self, generation: u64) {
        let args = match self.inner.timeout.claim(generation) {
            Some(args) => args,
            None => return,
        };

        warn!(
            "Sequencer {}: no progress within {:?}, timing out",
            self.tag(),
            self.timeout_duration()
        );
        self.inner.queue.borrow_mut().clear();
        self.inner.state.borrow_mut().time_out();

        let result = self
            .notify(Event::Timeout, &args)
            .and_then(|sequencer| sequencer.notify(Event::Done, &args));
        if let Err(err) = result {
            error!("Sequencer {}: {}", self.tag(), err);
        }
    }

    // Flags

    pub fn has_started(&self) -> bool {
        self.inner.state.borrow().has_started
    }

    pub fn has_failed(&self) -> bool {
        self.inner.state.borrow().has_failed
    }

    pub fn status(&self) -> SequenceStatus {
        self.inner.state.borrow().status
    }

    /// Snapshot of flags and timestamps
    pub fn state(&self) -> SequencerState {
        self.inner.state.borrow().clone()
    }

    // Chaining and extension

    /// Create a sequencer that starts with `args` once this one is done
    ///
    /// If this sequencer's queue is already empty, the new one starts on the
    /// next scheduler turn instead. It shares this sequencer's scheduler and
    /// timeout duration.
    pub fn then_start(&self, args: Args) -> Sequencer {
        let chained = Sequencer::with_scheduler(SequencerConfig::default(), self.scheduler());
        chained.set_timeout_duration(self.timeout_duration());

        if self.is_empty() {
            debug!(
                "Sequencer {}: queue empty, deferring start of {}",
                self.tag(),
                chained.tag()
            );
            let deferred = chained.clone();
            self.inner.scheduler.schedule(
                Duration::ZERO,
                Box::new(move || {
                    if let Err(err) = deferred.start(args) {
                        error!("Sequencer {}: {}", deferred.tag(), err);
                    }
                }),
            );
        } else {
            debug!(
                "Sequencer {}: {} will start when done",
                self.tag(),
                chained.tag()
            );
            let deferred = chained.clone();
            self.on(
                Event::Done,
                Handler::new(move |_, _| {
                    deferred.start(args.clone())?;
                    Ok(())
                }),
            );
        }

        chained
    }

    /// Extension state attached by [`Extended`](crate::execution::Extended)
    pub fn extension<E: 'static>(&self) -> Option<Rc<RefCell<E>>> {
        let extension = self.inner.extension.borrow().clone()?;
        extension.downcast::<RefCell<E>>().ok()
    }

    pub(crate) fn attach_extension(&self, extension: Rc<dyn Any>) {
        *self.inner.extension.borrow_mut() = Some(extension);
    }
}

impl fmt::Debug for Sequencer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.state.borrow();
        f.debug_struct("Sequencer")
            .field("id", &state.id)
            .field("status", &state.status)
            .field("pending", &self.inner.queue.borrow().names())
            .field("timeout", &self.inner.timeout.duration())
            .finish()
    }
}
