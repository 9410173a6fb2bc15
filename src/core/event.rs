//! Event names, handlers, and the per-sequencer handler table

use crate::execution::Sequencer;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

/// Name of an event a sequencer can notify
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Event {
    /// The queue ran dry without failure
    Success,
    /// A step failed and was recovered by a registered handler
    Error,
    /// No progress was made within the timeout
    Timeout,
    /// Always fires after `Success`, `Error`, or `Timeout`
    Done,
    /// Any caller-chosen event
    Custom(String),
}

impl Event {
    pub fn as_str(&self) -> &str {
        match self {
            Event::Success => "success",
            Event::Error => "error",
            Event::Timeout => "timeout",
            Event::Done => "done",
            Event::Custom(name) => name,
        }
    }

    /// Whether this event reports the end of a sequence
    pub fn is_terminal(&self) -> bool {
        matches!(self, Event::Success | Event::Error | Event::Timeout)
    }
}

impl From<&str> for Event {
    fn from(name: &str) -> Self {
        match name {
            "success" => Event::Success,
            "error" => Event::Error,
            "timeout" => Event::Timeout,
            "done" => Event::Done,
            other => Event::Custom(other.to_string()),
        }
    }
}

impl From<String> for Event {
    fn from(name: String) -> Self {
        Event::from(name.as_str())
    }
}

impl From<Event> for String {
    fn from(event: Event) -> Self {
        event.as_str().to_string()
    }
}

impl fmt::Display for Event {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

type HandlerFn = dyn Fn(&Sequencer, &[Value]) -> anyhow::Result<()>;

/// A callable registered for an event
///
/// Handlers are compared by identity: clones of one `Handler` are equal,
/// two handlers built from identical closures are not.
#[derive(Clone)]
pub struct Handler(Rc<HandlerFn>);

impl Handler {
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&Sequencer, &[Value]) -> anyhow::Result<()> + 'static,
    {
        Handler(Rc::new(f))
    }

    pub(crate) fn call(&self, sequencer: &Sequencer, args: &[Value]) -> anyhow::Result<()> {
        (self.0)(sequencer, args)
    }
}

impl PartialEq for Handler {
    fn eq(&self, other: &Self) -> bool {
        std::ptr::addr_eq(Rc::as_ptr(&self.0), Rc::as_ptr(&other.0))
    }
}

impl Eq for Handler {}

impl fmt::Debug for Handler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Handler({:p})", Rc::as_ptr(&self.0) as *const ())
    }
}

/// Handlers indexed by event name, each list in registration order
#[derive(Debug, Default)]
pub struct EventTable {
    handlers: HashMap<Event, Vec<Handler>>,
}

impl EventTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a handler, creating the event's list on first use
    pub fn on(&mut self, event: Event, handler: Handler) {
        self.handlers.entry(event).or_default().push(handler);
    }

    /// Remove every registration identical to `handler`, keeping the rest in order
    pub fn off(&mut self, event: &Event, handler: &Handler) -> usize {
        match self.handlers.get_mut(event) {
            Some(list) => {
                let before = list.len();
                list.retain(|h| h != handler);
                before - list.len()
            }
            None => 0,
        }
    }

    /// Snapshot of the handlers for an event, in invocation order
    pub fn handlers(&self, event: &Event) -> Vec<Handler> {
        self.handlers.get(event).cloned().unwrap_or_default()
    }

    pub fn has_handlers(&self, event: &Event) -> bool {
        self.handlers.get(event).is_some_and(|list| !list.is_empty())
    }
}
