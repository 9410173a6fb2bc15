//! Double-ended queue of pending steps

use crate::core::step::Step;
use std::collections::VecDeque;

/// Ordered steps awaiting execution; the front runs next
#[derive(Debug, Clone, Default)]
pub struct TaskQueue {
    steps: VecDeque<Step>,
}

impl TaskQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a step to the back
    pub fn push(&mut self, step: Step) {
        self.steps.push_back(step);
    }

    /// Prepend a step so it runs next
    pub fn unshift(&mut self, step: Step) {
        self.steps.push_front(step);
    }

    /// Remove and return the front step
    pub fn shift(&mut self) -> Option<Step> {
        self.steps.pop_front()
    }

    /// Remove and return the back step
    pub fn pop(&mut self) -> Option<Step> {
        self.steps.pop_back()
    }

    /// Drop up to `count` steps from the front without running them
    ///
    /// Stops early when the queue runs out; returns how many were removed.
    pub fn skip(&mut self, count: usize) -> usize {
        let removed = count.min(self.steps.len());
        self.steps.drain(..removed);
        removed
    }

    /// Drop every pending step
    pub fn clear(&mut self) {
        self.steps.clear();
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    /// Names of the pending steps, front first
    pub fn names(&self) -> Vec<String> {
        self.steps.iter().map(|s| s.name.clone()).collect()
    }
}
