//! Execution state models

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Where a sequencer is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SequenceStatus {
    /// Not started yet; the queue may already hold steps
    Idle,
    /// A step is executing or the engine awaits its call to `next`
    Running,
    /// The queue ran dry, or `skip_all` short-circuited it
    Succeeded,
    /// A step failed
    Failed,
    /// No progress within the timeout
    TimedOut,
}

impl SequenceStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            SequenceStatus::Succeeded | SequenceStatus::Failed | SequenceStatus::TimedOut
        )
    }

    /// Terminal and unsuccessful
    pub fn is_failure(&self) -> bool {
        matches!(self, SequenceStatus::Failed | SequenceStatus::TimedOut)
    }
}

/// Snapshot of a sequencer's flags and timestamps
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SequencerState {
    /// Unique sequencer ID
    pub id: Uuid,

    /// Current lifecycle status
    pub status: SequenceStatus,

    /// Set once `start` has been called
    pub has_started: bool,

    /// Set by a step failure or a timeout
    pub has_failed: bool,

    /// When `start` was called
    pub started_at: Option<DateTime<Utc>>,

    /// When the last terminal event fired
    pub completed_at: Option<DateTime<Utc>>,

    /// Number of steps dispatched so far
    pub steps_run: usize,
}

impl SequencerState {
    pub fn new() -> Self {
        Self {
            id: Uuid::new_v4(),
            status: SequenceStatus::Idle,
            has_started: false,
            has_failed: false,
            started_at: None,
            completed_at: None,
            steps_run: 0,
        }
    }

    /// Mark the sequencer as started
    pub fn start(&mut self) {
        self.has_started = true;
        self.status = SequenceStatus::Running;
        self.started_at = Some(Utc::now());
    }

    /// Record that a step has been dispatched
    pub fn dispatch(&mut self) {
        self.status = SequenceStatus::Running;
        self.steps_run += 1;
    }

    /// Mark the sequence as having run dry successfully
    pub fn succeed(&mut self) {
        self.status = SequenceStatus::Succeeded;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the sequence as failed by a step
    pub fn fail(&mut self) {
        self.has_failed = true;
        self.status = SequenceStatus::Failed;
        self.completed_at = Some(Utc::now());
    }

    /// Mark the sequence as timed out
    pub fn time_out(&mut self) {
        self.has_failed = true;
        self.status = SequenceStatus::TimedOut;
        self.completed_at = Some(Utc::now());
    }

    /// Short form of the ID used in logs
    pub fn short_id(&self) -> String {
        self.id.to_string()[..8].to_string()
    }
}

impl Default for SequencerState {
    fn default() -> Self {
        Self::new()
    }
}
