//! Batch lifecycle: the job controller and batch-level state.

pub mod controller;

pub use controller::{BatchHandle, JobController};

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Batch state definitions.
///
/// `Pending` until the first task starts, `Running` while tasks execute,
/// then exactly one terminal state once every task is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BatchState {
    /// Batch accepted, no task has started yet
    Pending,
    /// At least one task has started
    Running,
    /// Every task completed successfully
    Complete,
    /// Tasks finished but at least one failed
    PartiallyFailed,
    /// Cancel was invoked before all tasks finished
    Cancelled,
}

impl BatchState {
    /// Check if this is a terminal state (no further transitions allowed)
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete | Self::PartiallyFailed | Self::Cancelled)
    }
}

impl fmt::Display for BatchState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Running => write!(f, "running"),
            Self::Complete => write!(f, "complete"),
            Self::PartiallyFailed => write!(f, "partially_failed"),
            Self::Cancelled => write!(f, "cancelled"),
        }
    }
}

impl Default for BatchState {
    fn default() -> Self {
        Self::Pending
    }
}

/// End-of-batch accounting.
///
/// `completed`, `failed`, and `cancelled` partition the tasks that
/// reached a terminal state; `finished()` is their sum and equals `total`
/// once the batch is terminal.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchSummary {
    pub batch_id: Uuid,
    pub state: BatchState,
    pub total: usize,
    pub completed: usize,
    pub failed: usize,
    pub cancelled: usize,
}

impl BatchSummary {
    pub fn finished(&self) -> usize {
        self.completed + self.failed + self.cancelled
    }
}
