use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;
use uuid::Uuid;

use crate::batch::BatchSummary;
use crate::conversion::TaskState;

/// One progress line from a running task.
///
/// Produced by exactly one task; events of a single task are strictly
/// ordered end to end (single producer into a FIFO channel, single
/// consumer). No ordering holds across different tasks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProgressEvent {
    pub task_id: Uuid,
    pub message: String,
    /// Percent complete while the task is stepping; absent on terminal
    /// messages.
    pub percent: Option<u8>,
    pub emitted_at: DateTime<Utc>,
}

/// Events delivered on the status channel.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StatusEvent {
    /// Incremental progress from a running task
    TaskProgress(ProgressEvent),
    /// A task reached a terminal state
    TaskFinished {
        task_id: Uuid,
        state: TaskState,
        message: String,
        emitted_at: DateTime<Utc>,
    },
    /// All tasks of a batch reached a terminal state; sent exactly once
    BatchFinished(BatchSummary),
}

impl StatusEvent {
    /// Get a string representation of the event type for logging
    pub fn event_type(&self) -> &'static str {
        match self {
            Self::TaskProgress(_) => "task_progress",
            Self::TaskFinished { .. } => "task_finished",
            Self::BatchFinished(_) => "batch_finished",
        }
    }

    /// Task this event belongs to, if any
    pub fn task_id(&self) -> Option<Uuid> {
        match self {
            Self::TaskProgress(event) => Some(event.task_id),
            Self::TaskFinished { task_id, .. } => Some(*task_id),
            Self::BatchFinished(_) => None,
        }
    }

    /// Human-readable message, if the event carries one
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::TaskProgress(event) => Some(&event.message),
            Self::TaskFinished { message, .. } => Some(message),
            Self::BatchFinished(_) => None,
        }
    }
}

/// Sending half of the status channel, cloned into every task.
///
/// The channel is bounded; together with the dedicated drain loop this
/// keeps a slow consumer from stalling workers indefinitely. Events for a
/// closed channel (consumer gone) are dropped.
#[derive(Debug, Clone)]
pub struct ProgressReporter {
    sender: mpsc::Sender<StatusEvent>,
}

impl ProgressReporter {
    /// Create a reporter and its receiving half with the specified
    /// channel capacity.
    pub fn channel(capacity: usize) -> (Self, mpsc::Receiver<StatusEvent>) {
        let (sender, receiver) = mpsc::channel(capacity.max(1));
        (Self { sender }, receiver)
    }

    pub async fn task_progress(&self, task_id: Uuid, message: String, percent: u8) {
        self.send(StatusEvent::TaskProgress(ProgressEvent {
            task_id,
            message,
            percent: Some(percent),
            emitted_at: Utc::now(),
        }))
        .await;
    }

    pub async fn task_finished(&self, task_id: Uuid, state: TaskState, message: String) {
        self.send(StatusEvent::TaskFinished {
            task_id,
            state,
            message,
            emitted_at: Utc::now(),
        })
        .await;
    }

    pub async fn batch_finished(&self, summary: BatchSummary) {
        self.send(StatusEvent::BatchFinished(summary)).await;
    }

    async fn send(&self, event: StatusEvent) {
        if self.sender.send(event).await.is_err() {
            // Consumer gone; nothing left to render to.
            trace!("status channel closed, dropping event");
        }
    }
}
