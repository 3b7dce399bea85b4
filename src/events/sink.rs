use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::events::StatusEvent;

/// Presentation seam for status events.
///
/// The drain loop is the single consumer of a batch's status channel and
/// forwards every event here, so implementations never see a task's
/// events out of order.
#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn on_event(&self, event: StatusEvent);
}

/// Default sink: renders status lines through `tracing`.
#[derive(Debug, Default)]
pub struct TracingSink;

#[async_trait]
impl ProgressSink for TracingSink {
    async fn on_event(&self, event: StatusEvent) {
        match event {
            StatusEvent::TaskProgress(ev) => {
                debug!(task_id = %ev.task_id, percent = ev.percent, "{}", ev.message);
            }
            StatusEvent::TaskFinished {
                task_id,
                state,
                message,
                ..
            } => {
                info!(%task_id, %state, "{message}");
            }
            StatusEvent::BatchFinished(summary) => {
                info!(
                    batch_id = %summary.batch_id,
                    state = %summary.state,
                    completed = summary.completed,
                    failed = summary.failed,
                    cancelled = summary.cancelled,
                    total = summary.total,
                    "all conversions finished"
                );
            }
        }
    }
}

/// Sink that records every event in memory, for assertions in tests and
/// for callers that render after the fact.
#[derive(Debug, Default)]
pub struct MemorySink {
    events: parking_lot::Mutex<Vec<StatusEvent>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<StatusEvent> {
        self.events.lock().clone()
    }
}

#[async_trait]
impl ProgressSink for MemorySink {
    async fn on_event(&self, event: StatusEvent) {
        self.events.lock().push(event);
    }
}

/// Spawn the single-consumer drain loop for a batch's status channel.
///
/// Runs until every reporter clone is dropped, then exits.
pub fn spawn_drain(
    mut receiver: mpsc::Receiver<StatusEvent>,
    sink: Arc<dyn ProgressSink>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = receiver.recv().await {
            sink.on_event(event).await;
        }
    })
}
