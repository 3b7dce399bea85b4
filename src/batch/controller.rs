//! Batch submission, aggregation, and cancel-all.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use parking_lot::RwLock;
use tokio::sync::watch;
use tracing::{info, warn};
use uuid::Uuid;

use crate::batch::{BatchState, BatchSummary};
use crate::config::ConvertConfig;
use crate::conversion::{ConversionKind, ConversionTask, TaskState};
use crate::error::{ConvertError, Result};
use crate::events::{spawn_drain, ProgressReporter, ProgressSink, TracingSink};
use crate::execution::{CancellationToken, TaskHandle, WorkerPool};

/// Accepts batches of selected files and runs one conversion task per
/// file on a fresh per-batch worker pool.
pub struct JobController {
    config: ConvertConfig,
    sink: Arc<dyn ProgressSink>,
}

impl JobController {
    /// Controller rendering status through [`TracingSink`].
    pub fn new(config: ConvertConfig) -> Result<Self> {
        Self::with_sink(config, Arc::new(TracingSink))
    }

    pub fn with_sink(config: ConvertConfig, sink: Arc<dyn ProgressSink>) -> Result<Self> {
        config.validate()?;
        Ok(Self { config, sink })
    }

    /// Submit one task per file and return a handle for observation and
    /// cancellation.
    ///
    /// The file list is taken by value as the batch's immutable input;
    /// an empty list fails with [`ConvertError::NoFilesSelected`] before
    /// any task is created.
    pub async fn start_batch(
        &self,
        files: Vec<PathBuf>,
        kind: ConversionKind,
    ) -> Result<BatchHandle> {
        if files.is_empty() {
            return Err(ConvertError::NoFilesSelected);
        }
        let output_root = self.config.output_root()?;
        let batch_id = Uuid::new_v4();
        info!(%batch_id, files = files.len(), %kind, "starting batch");

        let (reporter, receiver) = ProgressReporter::channel(self.config.event_buffer_size);
        let drain = spawn_drain(receiver, self.sink.clone());

        let token = CancellationToken::new();
        let pool = WorkerPool::new(self.config.worker_count, token);

        let shared = Arc::new(BatchShared {
            batch_id,
            total: files.len(),
            states: DashMap::new(),
            finished: AtomicUsize::new(0),
            completed: AtomicUsize::new(0),
            failed: AtomicUsize::new(0),
            cancelled: AtomicUsize::new(0),
            state: RwLock::new(BatchState::Pending),
            cancel_requested: AtomicBool::new(false),
        });

        let step_delay = Duration::from_millis(self.config.step_delay_ms);
        let mut handles = Vec::with_capacity(shared.total);
        for file in files {
            let task = ConversionTask::new(
                file,
                &output_root,
                kind,
                self.config.step_count,
                step_delay,
            );
            let task_id = task.task_id();
            let name = task.source_name();
            shared.states.insert(task_id, TaskState::Pending);
            match pool.submit(task, reporter.clone()) {
                Ok(handle) => handles.push(handle),
                Err(err) => {
                    warn!(%task_id, error = %err, "submission rejected");
                    reporter
                        .task_finished(
                            task_id,
                            TaskState::Cancelled,
                            format!("{name}: submission rejected: {err}"),
                        )
                        .await;
                    shared.record_terminal(task_id, TaskState::Cancelled);
                }
            }
        }

        let (done_tx, done_rx) = watch::channel(None::<BatchSummary>);
        tokio::spawn(aggregate(shared.clone(), handles, reporter, drain, done_tx));

        Ok(BatchHandle {
            shared,
            pool,
            done_rx,
        })
    }
}

/// Handle for one in-flight batch.
pub struct BatchHandle {
    shared: Arc<BatchShared>,
    pool: WorkerPool,
    done_rx: watch::Receiver<Option<BatchSummary>>,
}

impl std::fmt::Debug for BatchHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BatchHandle")
            .field("batch_id", &self.shared.batch_id)
            .field("total", &self.shared.total)
            .finish_non_exhaustive()
    }
}

impl BatchHandle {
    pub fn batch_id(&self) -> Uuid {
        self.shared.batch_id
    }

    pub fn total(&self) -> usize {
        self.shared.total
    }

    /// Tasks that have reached a terminal state so far.
    pub fn finished(&self) -> usize {
        self.shared.finished.load(Ordering::SeqCst)
    }

    /// Tasks that completed successfully so far.
    pub fn completed(&self) -> usize {
        self.shared.completed.load(Ordering::SeqCst)
    }

    pub fn state(&self) -> BatchState {
        *self.shared.state.read()
    }

    pub fn task_state(&self, task_id: Uuid) -> Option<TaskState> {
        self.shared.states.get(&task_id).map(|state| *state)
    }

    /// Snapshot of every task's last observed state.
    pub fn task_states(&self) -> Vec<(Uuid, TaskState)> {
        self.shared
            .states
            .iter()
            .map(|entry| (*entry.key(), *entry.value()))
            .collect()
    }

    pub fn summary(&self) -> BatchSummary {
        self.shared.summary()
    }

    /// Cancel the batch: shut the pool down and mark the batch
    /// `Cancelled` unless every task already finished. Idempotent; tasks
    /// already in a terminal state keep it.
    pub fn cancel(&self) {
        self.shared.cancel_requested.store(true, Ordering::SeqCst);
        self.pool.shutdown_now();
        if self.shared.finished.load(Ordering::SeqCst) < self.shared.total {
            let mut state = self.shared.state.write();
            if !state.is_terminal() {
                *state = BatchState::Cancelled;
            }
        }
        info!(batch_id = %self.shared.batch_id, "conversion process cancelled");
    }

    /// Wait until every task is terminal and the batch is resolved.
    pub async fn wait(&self) -> BatchSummary {
        let mut done_rx = self.done_rx.clone();
        loop {
            if let Some(summary) = done_rx.borrow_and_update().clone() {
                return summary;
            }
            if done_rx.changed().await.is_err() {
                return self.shared.summary();
            }
        }
    }
}

struct BatchShared {
    batch_id: Uuid,
    total: usize,
    states: DashMap<Uuid, TaskState>,
    finished: AtomicUsize,
    completed: AtomicUsize,
    failed: AtomicUsize,
    cancelled: AtomicUsize,
    state: RwLock<BatchState>,
    cancel_requested: AtomicBool,
}

impl BatchShared {
    fn mark_running(&self, task_id: Uuid) {
        self.states.insert(task_id, TaskState::Running);
        let mut state = self.state.write();
        if *state == BatchState::Pending {
            *state = BatchState::Running;
        }
    }

    /// Record a task's terminal state; called exactly once per task.
    fn record_terminal(&self, task_id: Uuid, state: TaskState) {
        self.states.insert(task_id, state);
        let bucket = match state {
            TaskState::Complete => &self.completed,
            TaskState::Failed => &self.failed,
            TaskState::Cancelled => &self.cancelled,
            TaskState::Pending | TaskState::Running => return,
        };
        bucket.fetch_add(1, Ordering::SeqCst);
        self.finished.fetch_add(1, Ordering::SeqCst);
    }

    fn summary(&self) -> BatchSummary {
        BatchSummary {
            batch_id: self.batch_id,
            state: *self.state.read(),
            total: self.total,
            completed: self.completed.load(Ordering::SeqCst),
            failed: self.failed.load(Ordering::SeqCst),
            cancelled: self.cancelled.load(Ordering::SeqCst),
        }
    }
}

/// Observe every task to its terminal state, then resolve the batch and
/// emit the single `BatchFinished` event.
async fn aggregate(
    shared: Arc<BatchShared>,
    handles: Vec<TaskHandle>,
    reporter: ProgressReporter,
    drain: tokio::task::JoinHandle<()>,
    done_tx: watch::Sender<Option<BatchSummary>>,
) {
    let watchers = handles.into_iter().map(|handle| {
        let shared = shared.clone();
        observe_task(shared, handle)
    });
    futures::future::join_all(watchers).await;

    {
        let mut state = shared.state.write();
        if !state.is_terminal() {
            *state = resolve_end_state(
                shared.cancel_requested.load(Ordering::SeqCst),
                shared.cancelled.load(Ordering::SeqCst),
                shared.failed.load(Ordering::SeqCst),
            );
        }
    }

    let summary = shared.summary();
    reporter.batch_finished(summary.clone()).await;
    drop(reporter);
    // All senders are gone now; wait for the drain loop to flush the
    // channel so the sink has seen every event before wait() returns.
    let _ = drain.await;

    info!(
        batch_id = %shared.batch_id,
        state = %summary.state,
        completed = summary.completed,
        failed = summary.failed,
        cancelled = summary.cancelled,
        "batch finished"
    );
    let _ = done_tx.send(Some(summary));
}

async fn observe_task(shared: Arc<BatchShared>, handle: TaskHandle) {
    let mut state_rx = handle.watch();
    loop {
        let state = *state_rx.borrow_and_update();
        if state.is_terminal() {
            shared.record_terminal(handle.task_id(), state);
            return;
        }
        if state == TaskState::Running {
            shared.mark_running(handle.task_id());
        }
        if state_rx.changed().await.is_err() {
            let last = *state_rx.borrow();
            let terminal = if last.is_terminal() {
                last
            } else {
                TaskState::Cancelled
            };
            shared.record_terminal(handle.task_id(), terminal);
            return;
        }
    }
}

fn resolve_end_state(cancel_requested: bool, cancelled: usize, failed: usize) -> BatchState {
    if cancel_requested && cancelled > 0 {
        BatchState::Cancelled
    } else if failed > 0 {
        BatchState::PartiallyFailed
    } else {
        BatchState::Complete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config(output_dir: &std::path::Path) -> ConvertConfig {
        ConvertConfig {
            worker_count: 2,
            step_count: 3,
            step_delay_ms: 1,
            event_buffer_size: 256,
            output_dir: Some(output_dir.to_path_buf()),
        }
    }

    #[tokio::test]
    async fn test_empty_file_list_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let controller = JobController::new(test_config(dir.path())).unwrap();

        let err = controller
            .start_batch(Vec::new(), ConversionKind::Unknown)
            .await
            .unwrap_err();
        assert!(matches!(err, ConvertError::NoFilesSelected));
    }

    #[tokio::test]
    async fn test_invalid_config_is_rejected_up_front() {
        let config = ConvertConfig {
            worker_count: 0,
            ..ConvertConfig::default()
        };
        assert!(JobController::new(config).is_err());
    }

    #[test]
    fn test_resolve_end_state() {
        assert_eq!(resolve_end_state(false, 0, 0), BatchState::Complete);
        assert_eq!(resolve_end_state(false, 0, 2), BatchState::PartiallyFailed);
        assert_eq!(resolve_end_state(true, 3, 0), BatchState::Cancelled);
        assert_eq!(resolve_end_state(true, 3, 1), BatchState::Cancelled);
        // Cancel that landed after every task had finished.
        assert_eq!(resolve_end_state(true, 0, 0), BatchState::Complete);
    }
}
