//! Fixed-capacity worker pool for conversion tasks.

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{mpsc, watch, Mutex};
use tracing::{debug, info};
use uuid::Uuid;

use crate::conversion::{ConversionTask, TaskState};
use crate::events::ProgressReporter;
use crate::execution::CancellationToken;

/// Bounded-parallelism execution for submitted tasks.
///
/// `capacity` worker loops share one FIFO queue, so at most `capacity`
/// tasks are ever running concurrently; excess submissions wait in
/// submission order. `shutdown_now` stops intake, signals the shared
/// cancellation token, and discards queued-but-not-started tasks without
/// running them.
pub struct WorkerPool {
    jobs: mpsc::UnboundedSender<PoolJob>,
    token: CancellationToken,
    closed: Arc<AtomicBool>,
    capacity: usize,
}

struct PoolJob {
    task: ConversionTask,
    reporter: ProgressReporter,
    state_tx: watch::Sender<TaskState>,
}

/// Observer handle for one submitted task.
#[derive(Debug)]
pub struct TaskHandle {
    task_id: Uuid,
    source: PathBuf,
    output: PathBuf,
    state_rx: watch::Receiver<TaskState>,
}

impl TaskHandle {
    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn source(&self) -> &std::path::Path {
        &self.source
    }

    pub fn output(&self) -> &std::path::Path {
        &self.output
    }

    /// Most recently observed state.
    pub fn state(&self) -> TaskState {
        *self.state_rx.borrow()
    }

    /// A watch receiver over the task's state transitions.
    pub fn watch(&self) -> watch::Receiver<TaskState> {
        self.state_rx.clone()
    }

    /// Wait until the task reaches a terminal state and return it.
    pub async fn wait_terminal(&mut self) -> TaskState {
        loop {
            let state = *self.state_rx.borrow_and_update();
            if state.is_terminal() {
                return state;
            }
            if self.state_rx.changed().await.is_err() {
                return *self.state_rx.borrow();
            }
        }
    }
}

/// Worker pool errors
#[derive(Debug, PartialEq, Eq, thiserror::Error)]
pub enum PoolError {
    #[error("pool closed: submissions are no longer accepted")]
    Closed,
}

impl WorkerPool {
    /// Create a pool and spawn its worker loops. Must be called from
    /// within a tokio runtime.
    pub fn new(capacity: usize, token: CancellationToken) -> Self {
        let capacity = capacity.max(1);
        let (jobs, queue) = mpsc::unbounded_channel::<PoolJob>();
        let queue = Arc::new(Mutex::new(queue));

        for worker_id in 0..capacity {
            let queue = queue.clone();
            let token = token.clone();
            tokio::spawn(worker_loop(worker_id, queue, token));
        }
        debug!(capacity, "worker pool started");

        Self {
            jobs,
            token,
            closed: Arc::new(AtomicBool::new(false)),
            capacity,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Shared token cancelled by `shutdown_now`; tasks poll it between
    /// steps.
    pub fn cancellation_token(&self) -> CancellationToken {
        self.token.clone()
    }

    /// Queue a task for execution.
    pub fn submit(
        &self,
        task: ConversionTask,
        reporter: ProgressReporter,
    ) -> Result<TaskHandle, PoolError> {
        if self.closed.load(Ordering::Acquire) {
            return Err(PoolError::Closed);
        }

        let task_id = task.task_id();
        let source = task.source().to_path_buf();
        let output = task.output().to_path_buf();
        let (state_tx, state_rx) = watch::channel(TaskState::Pending);

        self.jobs
            .send(PoolJob {
                task,
                reporter,
                state_tx,
            })
            .map_err(|_| PoolError::Closed)?;

        debug!(%task_id, source = %source.display(), "task queued");
        Ok(TaskHandle {
            task_id,
            source,
            output,
            state_rx,
        })
    }

    /// Stop accepting submissions, cancel running tasks at their next
    /// checkpoint, and discard queued tasks without running them.
    pub fn shutdown_now(&self) {
        self.closed.store(true, Ordering::Release);
        self.token.cancel();
        info!("worker pool shutdown requested");
    }
}

async fn worker_loop(
    worker_id: usize,
    queue: Arc<Mutex<mpsc::UnboundedReceiver<PoolJob>>>,
    token: CancellationToken,
) {
    loop {
        let job = {
            let mut queue = queue.lock().await;
            queue.recv().await
        };
        let Some(job) = job else {
            debug!(worker_id, "queue closed, worker exiting");
            break;
        };

        if token.is_cancelled() {
            // Queued before shutdown; resolve without starting it.
            let name = job.task.source_name();
            debug!(worker_id, task_id = %job.task.task_id(), "discarding queued task");
            job.reporter
                .task_finished(
                    job.task.task_id(),
                    TaskState::Cancelled,
                    format!("{name}: conversion cancelled before start"),
                )
                .await;
            let _ = job.state_tx.send(TaskState::Cancelled);
            continue;
        }

        let _ = job.state_tx.send(TaskState::Running);
        let state = job.task.run(&token, &job.reporter).await;
        let _ = job.state_tx.send(state);
    }
}
