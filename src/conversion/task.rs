use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::conversion::{ConversionKind, TaskState};
use crate::error::ConvertError;
use crate::events::ProgressReporter;
use crate::execution::CancellationToken;

/// One file's unit of conversion work, run by exactly one pool worker.
///
/// The task value is immutable; observable state lives in the pool's
/// `TaskHandle` and the batch aggregation. `run` performs the simulated
/// step sequence and then copies the source bytes to the output path
/// (the conversion itself is a same-bytes copy).
#[derive(Debug, Clone)]
pub struct ConversionTask {
    task_id: Uuid,
    source: PathBuf,
    output: PathBuf,
    kind: ConversionKind,
    steps: u32,
    step_delay: Duration,
}

impl ConversionTask {
    /// Build a task for `source`, writing to
    /// `<output_root>/converted_<file name>`.
    ///
    /// `steps` must be at most 100; each step maps onto one percent point.
    pub fn new(
        source: PathBuf,
        output_root: &Path,
        kind: ConversionKind,
        steps: u32,
        step_delay: Duration,
    ) -> Self {
        debug_assert!(steps <= 100, "steps map one-to-one onto percent points");
        let file_name = source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string());
        let output = output_root.join(format!("converted_{file_name}"));
        Self {
            task_id: Uuid::new_v4(),
            source,
            output,
            kind,
            steps,
            step_delay,
        }
    }

    pub fn task_id(&self) -> Uuid {
        self.task_id
    }

    pub fn source(&self) -> &Path {
        &self.source
    }

    pub fn output(&self) -> &Path {
        &self.output
    }

    pub fn kind(&self) -> ConversionKind {
        self.kind
    }

    /// Source file name used in progress messages.
    pub fn source_name(&self) -> String {
        self.source
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string())
    }

    /// Output file name used in the save/failure message.
    pub fn output_name(&self) -> String {
        self.output
            .file_name()
            .map(|name| name.to_string_lossy().into_owned())
            .unwrap_or_else(|| "unnamed".to_string())
    }

    /// Execute the task to a terminal state.
    ///
    /// The cancellation token is polled before every step and once more
    /// before the final copy; cancellation between those checkpoints is
    /// deferred to the next one. Percent values are the step index,
    /// strictly increasing from 0.
    pub async fn run(&self, token: &CancellationToken, reporter: &ProgressReporter) -> TaskState {
        let name = self.source_name();

        for step in 0..self.steps {
            if token.is_cancelled() {
                return self.finish_cancelled(reporter, &name).await;
            }
            tokio::time::sleep(self.step_delay).await;
            reporter
                .task_progress(
                    self.task_id,
                    format!("{name}: {} - {step}% complete", self.kind),
                    step as u8,
                )
                .await;
        }

        // Last checkpoint before the copy; a cancel arriving after this
        // point lets the task complete (accepted race window).
        if token.is_cancelled() {
            return self.finish_cancelled(reporter, &name).await;
        }

        match self.copy_to_output().await {
            Ok(bytes) => {
                debug!(
                    task_id = %self.task_id,
                    output = %self.output.display(),
                    bytes,
                    "converted file written"
                );
                reporter
                    .task_finished(
                        self.task_id,
                        TaskState::Complete,
                        format!("Saved converted file: {}", self.output_name()),
                    )
                    .await;
                TaskState::Complete
            }
            Err(err) => {
                warn!(task_id = %self.task_id, error = %err, "output write failed");
                reporter
                    .task_finished(
                        self.task_id,
                        TaskState::Failed,
                        format!("Failed to save file: {}: {err}", self.output_name()),
                    )
                    .await;
                TaskState::Failed
            }
        }
    }

    async fn finish_cancelled(&self, reporter: &ProgressReporter, name: &str) -> TaskState {
        debug!(task_id = %self.task_id, "task cancelled at checkpoint");
        reporter
            .task_finished(
                self.task_id,
                TaskState::Cancelled,
                format!("{name}: conversion cancelled"),
            )
            .await;
        TaskState::Cancelled
    }

    /// Create the output directory if absent, then copy the source bytes,
    /// replacing any existing output file. Directory creation is
    /// idempotent under concurrent callers.
    async fn copy_to_output(&self) -> Result<u64, ConvertError> {
        if let Some(parent) = self.output.parent() {
            tokio::fs::create_dir_all(parent)
                .await
                .map_err(|source| ConvertError::OutputWriteFailed {
                    path: parent.to_path_buf(),
                    source,
                })?;
        }
        tokio::fs::copy(&self.source, &self.output)
            .await
            .map_err(|source| ConvertError::OutputWriteFailed {
                path: self.output.clone(),
                source,
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::StatusEvent;

    fn test_task(source: PathBuf, output_root: &Path, steps: u32) -> ConversionTask {
        ConversionTask::new(
            source,
            output_root,
            ConversionKind::ResizeImage,
            steps,
            Duration::from_millis(1),
        )
    }

    async fn drain_events(mut rx: tokio::sync::mpsc::Receiver<StatusEvent>) -> Vec<StatusEvent> {
        let mut events = Vec::new();
        while let Some(event) = rx.recv().await {
            events.push(event);
        }
        events
    }

    #[tokio::test]
    async fn test_run_copies_file_and_reports_completion() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("a.txt");
        tokio::fs::write(&source, b"hello world").await.unwrap();
        let output_root = dir.path().join("out");

        let task = test_task(source, &output_root, 3);
        let (reporter, rx) = ProgressReporter::channel(64);
        let token = CancellationToken::new();

        let state = task.run(&token, &reporter).await;
        assert_eq!(state, TaskState::Complete);

        drop(reporter);
        let events = drain_events(rx).await;
        assert_eq!(events.len(), 4);

        let percents: Vec<u8> = events
            .iter()
            .filter_map(|event| match event {
                StatusEvent::TaskProgress(ev) => ev.percent,
                _ => None,
            })
            .collect();
        assert_eq!(percents, vec![0, 1, 2]);

        match events.last().unwrap() {
            StatusEvent::TaskFinished { state, message, .. } => {
                assert_eq!(*state, TaskState::Complete);
                assert_eq!(message, "Saved converted file: converted_a.txt");
            }
            other => panic!("expected TaskFinished, got {other:?}"),
        }

        let copied = tokio::fs::read(output_root.join("converted_a.txt"))
            .await
            .unwrap();
        assert_eq!(copied, b"hello world");
    }

    #[tokio::test]
    async fn test_cancelled_before_start_skips_work() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("b.txt");
        tokio::fs::write(&source, b"data").await.unwrap();
        let output_root = dir.path().join("out");

        let task = test_task(source, &output_root, 50);
        let (reporter, rx) = ProgressReporter::channel(64);
        let token = CancellationToken::new();
        token.cancel();

        let state = task.run(&token, &reporter).await;
        assert_eq!(state, TaskState::Cancelled);

        drop(reporter);
        let events = drain_events(rx).await;
        assert_eq!(events.len(), 1);
        assert!(matches!(
            events[0],
            StatusEvent::TaskFinished {
                state: TaskState::Cancelled,
                ..
            }
        ));
        assert!(!output_root.join("converted_b.txt").exists());
    }

    #[tokio::test]
    async fn test_missing_source_reports_failed() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("does-not-exist.txt");
        let output_root = dir.path().join("out");

        let task = test_task(source, &output_root, 1);
        let (reporter, rx) = ProgressReporter::channel(16);
        let token = CancellationToken::new();

        let state = task.run(&token, &reporter).await;
        assert_eq!(state, TaskState::Failed);

        drop(reporter);
        let events = drain_events(rx).await;
        match events.last().unwrap() {
            StatusEvent::TaskFinished { state, message, .. } => {
                assert_eq!(*state, TaskState::Failed);
                assert!(message.starts_with("Failed to save file: converted_does-not-exist.txt"));
            }
            other => panic!("expected TaskFinished, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_output_replaces_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("c.txt");
        tokio::fs::write(&source, b"new contents").await.unwrap();
        let output_root = dir.path().join("out");
        tokio::fs::create_dir_all(&output_root).await.unwrap();
        tokio::fs::write(output_root.join("converted_c.txt"), b"stale")
            .await
            .unwrap();

        let task = test_task(source, &output_root, 1);
        let (reporter, _rx) = ProgressReporter::channel(16);
        let token = CancellationToken::new();

        let state = task.run(&token, &reporter).await;
        assert_eq!(state, TaskState::Complete);

        let copied = tokio::fs::read(output_root.join("converted_c.txt"))
            .await
            .unwrap();
        assert_eq!(copied, b"new contents");
    }
}
