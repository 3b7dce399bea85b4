#![allow(clippy::missing_errors_doc)] // Allow public functions without # Errors sections
#![allow(clippy::must_use_candidate)] // Allow methods without must_use when context is clear

//! # Convert Core
//!
//! Concurrent file-conversion pipeline: a bounded worker pool runs one
//! task per selected file, each task streams progress events to a single
//! consumer, and a cancel-all signal stops in-flight and queued work at
//! the next checkpoint.
//!
//! The conversion itself is a same-bytes copy into
//! `<output root>/converted_<file name>`; the selected conversion kind is
//! a label threaded into progress messages. The interesting machinery is
//! the pipeline around it.
//!
//! ## Module Organization
//!
//! - [`conversion`] - Task domain: kinds, states, and the per-file task
//! - [`execution`] - Worker pool and cooperative cancellation
//! - [`events`] - Status events, the bounded progress channel, and sinks
//! - [`batch`] - Job controller, batch aggregation, and cancel-all
//! - [`config`] - Configuration management
//! - [`error`] - Structured error handling
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use convert_core::{ConversionKind, ConvertConfig, JobController};
//! use std::path::PathBuf;
//!
//! # async fn example() -> convert_core::Result<()> {
//! let controller = JobController::new(ConvertConfig::default())?;
//! let handle = controller
//!     .start_batch(vec![PathBuf::from("report.pdf")], ConversionKind::PdfToDocx)
//!     .await?;
//! let summary = handle.wait().await;
//! println!("{} of {} files converted", summary.completed, summary.total);
//! # Ok(())
//! # }
//! ```

pub mod batch;
pub mod config;
pub mod conversion;
pub mod error;
pub mod events;
pub mod execution;
pub mod logging;

pub use batch::{BatchHandle, BatchState, BatchSummary, JobController};
pub use config::ConvertConfig;
pub use conversion::{ConversionKind, ConversionTask, TaskState};
pub use error::{ConvertError, Result};
pub use events::{
    MemorySink, ProgressEvent, ProgressReporter, ProgressSink, StatusEvent, TracingSink,
};
pub use execution::{CancellationToken, PoolError, TaskHandle, WorkerPool};
