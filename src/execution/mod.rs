//! Bounded task execution: the worker pool and cooperative cancellation.

pub mod cancellation;
pub mod worker_pool;

pub use cancellation::CancellationToken;
pub use worker_pool::{PoolError, TaskHandle, WorkerPool};
