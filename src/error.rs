use std::path::PathBuf;

/// Crate-wide error taxonomy.
///
/// Per-task I/O failures are reported on the status channel and never
/// propagated as batch errors; only up-front validation and submission
/// problems surface through this type.
#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("no files selected")]
    NoFilesSelected,

    #[error("worker pool closed")]
    PoolClosed,

    #[error("failed to write output {path}: {source}")]
    OutputWriteFailed {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("configuration error: {0}")]
    Configuration(String),
}

impl From<crate::execution::PoolError> for ConvertError {
    fn from(_: crate::execution::PoolError) -> Self {
        ConvertError::PoolClosed
    }
}

pub type Result<T> = std::result::Result<T, ConvertError>;
