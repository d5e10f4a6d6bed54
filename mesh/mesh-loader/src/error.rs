//! Error types for scheduling loads.
//!
//! Failures inside a load are not errors here: they arrive on the event
//! stream as [`LoadEvent::Failed`](crate::LoadEvent::Failed).

use thiserror::Error;

/// Result type for scheduling operations.
pub type LoadResult<T> = Result<T, LoadError>;

/// Errors raised when a load cannot be started.
#[derive(Debug, Error)]
pub enum LoadError {
    /// The worker is still running an earlier load.
    #[error("a load is already in progress on this worker")]
    Busy,

    /// The operating system refused to start the background thread.
    #[error("failed to spawn loader thread: {0}")]
    Spawn(#[source] std::io::Error),

    /// The worker's thread is gone.
    #[error("loader worker has stopped")]
    WorkerStopped,
}
