//! Engine-level errors.

use thiserror::Error;

use crate::storage::StorageError;

/// Errors that can occur while starting or talking to an execution context.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The storage handle could not be opened.
    #[error("unable to open database \"{name}\": {source}")]
    Open { name: String, source: StorageError },

    /// The worker thread could not be spawned.
    #[error("unable to start worker for database \"{name}\": {source}")]
    Spawn {
        name: String,
        source: std::io::Error,
    },

    /// The worker is gone; its mailbox no longer accepts jobs.
    #[error("worker for database \"{name}\" has stopped")]
    WorkerStopped { name: String },
}
