//! The per-database serialization point.

use std::sync::Arc;

use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tracing::debug;

use crate::engine::worker::Worker;
use crate::engine::{EngineError, Job};
use crate::protocol::Response;
use crate::storage::{Opener, StorageError};

/// Serialized access to one named database.
///
/// Holds the sending side of the database's bounded mailbox. The storage
/// handle itself lives on the worker thread started by [`start`](Self::start)
/// and is never shared.
///
/// Contexts live for the rest of the process once started: there is no
/// shutdown path, and the worker exits only if every clone of the mailbox
/// sender has been dropped.
#[derive(Debug)]
pub struct ExecutionContext {
    name: String,
    mailbox: mpsc::Sender<Job>,
}

impl ExecutionContext {
    /// Spawns the worker for `name`, which opens the storage handle itself.
    ///
    /// Resolves once the handle is open. On failure the worker thread has
    /// already exited and nothing is left behind.
    ///
    /// `name` must not contain NUL bytes (it is used as the thread name).
    pub(crate) async fn start<O: Opener>(
        name: &str,
        opener: Arc<O>,
        mailbox_capacity: usize,
    ) -> Result<Self, EngineError> {
        let (mailbox, jobs) = mpsc::channel(mailbox_capacity.max(1));
        let (ready_tx, ready_rx) = oneshot::channel::<Result<(), StorageError>>();

        let worker_name = name.to_string();
        std::thread::Builder::new()
            .name(format!("roamdb-db-{name}"))
            .spawn(move || {
                let storage = match opener.open(&worker_name) {
                    Ok(storage) => storage,
                    Err(e) => {
                        let _ = ready_tx.send(Err(e));
                        return;
                    }
                };
                if ready_tx.send(Ok(())).is_err() {
                    // Nobody is waiting for this context any more
                    debug!(database = %worker_name, "start abandoned, closing handle");
                    return;
                }
                Worker::new(worker_name, storage, jobs).run();
            })
            .map_err(|source| EngineError::Spawn {
                name: name.to_string(),
                source,
            })?;

        match ready_rx.await {
            Ok(Ok(())) => Ok(Self {
                name: name.to_string(),
                mailbox,
            }),
            Ok(Err(source)) => Err(EngineError::Open {
                name: name.to_string(),
                source,
            }),
            Err(_) => Err(EngineError::WorkerStopped {
                name: name.to_string(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Enqueues a query and waits for its response.
    ///
    /// Waits for a free mailbox slot first when the mailbox is full. Query
    /// failures come back as error responses; `Err` means the worker is gone.
    pub async fn execute(&self, query: String, params: Vec<Value>) -> Result<Response, EngineError> {
        let (job, response) = Job::new(query, params);
        self.submit(job).await?;
        response.await.map_err(|_| self.stopped())
    }

    /// Enqueues a prepared job, waiting for capacity when the mailbox is full.
    pub async fn submit(&self, job: Job) -> Result<(), EngineError> {
        self.mailbox.send(job).await.map_err(|_| self.stopped())
    }

    /// Number of jobs that can be enqueued right now without waiting.
    pub fn available_slots(&self) -> usize {
        self.mailbox.capacity()
    }

    /// Total mailbox capacity.
    pub fn mailbox_capacity(&self) -> usize {
        self.mailbox.max_capacity()
    }

    fn stopped(&self) -> EngineError {
        EngineError::WorkerStopped {
            name: self.name.clone(),
        }
    }
}
