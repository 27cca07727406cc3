use std::collections::HashMap;
use std::sync::Arc;

use thiserror::Error;
use tokio::sync::Mutex;
use tracing::info;

use crate::engine::{EngineError, ExecutionContext};
use crate::storage::Opener;

/// Errors returned by [`Registry::resolve`].
#[derive(Debug, Error)]
pub enum RegistryError {
    #[error("invalid database name {0:?}")]
    InvalidName(String),

    #[error(transparent)]
    Engine(#[from] EngineError),
}

/// The process-wide directory of execution contexts, keyed by database name.
///
/// Starts empty and only ever grows: a context is created the first time its
/// name is resolved and is kept until the process exits.
///
/// The map is guarded by an async mutex held for the whole lookup-or-create,
/// including the wait for a new handle to open, so two concurrent first
/// references to a name open exactly one handle.
pub struct Registry<O: Opener> {
    opener: Arc<O>,
    mailbox_capacity: usize,
    contexts: Mutex<HashMap<String, Arc<ExecutionContext>>>,
}

impl<O: Opener> Registry<O> {
    pub fn new(opener: O, mailbox_capacity: usize) -> Self {
        Self {
            opener: Arc::new(opener),
            mailbox_capacity,
            contexts: Mutex::new(HashMap::new()),
        }
    }

    /// Returns the context for `name`, starting it on first use.
    ///
    /// Nothing is registered when the handle fails to open, so a later call
    /// tries again.
    pub async fn resolve(&self, name: &str) -> Result<Arc<ExecutionContext>, RegistryError> {
        validate_name(name)?;

        let mut contexts = self.contexts.lock().await;
        if let Some(ctx) = contexts.get(name) {
            return Ok(Arc::clone(ctx));
        }

        let ctx = Arc::new(
            ExecutionContext::start(name, Arc::clone(&self.opener), self.mailbox_capacity).await?,
        );
        contexts.insert(name.to_string(), Arc::clone(&ctx));
        info!(database = name, total = contexts.len(), "opened database");
        Ok(ctx)
    }

    pub fn opener(&self) -> &O {
        &self.opener
    }

    /// Number of databases opened so far.
    pub async fn len(&self) -> usize {
        self.contexts.lock().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.contexts.lock().await.is_empty()
    }

    pub async fn contains(&self, name: &str) -> bool {
        self.contexts.lock().await.contains_key(name)
    }
}

/// Rejects names that would not map to a single file inside the data
/// directory.
fn validate_name(name: &str) -> Result<(), RegistryError> {
    let invalid = name.is_empty()
        || name == "."
        || name == ".."
        || name.contains(['/', '\\', '\0']);
    if invalid {
        return Err(RegistryError::InvalidName(name.to_string()));
    }
    Ok(())
}
