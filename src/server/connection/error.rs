use thiserror::Error;

use crate::engine::EngineError;
use crate::protocol::ProtocolError;

/// Connection error types.
///
/// Undecodable requests are not errors: they end the connection quietly.
#[derive(Debug, Error)]
pub enum ConnectionError {
    /// Writing a response failed.
    #[error("write error: {0}")]
    Write(#[from] ProtocolError),

    /// The database's worker stopped while a request was outstanding.
    #[error(transparent)]
    Engine(#[from] EngineError),
}
