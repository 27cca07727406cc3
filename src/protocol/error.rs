use thiserror::Error;

/// Errors raised while framing or (de)serializing documents.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("malformed document: {0}")]
    Json(#[from] serde_json::Error),

    #[error("document exceeds {limit} bytes")]
    DocumentTooLarge { limit: usize },

    #[error("stream ended inside a document ({remaining} bytes buffered)")]
    Truncated { remaining: usize },
}
