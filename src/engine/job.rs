use serde_json::Value;
use tokio::sync::oneshot;

use crate::protocol::Response;

/// One query queued for a database's worker.
///
/// The reply sender is consumed when the worker answers, so every job
/// receives exactly one [`Response`].
#[derive(Debug)]
pub struct Job {
    pub query: String,
    pub params: Vec<Value>,
    pub reply: oneshot::Sender<Response>,
}

impl Job {
    /// Creates a job and the receiver its response will arrive on.
    pub fn new(query: String, params: Vec<Value>) -> (Self, oneshot::Receiver<Response>) {
        let (reply, response) = oneshot::channel();
        (
            Self {
                query,
                params,
                reply,
            },
            response,
        )
    }
}
