use tokio::sync::mpsc;
use tracing::{debug, trace};

use crate::engine::Job;
use crate::protocol::{Response, Row};
use crate::storage::{QueryOutput, Storage};

/// Drains one database's mailbox against its storage handle.
///
/// Runs on a dedicated OS thread; the handle never leaves it.
pub(crate) struct Worker<S: Storage> {
    name: String,
    storage: S,
    mailbox: mpsc::Receiver<Job>,
}

impl<S: Storage> Worker<S> {
    pub(crate) fn new(name: String, storage: S, mailbox: mpsc::Receiver<Job>) -> Self {
        Self {
            name,
            storage,
            mailbox,
        }
    }

    /// Processes jobs in arrival order until every sender is dropped.
    pub(crate) fn run(mut self) {
        while let Some(job) = self.mailbox.blocking_recv() {
            let response = self.execute(&job.query, &job.params);
            if job.reply.send(response).is_err() {
                debug!(database = %self.name, "requester went away before its reply");
            }
        }
        debug!(database = %self.name, "mailbox closed, worker exiting");
    }

    fn execute(&mut self, query: &str, params: &[serde_json::Value]) -> Response {
        trace!(database = %self.name, query, "executing");
        match self.storage.query(query, params) {
            Ok(output) => materialize(output),
            Err(e) => {
                debug!(database = %self.name, error = %e, "query failed");
                Response::error(e.to_string())
            }
        }
    }
}

/// Turns positional rows into column-name-to-value mappings.
fn materialize(output: QueryOutput) -> Response {
    let QueryOutput { columns, rows } = output;
    let rows = rows
        .into_iter()
        .map(|values| {
            columns
                .iter()
                .cloned()
                .zip(values)
                .collect::<Row>()
        })
        .collect();
    Response::ok(columns, rows)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_materialize_rows() {
        let response = materialize(QueryOutput {
            columns: vec!["id".to_string(), "name".to_string()],
            rows: vec![
                vec![json!(1), json!("a")],
                vec![json!(2), json!(null)],
            ],
        });
        assert_eq!(response.columns, vec!["id", "name"]);
        assert_eq!(response.rows.len(), 2);
        assert_eq!(response.rows[0]["name"], json!("a"));
        assert_eq!(response.rows[1]["name"], json!(null));
        let keys: Vec<_> = response.rows[0].keys().cloned().collect();
        assert_eq!(keys, vec!["id", "name"]);
        assert!(!response.is_error());
    }

    #[test]
    fn test_materialize_no_result_set() {
        let response = materialize(QueryOutput::default());
        assert_eq!(response, Response::ok(vec![], vec![]));
    }
}
