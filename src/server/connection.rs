mod error;

pub use error::ConnectionError;

use std::sync::Arc;

use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio_util::codec::Framed;
use tracing::{debug, warn};

use crate::protocol::{Request, Response, ServerCodec};
use crate::server::registry::Registry;
use crate::storage::Opener;

/// A single client connection.
///
/// Alternates between reading one request and waiting for its response, so
/// at most one request per connection is in flight. Apart from the socket,
/// the only shared state it touches is the [`Registry`] and the mailbox of
/// the context a request resolves to.
pub struct Connection<O: Opener> {
    framed: Framed<TcpStream, ServerCodec>,
    id: u64,
    registry: Arc<Registry<O>>,
}

impl<O: Opener> Connection<O> {
    pub fn new(socket: TcpStream, id: u64, registry: Arc<Registry<O>>) -> Self {
        Self {
            framed: Framed::new(socket, ServerCodec::new()),
            id,
            registry,
        }
    }

    /// Serves requests until the client disconnects or sends something
    /// undecodable.
    pub async fn run(&mut self) -> Result<(), ConnectionError> {
        while let Some(request) = self.read_request().await {
            if !self.dispatch(request).await? {
                break;
            }
        }
        Ok(())
    }

    /// Reads the next request. `None` ends the connection without a reply,
    /// whether the stream ended cleanly or the document was malformed.
    async fn read_request(&mut self) -> Option<Request> {
        match self.framed.next().await {
            Some(Ok(request)) => Some(request),
            Some(Err(e)) => {
                debug!(conn = self.id, error = %e, "dropping connection on undecodable request");
                None
            }
            None => None,
        }
    }

    /// Runs one request to completion. Returns false if the connection
    /// should close after the response is written.
    async fn dispatch(&mut self, request: Request) -> Result<bool, ConnectionError> {
        let Request {
            database,
            query,
            params,
        } = request;

        let ctx = match self.registry.resolve(&database).await {
            Ok(ctx) => ctx,
            Err(e) => {
                warn!(conn = self.id, database = %database, error = %e, "cannot resolve database");
                self.send(Response::error(e.to_string())).await?;
                return Ok(false);
            }
        };

        match ctx.execute(query, params).await {
            Ok(response) => {
                self.send(response).await?;
                Ok(true)
            }
            Err(e) => {
                self.send(Response::error(e.to_string())).await?;
                Err(e.into())
            }
        }
    }

    async fn send(&mut self, response: Response) -> Result<(), ConnectionError> {
        self.framed.send(response).await?;
        Ok(())
    }
}
