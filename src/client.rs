//! A minimal async client for the JSON query protocol.

use futures_util::{SinkExt, StreamExt};
use serde_json::Value;
use thiserror::Error;
use tokio::net::{TcpStream, ToSocketAddrs};
use tokio_util::codec::Framed;

use crate::protocol::{ClientCodec, ProtocolError, Request, Response};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("server closed the connection")]
    Closed,
}

/// A connection bound to one database name.
///
/// Queries are sent one at a time; each call waits for its response.
pub struct Client {
    framed: Framed<TcpStream, ClientCodec>,
    database: String,
}

impl Client {
    pub async fn connect(
        addr: impl ToSocketAddrs,
        database: impl Into<String>,
    ) -> Result<Self, ClientError> {
        let socket = TcpStream::connect(addr).await?;
        socket.set_nodelay(true)?;
        Ok(Self {
            framed: Framed::new(socket, ClientCodec::new()),
            database: database.into(),
        })
    }

    /// Runs `sql` against this client's database.
    ///
    /// Query failures are reported in [`Response::error`], not as `Err`.
    pub async fn query(&mut self, sql: &str, params: Vec<Value>) -> Result<Response, ClientError> {
        let request = Request::new(self.database.clone(), sql, params);
        self.request(request).await
    }

    /// Sends an arbitrary request (possibly for another database) on this
    /// connection.
    pub async fn request(&mut self, request: Request) -> Result<Response, ClientError> {
        self.framed.send(request).await?;
        match self.framed.next().await {
            Some(response) => Ok(response?),
            None => Err(ClientError::Closed),
        }
    }
}
