use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use tokio::net::{TcpListener, TcpStream};
use tracing::{Instrument, debug, info_span, warn};

use crate::config::Config;
use crate::server::connection::Connection;
use crate::server::registry::Registry;
use crate::storage::{Opener, SqliteOpener};

/// Pause after a failed accept so a persistent failure (e.g. EMFILE) does
/// not spin.
const ACCEPT_BACKOFF: Duration = Duration::from_millis(50);

/// Source of incoming connections for the accept loop.
pub(crate) trait Accept: Send + Sync {
    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send;
}

impl Accept for TcpListener {
    fn accept(&self) -> impl Future<Output = io::Result<(TcpStream, SocketAddr)>> + Send {
        TcpListener::accept(self)
    }
}

/// TCP server speaking the JSON query protocol.
pub struct Server<O: Opener> {
    listener: TcpListener,
    next_id: AtomicU64,
    registry: Arc<Registry<O>>,
}

impl Server<SqliteOpener> {
    /// Binds `config.listen_addr` and serves SQLite databases from
    /// `config.data_dir`.
    pub async fn bind(config: &Config) -> std::io::Result<Self> {
        let listener = TcpListener::bind(config.listen_addr).await?;
        let registry = Registry::new(
            SqliteOpener::new(config.data_dir.clone()),
            config.mailbox_capacity,
        );
        Ok(Self::new(listener, Arc::new(registry)))
    }
}

impl<O: Opener> Server<O> {
    /// Creates a new server with a given listener and registry.
    pub fn new(listener: TcpListener, registry: Arc<Registry<O>>) -> Self {
        Self {
            listener,
            next_id: AtomicU64::new(1),
            registry,
        }
    }

    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn registry(&self) -> &Arc<Registry<O>> {
        &self.registry
    }

    /// Accepts connections forever, one task per client.
    ///
    /// Accept failures are logged and do not stop the loop.
    pub async fn serve(self) {
        accept_loop(&self.listener, &self.next_id, &self.registry).await
    }
}

async fn accept_loop<A: Accept, O: Opener>(
    acceptor: &A,
    next_id: &AtomicU64,
    registry: &Arc<Registry<O>>,
) {
    loop {
        let (socket, peer_addr) = match acceptor.accept().await {
            Ok(accepted) => accepted,
            Err(e) => {
                warn!(error = %e, "accept failed");
                tokio::time::sleep(ACCEPT_BACKOFF).await;
                continue;
            }
        };
        if let Err(e) = socket.set_nodelay(true) {
            debug!(peer = %peer_addr, error = %e, "could not set TCP_NODELAY");
        }

        let id = next_id.fetch_add(1, Ordering::Relaxed);
        let registry = Arc::clone(registry);
        let span = info_span!("conn", id, peer = %peer_addr);

        tokio::spawn(
            async move {
                debug!("accepted connection");
                let mut connection = Connection::new(socket, id, registry);
                if let Err(e) = connection.run().await {
                    warn!(error = %e, "connection error");
                }
                debug!("connection closed");
            }
            .instrument(span),
        );
    }
}
