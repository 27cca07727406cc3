//! Server configuration.
//!
//! There is no configuration file and no command-line surface: the binary
//! always runs with [`Config::default`]. Tests and embedders build their own
//! values to point the server at a temporary directory or an ephemeral port.

use std::net::{Ipv4Addr, SocketAddr};
use std::path::PathBuf;

/// Default TCP port the listener binds to.
pub const DEFAULT_PORT: u16 = 26227;

/// Default directory holding one `<name>.db` file per database.
pub const DEFAULT_DATA_DIR: &str = "data";

/// Default number of queued jobs per database before submitters block.
pub const DEFAULT_MAILBOX_CAPACITY: usize = 256;

/// Runtime settings for a [`Server`](crate::server::Server).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Address the listener binds to.
    pub listen_addr: SocketAddr,
    /// Directory under which database files are created.
    pub data_dir: PathBuf,
    /// Bounded mailbox size for every execution context.
    pub mailbox_capacity: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            listen_addr: SocketAddr::from((Ipv4Addr::UNSPECIFIED, DEFAULT_PORT)),
            data_dir: PathBuf::from(DEFAULT_DATA_DIR),
            mailbox_capacity: DEFAULT_MAILBOX_CAPACITY,
        }
    }
}

impl Config {
    /// Returns a copy with a different data directory.
    pub fn with_data_dir(mut self, data_dir: impl Into<PathBuf>) -> Self {
        self.data_dir = data_dir.into();
        self
    }

    /// Returns a copy listening on a different address.
    pub fn with_listen_addr(mut self, listen_addr: SocketAddr) -> Self {
        self.listen_addr = listen_addr;
        self
    }

    /// Returns a copy with a different mailbox capacity.
    ///
    /// A capacity of zero is raised to one when the mailbox is created.
    pub fn with_mailbox_capacity(mut self, mailbox_capacity: usize) -> Self {
        self.mailbox_capacity = mailbox_capacity;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.listen_addr.port(), 26227);
        assert!(config.listen_addr.ip().is_unspecified());
        assert_eq!(config.data_dir, PathBuf::from("data"));
        assert_eq!(config.mailbox_capacity, 256);
    }

    #[test]
    fn test_builder_overrides() {
        let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
        let config = Config::default()
            .with_data_dir("/tmp/roamdb")
            .with_listen_addr(addr)
            .with_mailbox_capacity(4);
        assert_eq!(config.data_dir, PathBuf::from("/tmp/roamdb"));
        assert_eq!(config.listen_addr, addr);
        assert_eq!(config.mailbox_capacity, 4);
    }
}
