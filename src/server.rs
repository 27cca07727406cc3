//! TCP server for JSON query connections.
//!
//! This module provides the network layer that accepts client connections
//! and routes their requests to per-database execution contexts.
//!
//! ## Architecture
//!
//! ```text
//! +--------+
//! | Server |  <- Accepts TCP connections
//! +--------+
//!      |
//!      v
//! +------------+     +----------+
//! | Connection | --> | Registry |  <- name -> ExecutionContext, created lazily
//! +------------+     +----------+
//!      |                  |
//!      |   Job            v
//!      +-------> ExecutionContext mailbox --> worker --> storage
//! ```
//!
//! ## Terminology
//!
//! - **Server**: TCP listener that spawns connections
//! - **Connection**: per-client request/response loop
//! - **Registry**: process-wide directory of execution contexts

pub mod connection;
pub mod listener;
pub mod registry;

pub use connection::{Connection, ConnectionError};
pub use listener::Server;
pub use registry::{Registry, RegistryError};
