//! Wire protocol: one JSON document per request and per response.
//!
//! ## Architecture
//!
//! ```text
//! +----------+                       +----------+
//! |  Client  |  ---- Request   --->  |  Server  |
//! |          |  <--- Response  ----  | (roamdb) |
//! +----------+                       +----------+
//!               ^               ^
//!               |   JsonCodec   |
//!               +---------------+
//! ```
//!
//! Documents are pipelined over one persistent stream with no length prefix.
//! The decoder relies on JSON's self-terminating structure to find document
//! boundaries; the encoder writes one document per line.
//!
//! ## Terminology
//!
//! - **Request**: a query against a named database, with positional parameters
//! - **Response**: column names and rows on success, an error message on failure
//! - **Row**: one result row as a column-name-to-value mapping

pub mod codec;
pub mod error;
pub mod types;

pub use codec::{ClientCodec, DEFAULT_MAX_DOCUMENT_SIZE, JsonCodec, ServerCodec};
pub use error::ProtocolError;
pub use types::{Request, Response, Row};
