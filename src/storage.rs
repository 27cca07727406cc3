//! Storage engine seam.
//!
//! The dispatch layer never talks to SQLite directly: it opens one
//! [`Storage`] handle per database name through an [`Opener`] and hands that
//! handle to the database's worker, which is its only user.
//!
//! # Architecture
//!
//! ```text
//! +-------------------+
//! | Registry          |  <- opens once per name
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! | Opener / Storage  |  <- traits
//! +-------------------+
//!          |
//!          v
//! +-------------------+
//! | SqliteStorage     |  <- rusqlite, <data_dir>/<name>.db
//! +-------------------+
//! ```

pub mod error;
pub mod sqlite;
pub mod traits;

pub use error::StorageError;
pub use sqlite::{SqliteOpener, SqliteStorage};
pub use traits::{Opener, QueryOutput, Storage};
