//! Per-database execution contexts.
//!
//! An [`ExecutionContext`] is the only path to a database's storage handle.
//! Connections submit [`Job`]s into its bounded mailbox; one dedicated worker
//! thread owns the handle and drains the mailbox in arrival order, so at most
//! one query runs against a given handle at any time.
//!
//! # Architecture
//!
//! ```text
//!  Connection 1 --+
//!  Connection 2 --+--> mailbox (bounded mpsc) --> Worker thread --> Storage
//!  Connection 3 --+        ^                         |
//!                          |                         v
//!                    backpressure            oneshot reply per Job
//! ```

mod error;
mod exec_context;
mod job;
mod worker;

pub use error::EngineError;
pub use exec_context::ExecutionContext;
pub use job::Job;
