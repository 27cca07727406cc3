pub mod client;
pub mod config;
pub mod engine;
pub mod protocol;
pub mod server;
pub mod storage;

pub use client::{Client, ClientError};
pub use config::Config;
pub use protocol::{Request, Response, Row};
pub use server::Server;
