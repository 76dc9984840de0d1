//! Unix socket transport between capture clients and the daemon.

pub mod client;
pub mod protocol;
pub mod server;

pub use client::{SessionClient, send_request};
pub use protocol::{Request, Response};
pub use server::{IpcServer, SessionHandler};
