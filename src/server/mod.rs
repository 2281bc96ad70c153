//! MJPEG streaming server
//!
//! Accepts viewer connections and hands each one to an independent
//! [`ClientSession`](crate::session::ClientSession).

pub mod config;
pub mod listener;

pub use config::ServerConfig;
pub use listener::StreamingServer;
