//! Error types for the relay
//!
//! Diagnostics stay local to the component that fails. Only `Error::Bind`
//! is treated as fatal by the binary.

use std::net::SocketAddr;

use thiserror::Error;

/// Result alias used throughout the crate
pub type Result<T> = std::result::Result<T, Error>;

/// Crate-wide error type
#[derive(Debug, Error)]
pub enum Error {
    /// Generic I/O failure
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Listener could not bind; indicates misconfiguration
    #[error("failed to bind {addr}: {source}")]
    Bind {
        addr: SocketAddr,
        #[source]
        source: std::io::Error,
    },

    /// Upstream video source could not be opened
    #[error("cannot open source {uri}: {reason}")]
    SourceUnavailable { uri: String, reason: String },

    /// URI scheme not handled by any source backend
    #[error("unsupported source: {0}")]
    UnsupportedSource(String),

    /// A compressed image from the source could not be decoded
    #[error("decode failed: {0}")]
    Decode(String),

    /// JPEG compression failed
    #[error("encode failed: {0}")]
    Encode(String),

    /// Pixel buffer does not match the declared geometry
    #[error("invalid frame: {width}x{height} needs {expected} bytes, got {actual}")]
    InvalidFrame {
        width: u32,
        height: u32,
        expected: usize,
        actual: usize,
    },

    /// Writing to a viewer failed (reset, broken pipe)
    #[error("client write failed: {0}")]
    ClientWrite(#[source] std::io::Error),
}
