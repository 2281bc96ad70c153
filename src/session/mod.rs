//! Viewer session management
//!
//! Each accepted connection gets its own [`ClientSession`]. Sessions share
//! nothing but the frame slot, which they only read.

pub mod client;
pub mod state;

pub use client::ClientSession;
pub use state::{SessionPhase, SessionState};
