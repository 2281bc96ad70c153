//! Live camera relay
//!
//! Pulls frames from a remote video source on a dedicated thread, keeps only
//! the latest one in a shared [`FrameSlot`], and streams it to any number of
//! HTTP viewers as `multipart/x-mixed-replace` JPEG.
//!
//! ```text
//!   [FrameProducer thread] ──publish──► FrameSlot ◄──wait_newer── [ClientSession] ──► TCP
//!                                           ▲
//!                                           ├──────wait_newer── [ClientSession] ──► TCP
//!                                           └──────wait_newer── [ClientSession] ──► TCP
//! ```
//!
//! A separate, unrelated [`command`] server accepts line-based robot motion
//! commands.

pub mod command;
pub mod error;
pub mod media;
pub mod protocol;
pub mod server;
pub mod session;
pub mod slot;
pub mod source;
pub mod stats;

pub use error::{Error, Result};
pub use media::{Frame, JpegEncoder, PixelFormat};
pub use server::{ServerConfig, StreamingServer};
pub use slot::{FrameSlot, FrameSnapshot};
pub use source::{FrameProducer, SourceConfig};
