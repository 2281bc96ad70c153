//! Frame sources
//!
//! A source is opened once and then pulled frame by frame:
//!
//! ```text
//! open(config) ──► Box<dyn FrameReader>
//!                      │ next_frame()
//!                      ├──► Pull::Frame(frame)
//!                      ├──► Pull::Gap       (transient, skip)
//!                      └──► Pull::End       (source gone, no reconnect)
//! ```
//!
//! Backends are selected by URI:
//! - `pattern://[WxH][@FPS]`: synthetic test pattern, no external process
//! - anything else: decoded by an `ffmpeg` child process

pub mod config;
pub mod ffmpeg;
pub mod pattern;
pub mod producer;

pub use config::SourceConfig;
pub use ffmpeg::{FfmpegReader, JpegSplitter};
pub use pattern::PatternReader;
pub use producer::{FrameProducer, ProducerStats};

use crate::error::{Error, Result};
use crate::media::Frame;

/// URI prefix of the built-in test pattern
pub const PATTERN_SCHEME: &str = "pattern://";

/// Result of asking a source for its next frame
#[derive(Debug)]
pub enum Pull {
    /// A decoded frame at the source's native size
    Frame(Frame),
    /// Nothing usable this time; try again
    Gap,
    /// The source is exhausted or lost
    End,
}

/// An opened video source
///
/// Calls block until the next frame is available.
pub trait FrameReader: Send {
    fn next_frame(&mut self) -> Pull;
}

/// Open the source named by `config.uri`
pub fn open(config: &SourceConfig) -> Result<Box<dyn FrameReader>> {
    if config.uri.is_empty() {
        return Err(Error::UnsupportedSource("empty source URI".into()));
    }

    if let Some(params) = config.uri.strip_prefix(PATTERN_SCHEME) {
        return Ok(Box::new(PatternReader::from_params(params)?));
    }

    Ok(Box::new(FfmpegReader::open(config)?))
}
