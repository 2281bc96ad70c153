//! Video source configuration

use std::path::PathBuf;

/// Default output resolution
pub const DEFAULT_WIDTH: u32 = 640;
pub const DEFAULT_HEIGHT: u32 = 480;

/// Largest side a JPEG image can have
pub const MAX_DIMENSION: u32 = 65_535;

/// Where frames come from and what size they are published at
#[derive(Debug, Clone)]
pub struct SourceConfig {
    /// Source URI (`rtsp://...`, `http://...`, a file path, or `pattern://`)
    pub uri: String,

    /// Width every published frame is resized to
    pub width: u32,

    /// Height every published frame is resized to
    pub height: u32,

    /// ffmpeg executable used for network and file sources
    pub ffmpeg_path: PathBuf,

    /// RTSP lower transport passed to ffmpeg ("tcp" or "udp")
    pub rtsp_transport: String,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            uri: "pattern://".into(),
            width: DEFAULT_WIDTH,
            height: DEFAULT_HEIGHT,
            ffmpeg_path: PathBuf::from("ffmpeg"),
            rtsp_transport: "tcp".into(),
        }
    }
}

impl SourceConfig {
    /// Create a config for the given URI with default settings
    pub fn new(uri: impl Into<String>) -> Self {
        Self {
            uri: uri.into(),
            ..Default::default()
        }
    }

    /// Set the output resolution, clamping each side to `1..=MAX_DIMENSION`
    pub fn size(mut self, width: u32, height: u32) -> Self {
        self.width = width.clamp(1, MAX_DIMENSION);
        self.height = height.clamp(1, MAX_DIMENSION);
        self
    }

    /// Set the ffmpeg executable
    pub fn ffmpeg_path(mut self, path: impl Into<PathBuf>) -> Self {
        self.ffmpeg_path = path.into();
        self
    }

    /// Set the RTSP transport
    pub fn rtsp_transport(mut self, transport: impl Into<String>) -> Self {
        self.rtsp_transport = transport.into();
        self
    }
}
