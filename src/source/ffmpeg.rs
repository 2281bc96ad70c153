//! ffmpeg-backed source
//!
//! Spawns `ffmpeg` to pull the remote stream (RTSP, HTTP, files, ...) and
//! transcode it to a pipe of concatenated JPEG images, which are split on
//! their SOI/EOI markers and decoded.
//!
//! ```text
//! ffmpeg -i <uri> -f image2pipe -c:v mjpeg pipe:1
//!     │ stdout
//!     ▼
//! [FF D8 ... FF D9][FF D8 ... FF D9]...
//!     │ JpegSplitter
//!     ▼
//! decode_jpeg() ──► Frame
//! ```

use std::io::{ErrorKind, Read};
use std::process::{Child, ChildStdout, Command, Stdio};

use bytes::{Buf, Bytes, BytesMut};

use super::config::SourceConfig;
use super::{FrameReader, Pull};
use crate::error::{Error, Result};
use crate::media::{decode_jpeg, Frame};

/// JPEG start-of-image marker
const SOI: [u8; 2] = [0xFF, 0xD8];
/// JPEG end-of-image marker
const EOI: [u8; 2] = [0xFF, 0xD9];

/// Images larger than this without an EOI are treated as garbage
const MAX_IMAGE_SIZE: usize = 16 * 1024 * 1024;

const READ_CHUNK: usize = 64 * 1024;

/// Splits a byte stream of back-to-back JPEG images
///
/// Entropy-coded JPEG data escapes `0xFF` bytes, so `FF D9` only appears as
/// the real end marker in encoder output without embedded thumbnails.
#[derive(Debug, Default)]
pub struct JpegSplitter {
    buf: BytesMut,
    /// Offset up to which the current image has been searched for EOI
    scanned: usize,
    /// Whether `buf` currently starts at an SOI marker
    in_image: bool,
}

impl JpegSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed bytes read from the pipe
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Bytes held but not yet returned
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Extract the next complete image, if buffered
    pub fn next_image(&mut self) -> Option<Bytes> {
        if !self.in_image {
            match find_marker(&self.buf, SOI, 0) {
                Some(start) => {
                    self.buf.advance(start);
                    self.in_image = true;
                    self.scanned = SOI.len();
                }
                None => {
                    // Keep a trailing 0xFF: it may be the first half of an SOI
                    let keep = usize::from(self.buf.last() == Some(&0xFF));
                    let drop = self.buf.len() - keep;
                    self.buf.advance(drop);
                    return None;
                }
            }
        }

        match find_marker(&self.buf, EOI, self.scanned) {
            Some(end) => {
                let image = self.buf.split_to(end + EOI.len()).freeze();
                self.in_image = false;
                self.scanned = 0;
                Some(image)
            }
            None => {
                if self.buf.len() > MAX_IMAGE_SIZE {
                    tracing::warn!(buffered = self.buf.len(), "Discarding oversized JPEG data");
                    self.buf.clear();
                    self.in_image = false;
                    self.scanned = 0;
                } else {
                    // Resume one byte back in case the marker straddles reads
                    self.scanned = self.buf.len().saturating_sub(1).max(SOI.len());
                }
                None
            }
        }
    }
}

fn find_marker(haystack: &[u8], marker: [u8; 2], from: usize) -> Option<usize> {
    if from >= haystack.len() {
        return None;
    }
    haystack[from..]
        .windows(2)
        .position(|window| window == marker)
        .map(|pos| pos + from)
}

/// Frame reader fed by an ffmpeg child process
pub struct FfmpegReader {
    uri: String,
    child: Child,
    stdout: ChildStdout,
    splitter: JpegSplitter,
    read_buf: Box<[u8]>,
    /// First frame, decoded during `open`
    pending: Option<Frame>,
}

impl FfmpegReader {
    /// Start ffmpeg and wait for the first decodable image
    ///
    /// Fails with `SourceUnavailable` if ffmpeg cannot be started or exits
    /// before producing a frame.
    pub fn open(config: &SourceConfig) -> Result<Self> {
        let unavailable = |reason: String| Error::SourceUnavailable {
            uri: config.uri.clone(),
            reason,
        };

        let mut command = Command::new(&config.ffmpeg_path);
        command.args(["-nostdin", "-hide_banner", "-loglevel", "error"]);
        if config.uri.starts_with("rtsp://") || config.uri.starts_with("rtsps://") {
            command.args(["-rtsp_transport", config.rtsp_transport.as_str()]);
        }
        command
            .args(["-i", config.uri.as_str()])
            .args(["-an", "-f", "image2pipe", "-c:v", "mjpeg", "-q:v", "2", "pipe:1"])
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit());

        tracing::debug!(
            ffmpeg = %config.ffmpeg_path.display(),
            uri = %config.uri,
            "Starting ffmpeg"
        );

        let mut child = command.spawn().map_err(|e| {
            unavailable(format!(
                "cannot start {}: {}",
                config.ffmpeg_path.display(),
                e
            ))
        })?;

        let stdout = match child.stdout.take() {
            Some(stdout) => stdout,
            None => {
                let _ = child.kill();
                let _ = child.wait();
                return Err(unavailable("ffmpeg stdout not captured".into()));
            }
        };

        let mut reader = Self {
            uri: config.uri.clone(),
            child,
            stdout,
            splitter: JpegSplitter::new(),
            read_buf: vec![0u8; READ_CHUNK].into_boxed_slice(),
            pending: None,
        };

        loop {
            match reader.read_image() {
                Some(Ok(frame)) => {
                    reader.pending = Some(frame);
                    return Ok(reader);
                }
                Some(Err(e)) => {
                    tracing::debug!(uri = %reader.uri, error = %e, "Skipping undecodable image");
                }
                None => {
                    return Err(unavailable("ffmpeg exited before producing a frame".into()));
                }
            }
        }
    }

    /// Read until one complete image is decoded
    ///
    /// `None` means the pipe reached EOF or failed.
    fn read_image(&mut self) -> Option<Result<Frame>> {
        loop {
            if let Some(image) = self.splitter.next_image() {
                return Some(decode_jpeg(&image));
            }

            match self.stdout.read(&mut self.read_buf) {
                Ok(0) => return None,
                Ok(n) => self.splitter.push(&self.read_buf[..n]),
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => {
                    tracing::warn!(uri = %self.uri, error = %e, "ffmpeg pipe read failed");
                    return None;
                }
            }
        }
    }
}

impl FrameReader for FfmpegReader {
    fn next_frame(&mut self) -> Pull {
        if let Some(frame) = self.pending.take() {
            return Pull::Frame(frame);
        }

        match self.read_image() {
            Some(Ok(frame)) => Pull::Frame(frame),
            Some(Err(e)) => {
                tracing::trace!(uri = %self.uri, error = %e, "Decode gap");
                Pull::Gap
            }
            None => Pull::End,
        }
    }
}

impl Drop for FfmpegReader {
    fn drop(&mut self) {
        let _ = self.child.kill();
        let _ = self.child.wait();
    }
}
