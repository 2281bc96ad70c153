//! `multipart/x-mixed-replace` framing
//!
//! Each part on the wire looks like:
//!
//! ```text
//! --frame\r\n
//! Content-Type: image/jpeg\r\n
//! Content-Length: <N>\r\n
//! \r\n
//! <N bytes>\r\n
//! ```
//!
//! [`MultipartReader`] is the receiving side, used by tests and monitoring
//! tools to split a captured stream back into parts.

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

use super::constants::{BOUNDARY, CRLF, HEADER_END, PART_CONTENT_TYPE, RESPONSE_HEADER};

/// Build the header block that precedes a payload of `len` bytes
pub fn part_header(len: usize) -> Bytes {
    let header = format!(
        "--{BOUNDARY}\r\nContent-Type: {PART_CONTENT_TYPE}\r\nContent-Length: {len}\r\n\r\n"
    );
    Bytes::from(header)
}

/// Append one complete part (header, payload, trailing CRLF) to `buf`
pub fn encode_part(buf: &mut BytesMut, payload: &[u8]) {
    let header = part_header(payload.len());
    buf.reserve(header.len() + payload.len() + CRLF.len());
    buf.put_slice(&header);
    buf.put_slice(payload);
    buf.put_slice(CRLF);
}

/// A parsed part
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Part {
    pub content_type: String,
    pub payload: Bytes,
}

/// Errors raised while parsing a stream
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MultipartError {
    #[error("unexpected response header")]
    BadResponseHeader,
    #[error("expected boundary line, got {0:?}")]
    MissingBoundary(String),
    #[error("part has no Content-Length")]
    MissingContentLength,
    #[error("invalid Content-Length: {0:?}")]
    InvalidContentLength(String),
    #[error("payload not followed by CRLF")]
    MissingTrailer,
}

/// Incremental parser for a relay response stream
#[derive(Debug, Default)]
pub struct MultipartReader {
    buf: BytesMut,
    header_seen: bool,
}

impl MultipartReader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed received bytes
    pub fn push(&mut self, data: &[u8]) {
        self.buf.extend_from_slice(data);
    }

    /// Whether the response header has been consumed
    pub fn header_seen(&self) -> bool {
        self.header_seen
    }

    /// Bytes buffered but not yet consumed
    pub fn buffered(&self) -> usize {
        self.buf.len()
    }

    /// Consume the response header if it is complete
    ///
    /// Returns `Ok(false)` while more data is needed.
    pub fn read_header(&mut self) -> Result<bool, MultipartError> {
        if self.header_seen {
            return Ok(true);
        }
        if self.buf.len() < RESPONSE_HEADER.len() {
            if !RESPONSE_HEADER.starts_with(&self.buf) {
                return Err(MultipartError::BadResponseHeader);
            }
            return Ok(false);
        }
        if &self.buf[..RESPONSE_HEADER.len()] != RESPONSE_HEADER {
            return Err(MultipartError::BadResponseHeader);
        }

        self.buf.advance(RESPONSE_HEADER.len());
        self.header_seen = true;
        Ok(true)
    }

    /// Parse the next complete part, if one is buffered
    pub fn next_part(&mut self) -> Result<Option<Part>, MultipartError> {
        if !self.read_header()? {
            return Ok(None);
        }

        let header_len = match find(&self.buf, HEADER_END) {
            Some(pos) => pos + HEADER_END.len(),
            None => return Ok(None),
        };

        let text = String::from_utf8_lossy(&self.buf[..header_len - HEADER_END.len()]).into_owned();
        let mut lines = text.split("\r\n");

        let boundary = lines.next().unwrap_or_default();
        if boundary != format!("--{BOUNDARY}") {
            return Err(MultipartError::MissingBoundary(boundary.to_string()));
        }

        let mut content_type = String::new();
        let mut content_length = None;
        for line in lines {
            let Some((name, value)) = line.split_once(':') else {
                continue;
            };
            let value = value.trim();
            if name.eq_ignore_ascii_case("content-type") {
                content_type = value.to_string();
            } else if name.eq_ignore_ascii_case("content-length") {
                let len = value
                    .parse::<usize>()
                    .map_err(|_| MultipartError::InvalidContentLength(value.to_string()))?;
                content_length = Some(len);
            }
        }
        let len = content_length.ok_or(MultipartError::MissingContentLength)?;

        let total = header_len
            .checked_add(len)
            .and_then(|n| n.checked_add(CRLF.len()))
            .ok_or_else(|| MultipartError::InvalidContentLength(len.to_string()))?;
        if self.buf.len() < total {
            return Ok(None);
        }
        if &self.buf[header_len + len..total] != CRLF {
            return Err(MultipartError::MissingTrailer);
        }

        self.buf.advance(header_len);
        let payload = self.buf.split_to(len).freeze();
        self.buf.advance(CRLF.len());

        Ok(Some(Part {
            content_type,
            payload,
        }))
    }
}

fn find(haystack: &[u8], needle: &[u8]) -> Option<usize> {
    haystack
        .windows(needle.len())
        .position(|window| window == needle)
}
