//! JPEG compression and decompression

use bytes::Bytes;
use image::codecs::jpeg::JpegEncoder as CodecEncoder;
use image::{DynamicImage, ExtendedColorType, ImageFormat};

use super::frame::{Frame, PixelFormat};
use crate::error::{Error, Result};

/// Default quality, matching the common OpenCV-style `imencode` default
pub const DEFAULT_JPEG_QUALITY: u8 = 95;

/// Fixed-quality JPEG encoder
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JpegEncoder {
    quality: u8,
}

impl JpegEncoder {
    /// Create an encoder; quality is clamped to 1..=100
    pub fn new(quality: u8) -> Self {
        Self {
            quality: quality.clamp(1, 100),
        }
    }

    pub fn quality(&self) -> u8 {
        self.quality
    }

    /// Encode into a caller-owned scratch buffer
    ///
    /// The buffer is cleared first so it can be reused across frames.
    pub fn encode_into(&self, frame: &Frame, out: &mut Vec<u8>) -> Result<()> {
        out.clear();

        let color = match frame.format() {
            PixelFormat::Rgb8 => ExtendedColorType::Rgb8,
            PixelFormat::Gray8 => ExtendedColorType::L8,
        };

        let mut encoder = CodecEncoder::new_with_quality(&mut *out, self.quality);
        encoder
            .encode(frame.data(), frame.width(), frame.height(), color)
            .map_err(|e| Error::Encode(e.to_string()))
    }

    /// Encode into a new buffer
    pub fn encode(&self, frame: &Frame) -> Result<Bytes> {
        let mut out = Vec::new();
        self.encode_into(frame, &mut out)?;
        Ok(Bytes::from(out))
    }
}

impl Default for JpegEncoder {
    fn default() -> Self {
        Self::new(DEFAULT_JPEG_QUALITY)
    }
}

/// Decode a complete JPEG image into a raw frame
///
/// Grayscale images stay single-channel; everything else becomes RGB.
pub fn decode_jpeg(data: &[u8]) -> Result<Frame> {
    let image = image::load_from_memory_with_format(data, ImageFormat::Jpeg)
        .map_err(|e| Error::Decode(e.to_string()))?;

    match image {
        DynamicImage::ImageLuma8(gray) => {
            let (width, height) = gray.dimensions();
            Frame::new(width, height, PixelFormat::Gray8, Bytes::from(gray.into_raw()))
        }
        other => {
            let rgb = other.to_rgb8();
            let (width, height) = rgb.dimensions();
            Frame::new(width, height, PixelFormat::Rgb8, Bytes::from(rgb.into_raw()))
        }
    }
}
