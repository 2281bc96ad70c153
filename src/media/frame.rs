//! Raw decoded frames
//!
//! A [`Frame`] is immutable once constructed. Producers build a new one per
//! decode cycle and hand it off; nothing mutates the pixels afterwards.

use bytes::Bytes;
use image::imageops::{self, FilterType};
use image::{ImageBuffer, Luma, Rgb};

use crate::error::{Error, Result};

/// Pixel layout of a frame buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PixelFormat {
    /// 8-bit interleaved R, G, B
    Rgb8,
    /// 8-bit luma
    Gray8,
}

impl PixelFormat {
    /// Bytes used by a single pixel
    pub fn bytes_per_pixel(self) -> usize {
        match self {
            PixelFormat::Rgb8 => 3,
            PixelFormat::Gray8 => 1,
        }
    }
}

/// One decoded image at a fixed resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Frame {
    width: u32,
    height: u32,
    format: PixelFormat,
    data: Bytes,
}

impl Frame {
    /// Create a frame, checking the buffer length against the geometry
    pub fn new(width: u32, height: u32, format: PixelFormat, data: Bytes) -> Result<Self> {
        let expected = width as usize * height as usize * format.bytes_per_pixel();
        if data.len() != expected {
            return Err(Error::InvalidFrame {
                width,
                height,
                expected,
                actual: data.len(),
            });
        }

        Ok(Self {
            width,
            height,
            format,
            data,
        })
    }

    /// Create a uniform RGB frame
    pub fn solid(width: u32, height: u32, rgb: [u8; 3]) -> Self {
        let pixels = width as usize * height as usize;
        let mut data = Vec::with_capacity(pixels * 3);
        for _ in 0..pixels {
            data.extend_from_slice(&rgb);
        }

        Self {
            width,
            height,
            format: PixelFormat::Rgb8,
            data: Bytes::from(data),
        }
    }

    pub fn width(&self) -> u32 {
        self.width
    }

    pub fn height(&self) -> u32 {
        self.height
    }

    pub fn format(&self) -> PixelFormat {
        self.format
    }

    /// Raw pixel bytes, row-major
    pub fn data(&self) -> &Bytes {
        &self.data
    }

    /// Size of the pixel buffer in bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Copy the pixels into a freshly allocated buffer
    ///
    /// The returned frame shares no memory with `self`.
    pub fn deep_copy(&self) -> Self {
        Self {
            width: self.width,
            height: self.height,
            format: self.format,
            data: Bytes::copy_from_slice(&self.data),
        }
    }

    /// Scale to the given resolution with a bilinear filter
    ///
    /// Returns a plain clone when the size already matches.
    pub fn resize(&self, width: u32, height: u32) -> Result<Self> {
        if self.width == width && self.height == height {
            return Ok(self.clone());
        }

        let invalid = || Error::InvalidFrame {
            width: self.width,
            height: self.height,
            expected: self.width as usize
                * self.height as usize
                * self.format.bytes_per_pixel(),
            actual: self.data.len(),
        };

        let scaled = match self.format {
            PixelFormat::Rgb8 => {
                let view =
                    ImageBuffer::<Rgb<u8>, &[u8]>::from_raw(self.width, self.height, &self.data[..])
                        .ok_or_else(invalid)?;
                imageops::resize(&view, width, height, FilterType::Triangle).into_raw()
            }
            PixelFormat::Gray8 => {
                let view =
                    ImageBuffer::<Luma<u8>, &[u8]>::from_raw(self.width, self.height, &self.data[..])
                        .ok_or_else(invalid)?;
                imageops::resize(&view, width, height, FilterType::Triangle).into_raw()
            }
        };

        Frame::new(width, height, self.format, Bytes::from(scaled))
    }
}
