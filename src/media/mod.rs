//! Media handling
//!
//! This module provides:
//! - Raw frame representation and resizing
//! - JPEG encoding for viewers and decoding for JPEG-based sources

pub mod frame;
pub mod jpeg;

pub use frame::{Frame, PixelFormat};
pub use jpeg::{decode_jpeg, JpegEncoder, DEFAULT_JPEG_QUALITY};
