//! Synthetic test pattern source
//!
//! Produces a scrolling RGB gradient so the relay can be exercised without a
//! camera. Parameters after `pattern://`: `[WIDTHxHEIGHT][@FPS]`, e.g.
//! `pattern://1280x720@30`. FPS 0 means "as fast as possible".

use std::thread;
use std::time::{Duration, Instant};

use bytes::Bytes;

use super::config::MAX_DIMENSION;
use super::{FrameReader, Pull};
use crate::error::{Error, Result};
use crate::media::{Frame, PixelFormat};

const DEFAULT_SIZE: (u32, u32) = (320, 240);
const DEFAULT_FPS: u32 = 25;

/// Test pattern generator
#[derive(Debug)]
pub struct PatternReader {
    width: u32,
    height: u32,
    interval: Option<Duration>,
    next_due: Instant,
    tick: u64,
}

impl PatternReader {
    /// Create a generator with explicit parameters
    pub fn new(width: u32, height: u32, fps: u32) -> Self {
        let interval = (fps > 0).then(|| Duration::from_secs(1) / fps);
        Self {
            width: width.clamp(1, MAX_DIMENSION),
            height: height.clamp(1, MAX_DIMENSION),
            interval,
            next_due: Instant::now(),
            tick: 0,
        }
    }

    /// Parse `[WxH][@FPS]`
    pub fn from_params(params: &str) -> Result<Self> {
        let bad = || Error::UnsupportedSource(format!("invalid pattern parameters: {params:?}"));

        let (size, fps) = match params.split_once('@') {
            Some((size, fps)) => (size, Some(fps)),
            None => (params, None),
        };

        let (width, height) = if size.is_empty() {
            DEFAULT_SIZE
        } else {
            let (w, h) = size.split_once('x').ok_or_else(bad)?;
            (
                w.parse::<u32>().map_err(|_| bad())?,
                h.parse::<u32>().map_err(|_| bad())?,
            )
        };
        if !(1..=MAX_DIMENSION).contains(&width) || !(1..=MAX_DIMENSION).contains(&height) {
            return Err(bad());
        }

        let fps = match fps {
            Some(fps) => fps.parse::<u32>().map_err(|_| bad())?,
            None => DEFAULT_FPS,
        };

        Ok(Self::new(width, height, fps))
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    fn render(&self) -> Result<Frame> {
        let t = self.tick as usize;
        let mut data = Vec::with_capacity(self.width as usize * self.height as usize * 3);
        for y in 0..self.height as usize {
            for x in 0..self.width as usize {
                data.push(((x + t) % 256) as u8);
                data.push(((y + t) % 256) as u8);
                data.push((t % 256) as u8);
            }
        }

        Frame::new(self.width, self.height, PixelFormat::Rgb8, Bytes::from(data))
    }
}

impl FrameReader for PatternReader {
    fn next_frame(&mut self) -> Pull {
        if let Some(interval) = self.interval {
            let now = Instant::now();
            if self.next_due > now {
                thread::sleep(self.next_due - now);
            }
            self.next_due = self.next_due.max(now) + interval;
        }

        let frame = self.render();
        self.tick = self.tick.wrapping_add(1);
        match frame {
            Ok(frame) => Pull::Frame(frame),
            Err(_) => Pull::Gap,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_params_defaults() {
        let reader = PatternReader::from_params("").unwrap();
        assert_eq!(reader.size(), DEFAULT_SIZE);
        assert_eq!(reader.interval, Some(Duration::from_millis(40)));
    }

    #[test]
    fn test_params_size_and_fps() {
        let reader = PatternReader::from_params("64x48@0").unwrap();
        assert_eq!(reader.size(), (64, 48));
        assert!(reader.interval.is_none());
    }

    #[test]
    fn test_params_fps_only() {
        let reader = PatternReader::from_params("@10").unwrap();
        assert_eq!(reader.size(), DEFAULT_SIZE);
        assert_eq!(reader.interval, Some(Duration::from_millis(100)));
    }

    #[test]
    fn test_params_invalid() {
        assert!(PatternReader::from_params("wide").is_err());
        assert!(PatternReader::from_params("0x10").is_err());
        assert!(PatternReader::from_params("10x10@fast").is_err());
        assert!(PatternReader::from_params("100000x100000").is_err());
        assert!(PatternReader::from_params("65536x1").is_err());
    }

    #[test]
    fn test_params_largest_side_accepted() {
        let reader = PatternReader::from_params("65535x1@0").unwrap();
        assert_eq!(reader.size(), (MAX_DIMENSION, 1));
    }

    #[test]
    fn test_frames_change_over_time() {
        let mut reader = PatternReader::new(8, 8, 0);

        let first = match reader.next_frame() {
            Pull::Frame(frame) => frame,
            other => panic!("expected frame, got {:?}", other),
        };
        let second = match reader.next_frame() {
            Pull::Frame(frame) => frame,
            other => panic!("expected frame, got {:?}", other),
        };

        assert_eq!(first.len(), 8 * 8 * 3);
        assert_ne!(first, second);
    }
}
