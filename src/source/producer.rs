//! Frame producer thread
//!
//! Opens the source once, then pulls, resizes and publishes frames into the
//! slot as fast as the source delivers them. There is no reconnect: if the
//! source cannot be opened the slot stays empty, and if it ends the last
//! frame stays in place.

use std::sync::Arc;
use std::thread::{self, JoinHandle};

use super::config::SourceConfig;
use super::{FrameReader, Pull};
use crate::slot::FrameSlot;

/// Counters reported when the producer exits
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProducerStats {
    /// Frames published to the slot
    pub frames_published: u64,
    /// Pulls that yielded nothing usable
    pub gaps: u64,
    /// Whether the source was opened at all
    pub opened: bool,
}

/// Pulls frames from a source into a [`FrameSlot`]
pub struct FrameProducer {
    config: SourceConfig,
    slot: Arc<FrameSlot>,
}

impl FrameProducer {
    pub fn new(config: SourceConfig, slot: Arc<FrameSlot>) -> Self {
        Self { config, slot }
    }

    /// Run on a dedicated, named OS thread
    pub fn spawn(self) -> std::io::Result<JoinHandle<ProducerStats>> {
        thread::Builder::new()
            .name("frame-producer".into())
            .spawn(move || self.run())
    }

    /// Open the configured source and run until it ends or the slot closes
    pub fn run(self) -> ProducerStats {
        let mut reader = match super::open(&self.config) {
            Ok(reader) => reader,
            Err(e) => {
                tracing::error!(
                    uri = %self.config.uri,
                    error = %e,
                    "Cannot open video source; producer stopped"
                );
                return ProducerStats::default();
            }
        };

        tracing::info!(
            uri = %self.config.uri,
            width = self.config.width,
            height = self.config.height,
            "Video source opened"
        );

        self.run_with(reader.as_mut())
    }

    /// Drive an already opened reader
    pub fn run_with(&self, reader: &mut dyn FrameReader) -> ProducerStats {
        let mut stats = ProducerStats {
            opened: true,
            ..Default::default()
        };
        let (width, height) = (self.config.width, self.config.height);

        while !self.slot.is_closed() {
            match reader.next_frame() {
                Pull::Frame(frame) => match frame.resize(width, height) {
                    Ok(resized) => {
                        self.slot.publish(resized);
                        stats.frames_published += 1;
                    }
                    Err(e) => {
                        tracing::warn!(error = %e, "Dropping frame that failed to resize");
                        stats.gaps += 1;
                    }
                },
                Pull::Gap => {
                    stats.gaps += 1;
                    thread::yield_now();
                }
                Pull::End => {
                    tracing::warn!(uri = %self.config.uri, "Video source ended; not reconnecting");
                    break;
                }
            }
        }

        tracing::info!(
            frames = stats.frames_published,
            gaps = stats.gaps,
            "Frame producer stopped"
        );
        stats
    }
}
