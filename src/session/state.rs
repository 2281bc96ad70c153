//! Session state machine
//!
//! Tracks a viewer session from accept to close:
//! `Handshaking -> Streaming -> Closed`.

use std::net::SocketAddr;
use std::time::Instant;

use crate::stats::SessionStats;

/// Session lifecycle state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPhase {
    /// Connected, response header not yet written
    Handshaking,
    /// Header written, sending frames
    Streaming,
    /// Terminal; the socket has been released
    Closed,
}

/// Complete session state
#[derive(Debug)]
pub struct SessionState {
    /// Unique session ID
    pub id: u64,

    /// Remote peer address
    pub peer_addr: SocketAddr,

    /// Current phase
    pub phase: SessionPhase,

    /// Connection start time
    pub connected_at: Instant,

    /// Sequence number of the last frame written (0 = none yet)
    pub last_sequence: u64,

    /// Frames skipped because the producer outran this viewer
    pub skipped_frames: u64,

    /// Outgoing traffic
    pub stats: SessionStats,
}

impl SessionState {
    /// Create a new session state
    pub fn new(id: u64, peer_addr: SocketAddr) -> Self {
        Self {
            id,
            peer_addr,
            phase: SessionPhase::Handshaking,
            connected_at: Instant::now(),
            last_sequence: 0,
            skipped_frames: 0,
            stats: SessionStats::new(),
        }
    }

    /// Response header written; begin streaming
    pub fn start_streaming(&mut self, header_bytes: usize) {
        if self.phase == SessionPhase::Handshaking {
            self.phase = SessionPhase::Streaming;
            self.stats.bytes_sent += header_bytes as u64;
        }
    }

    /// Record a written part for the frame with the given sequence
    pub fn on_frame(&mut self, sequence: u64, wire_bytes: usize) {
        if self.last_sequence > 0 && sequence > self.last_sequence + 1 {
            self.skipped_frames += sequence - self.last_sequence - 1;
        }
        self.last_sequence = sequence;
        self.stats.on_frame(wire_bytes);
    }

    /// Mark a frame as consumed without writing it
    pub fn skip_frame(&mut self, sequence: u64) {
        self.last_sequence = sequence;
        self.skipped_frames += 1;
    }

    /// Enter the terminal state
    pub fn close(&mut self) {
        self.phase = SessionPhase::Closed;
        self.stats.duration = self.connected_at.elapsed();
    }

    /// Check if frames are being sent
    pub fn is_streaming(&self) -> bool {
        self.phase == SessionPhase::Streaming
    }

    /// Get session duration
    pub fn duration(&self) -> std::time::Duration {
        self.connected_at.elapsed()
    }
}
