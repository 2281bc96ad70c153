//! Statistics for viewer sessions and the server

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

/// Per-session statistics, reported when the session closes
#[derive(Debug, Clone, Default)]
pub struct SessionStats {
    /// Parts written to the viewer
    pub frames_sent: u64,
    /// Total bytes written, including the response header and framing
    pub bytes_sent: u64,
    /// Time between accept and close
    pub duration: Duration,
}

impl SessionStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one written part
    pub fn on_frame(&mut self, wire_bytes: usize) {
        self.frames_sent += 1;
        self.bytes_sent += wire_bytes as u64;
    }

    /// Average outgoing bitrate (bits/sec)
    pub fn bitrate(&self) -> u64 {
        let secs = self.duration.as_secs();
        if secs > 0 {
            (self.bytes_sent * 8) / secs
        } else {
            0
        }
    }
}

/// Server-wide counters, shared between the acceptor and sessions
#[derive(Debug)]
pub struct ServerStats {
    started_at: Instant,
    total_sessions: AtomicU64,
    active_sessions: AtomicU64,
    rejected_sessions: AtomicU64,
}

impl ServerStats {
    pub fn new() -> Self {
        Self {
            started_at: Instant::now(),
            total_sessions: AtomicU64::new(0),
            active_sessions: AtomicU64::new(0),
            rejected_sessions: AtomicU64::new(0),
        }
    }

    pub fn session_opened(&self) {
        self.total_sessions.fetch_add(1, Ordering::Relaxed);
        self.active_sessions.fetch_add(1, Ordering::Relaxed);
    }

    pub fn session_closed(&self) {
        self.active_sessions.fetch_sub(1, Ordering::Relaxed);
    }

    pub fn session_rejected(&self) {
        self.rejected_sessions.fetch_add(1, Ordering::Relaxed);
    }

    /// Point-in-time copy of the counters
    pub fn snapshot(&self) -> ServerStatsSnapshot {
        ServerStatsSnapshot {
            total_sessions: self.total_sessions.load(Ordering::Relaxed),
            active_sessions: self.active_sessions.load(Ordering::Relaxed),
            rejected_sessions: self.rejected_sessions.load(Ordering::Relaxed),
            uptime: self.started_at.elapsed(),
        }
    }
}

impl Default for ServerStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Copy of [`ServerStats`] at one instant
#[derive(Debug, Clone, Default)]
pub struct ServerStatsSnapshot {
    /// Sessions accepted since start
    pub total_sessions: u64,
    /// Sessions currently streaming
    pub active_sessions: u64,
    /// Connections dropped because the session ceiling was reached
    pub rejected_sessions: u64,
    /// Time since the server was created
    pub uptime: Duration,
}
