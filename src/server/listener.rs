//! Streaming server listener
//!
//! Handles the TCP accept loop and spawns one detached session per viewer.

use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::net::{TcpListener, TcpStream};
use tokio::sync::Semaphore;

use crate::error::{Error, Result};
use crate::server::config::ServerConfig;
use crate::session::ClientSession;
use crate::slot::FrameSlot;
use crate::stats::{ServerStats, ServerStatsSnapshot};

/// MJPEG streaming server
pub struct StreamingServer {
    config: ServerConfig,
    slot: Arc<FrameSlot>,
    stats: Arc<ServerStats>,
    next_session_id: AtomicU64,
    session_semaphore: Option<Arc<Semaphore>>,
}

impl StreamingServer {
    /// Create a new server streaming from the given slot
    pub fn new(config: ServerConfig, slot: Arc<FrameSlot>) -> Self {
        let session_semaphore = if config.max_sessions > 0 {
            Some(Arc::new(Semaphore::new(config.max_sessions)))
        } else {
            None
        };

        Self {
            config,
            slot,
            stats: Arc::new(ServerStats::new()),
            next_session_id: AtomicU64::new(1),
            session_semaphore,
        }
    }

    /// Get a reference to the frame slot
    pub fn slot(&self) -> &Arc<FrameSlot> {
        &self.slot
    }

    /// Current session counters
    pub fn stats(&self) -> ServerStatsSnapshot {
        self.stats.snapshot()
    }

    /// Bind the configured address
    ///
    /// Failure here means the port is unavailable or the address is wrong;
    /// it is reported as `Error::Bind` and never retried.
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        let local_addr = listener.local_addr().unwrap_or(addr);
        tracing::info!(addr = %local_addr, "MJPEG server listening");
        Ok(listener)
    }

    /// Run the server
    ///
    /// Returns early only if binding fails; otherwise accepts forever.
    pub async fn run(&self) -> Result<()> {
        let listener = self.bind().await?;
        self.serve(&listener).await
    }

    /// Run the server with graceful shutdown
    pub async fn run_until<F>(&self, shutdown: F) -> Result<()>
    where
        F: std::future::Future<Output = ()>,
    {
        let listener = self.bind().await?;

        tokio::select! {
            _ = shutdown => {
                tracing::info!("Shutdown signal received");
                Ok(())
            }
            result = self.serve(&listener) => result,
        }
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => {
                    self.handle_connection(socket, peer_addr);
                }
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        // Check session limit
        let permit = if let Some(ref sem) = self.session_semaphore {
            match Arc::clone(sem).try_acquire_owned() {
                Ok(permit) => Some(permit),
                Err(_) => {
                    self.stats.session_rejected();
                    tracing::warn!(peer = %peer_addr, "Connection rejected: session limit reached");
                    return;
                }
            }
        } else {
            None
        };

        // Generate session ID
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);

        tracing::debug!(
            session_id = session_id,
            peer = %peer_addr,
            "New connection"
        );

        // Configure socket
        if let Err(e) = self.configure_socket(&socket) {
            tracing::error!(error = %e, "Failed to configure socket");
            return;
        }

        let mut session =
            ClientSession::new(session_id, peer_addr, Arc::clone(&self.slot), &self.config);
        let stats = Arc::clone(&self.stats);
        stats.session_opened();

        // Detached: the acceptor never waits on a session
        tokio::spawn(async move {
            // Held for the whole session so the ceiling counts live viewers
            let _permit = permit;

            if let Err(e) = session.run(socket).await {
                tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Session error"
                );
            }

            let session_stats = &session.state().stats;
            tracing::debug!(
                session_id = session_id,
                frames = session_stats.frames_sent,
                bytes = session_stats.bytes_sent,
                skipped = session.state().skipped_frames,
                duration_ms = session_stats.duration.as_millis() as u64,
                "Connection closed"
            );
            stats.session_closed();
        });
    }

    fn configure_socket(&self, socket: &TcpStream) -> std::io::Result<()> {
        if self.config.tcp_nodelay {
            socket.set_nodelay(true)?;
        }
        Ok(())
    }

    /// Get the bind address
    pub fn bind_addr(&self) -> SocketAddr {
        self.config.bind_addr
    }
}
