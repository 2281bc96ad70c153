//! Per-viewer streaming loop
//!
//! Writes the response header, then repeatedly waits for a newer frame in the
//! slot, compresses it, and writes it as one multipart part. Any write
//! failure ends the session; nothing is retried.

use std::net::SocketAddr;
use std::sync::Arc;

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};

use crate::error::{Error, Result};
use crate::media::{Frame, JpegEncoder};
use crate::protocol::constants::{CRLF, RESPONSE_HEADER};
use crate::protocol::part_header;
use crate::server::ServerConfig;
use crate::slot::FrameSlot;

use super::state::SessionState;

/// A single viewer connection
pub struct ClientSession {
    state: SessionState,
    slot: Arc<FrameSlot>,
    encoder: JpegEncoder,
    /// JPEG scratch buffer, reused for every frame
    scratch: Vec<u8>,
}

impl ClientSession {
    /// Create a session for an accepted connection
    pub fn new(
        session_id: u64,
        peer_addr: SocketAddr,
        slot: Arc<FrameSlot>,
        config: &ServerConfig,
    ) -> Self {
        Self {
            state: SessionState::new(session_id, peer_addr),
            slot,
            encoder: JpegEncoder::new(config.jpeg_quality),
            scratch: Vec::with_capacity(config.write_buffer_size),
        }
    }

    /// Session state (phase, counters)
    pub fn state(&self) -> &SessionState {
        &self.state
    }

    /// Run the session until the viewer goes away or the slot closes
    ///
    /// Returns `Ok(())` when the viewer disconnected cleanly or the relay is
    /// shutting down, and `Err(Error::ClientWrite)` when a write failed. The
    /// session is `Closed` either way.
    pub async fn run<S>(&mut self, stream: S) -> Result<()>
    where
        S: AsyncRead + AsyncWrite,
    {
        let (mut reader, mut writer) = tokio::io::split(stream);
        let result = self.stream_frames(&mut reader, &mut writer).await;
        self.state.close();
        result
    }

    async fn stream_frames<R, W>(&mut self, reader: &mut R, writer: &mut W) -> Result<()>
    where
        R: AsyncRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        write_all(writer, RESPONSE_HEADER).await?;
        writer.flush().await.map_err(Error::ClientWrite)?;
        self.state.start_streaming(RESPONSE_HEADER.len());

        tracing::debug!(
            session_id = self.state.id,
            peer = %self.state.peer_addr,
            "Streaming started"
        );

        let slot = Arc::clone(&self.slot);
        // Request bytes are drained and ignored. A half-closed peer keeps
        // receiving frames; only a failed write ends the session.
        let mut discard = [0u8; 1024];
        let mut read_open = true;

        loop {
            let snapshot = tokio::select! {
                snapshot = slot.wait_newer(self.state.last_sequence) => match snapshot {
                    Some(snapshot) => snapshot,
                    None => {
                        tracing::debug!(session_id = self.state.id, "Frame slot closed");
                        return Ok(());
                    }
                },
                read = reader.read(&mut discard), if read_open => match read {
                    Ok(0) | Err(_) => {
                        tracing::debug!(session_id = self.state.id, "Peer stopped sending");
                        read_open = false;
                        continue;
                    }
                    Ok(_) => continue,
                },
            };

            if let Err(e) = self.encode(snapshot.frame).await {
                tracing::warn!(
                    session_id = self.state.id,
                    sequence = snapshot.sequence,
                    error = %e,
                    "Dropping frame that failed to encode"
                );
                self.state.skip_frame(snapshot.sequence);
                continue;
            }

            let header = part_header(self.scratch.len());
            write_all(writer, &header).await?;
            write_all(writer, &self.scratch).await?;
            write_all(writer, CRLF).await?;
            writer.flush().await.map_err(Error::ClientWrite)?;

            self.state.on_frame(
                snapshot.sequence,
                header.len() + self.scratch.len() + CRLF.len(),
            );

            tracing::trace!(
                session_id = self.state.id,
                sequence = snapshot.sequence,
                size = self.scratch.len(),
                "Frame sent"
            );
        }
    }

    /// Compress a frame into the scratch buffer on the blocking pool
    async fn encode(&mut self, frame: Frame) -> Result<()> {
        let encoder = self.encoder;
        let mut scratch = std::mem::take(&mut self.scratch);

        let (scratch, result) = tokio::task::spawn_blocking(move || {
            let result = encoder.encode_into(&frame, &mut scratch);
            (scratch, result)
        })
        .await
        .map_err(|e| Error::Encode(e.to_string()))?;

        self.scratch = scratch;
        result
    }
}

async fn write_all<W: AsyncWrite + Unpin>(writer: &mut W, data: &[u8]) -> Result<()> {
    writer.write_all(data).await.map_err(Error::ClientWrite)
}
