//! Line-oriented motion command server
//!
//! ```text
//! client: "forward\n"   server: "OK\n"
//! client: "jump\n"      server: "UNKNOWN COMMAND\n"
//! client: "quit\n"      server: "OK\n", then closes
//! ```

use std::io;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tokio::io::{
    AsyncBufRead, AsyncBufReadExt, AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt, BufReader,
};
use tokio::net::{TcpListener, TcpStream};

use super::config::CommandConfig;
use super::controller::{execute, MotionController};
use super::parser::{Command, Reply};
use crate::error::{Error, Result};

/// TCP server dispatching text commands to a [`MotionController`]
pub struct CommandServer<C: MotionController> {
    config: CommandConfig,
    controller: Arc<C>,
    next_session_id: AtomicU64,
}

impl<C: MotionController> CommandServer<C> {
    /// Create a new server with the given configuration and controller
    pub fn new(config: CommandConfig, controller: C) -> Self {
        Self {
            config,
            controller: Arc::new(controller),
            next_session_id: AtomicU64::new(1),
        }
    }

    /// Get a reference to the controller
    pub fn controller(&self) -> &Arc<C> {
        &self.controller
    }

    /// Bind the configured address
    pub async fn bind(&self) -> Result<TcpListener> {
        let addr = self.config.bind_addr;
        let listener = TcpListener::bind(addr)
            .await
            .map_err(|source| Error::Bind { addr, source })?;

        let local_addr = listener.local_addr().unwrap_or(addr);
        tracing::info!(addr = %local_addr, "Command server listening");
        Ok(listener)
    }

    /// Run the server
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
            _ = shutdown => Ok(()),
            result = self.serve(&listener) => result,
        }
    }

    /// Accept connections on an already bound listener
    pub async fn serve(&self, listener: &TcpListener) -> Result<()> {
        loop {
            match listener.accept().await {
                Ok((socket, peer_addr)) => self.handle_connection(socket, peer_addr),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to accept command connection");
                }
            }
        }
    }

    fn handle_connection(&self, socket: TcpStream, peer_addr: SocketAddr) {
        let session_id = self.next_session_id.fetch_add(1, Ordering::Relaxed);
        let controller = Arc::clone(&self.controller);
        let max_line_len = self.config.max_line_len;

        tracing::info!(session_id = session_id, peer = %peer_addr, "Command client connected");

        tokio::spawn(async move {
            match serve_connection(socket, controller.as_ref(), max_line_len).await {
                Ok(count) => tracing::info!(
                    session_id = session_id,
                    commands = count,
                    "Command client disconnected"
                ),
                Err(e) => tracing::debug!(
                    session_id = session_id,
                    error = %e,
                    "Command connection error"
                ),
            }
        });
    }
}

enum Line {
    Text(String),
    TooLong,
    Eof,
}

/// Read one newline-terminated line of at most `max` bytes
///
/// Overlong lines are consumed up to their newline and reported as
/// `TooLong`. A final unterminated line is returned as text.
async fn read_line<R>(reader: &mut R, buf: &mut Vec<u8>, max: usize) -> io::Result<Line>
where
    R: AsyncBufRead + Unpin,
{
    let limit = max as u64 + 1;

    buf.clear();
    let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
    if n == 0 {
        return Ok(Line::Eof);
    }

    let terminated = buf.last() == Some(&b'\n');
    if !terminated && buf.len() > max {
        loop {
            buf.clear();
            let n = (&mut *reader).take(limit).read_until(b'\n', buf).await?;
            if n == 0 || buf.last() == Some(&b'\n') {
                break;
            }
        }
        return Ok(Line::TooLong);
    }

    Ok(Line::Text(String::from_utf8_lossy(buf).into_owned()))
}

/// Serve one command connection until EOF or `quit`
///
/// Returns the number of recognized commands executed.
pub async fn serve_connection<S, C>(stream: S, controller: &C, max_line_len: usize) -> io::Result<u64>
where
    S: AsyncRead + AsyncWrite,
    C: MotionController,
{
    let (reader, mut writer) = tokio::io::split(stream);
    let mut reader = BufReader::new(reader);
    let mut buf = Vec::with_capacity(128);
    let mut count = 0;

    loop {
        let command = match read_line(&mut reader, &mut buf, max_line_len).await? {
            Line::Eof => return Ok(count),
            Line::TooLong => None,
            Line::Text(text) => {
                let command = Command::parse_line(&text);
                if command.is_none() {
                    tracing::debug!(line = ?text.trim_end(), "Unknown command");
                }
                command
            }
        };

        let Some(command) = command else {
            writer.write_all(Reply::Unknown.as_bytes()).await?;
            continue;
        };

        tracing::info!(command = %command, "Received command");
        let reply = execute(controller, command).await;
        writer.write_all(reply.as_bytes()).await?;
        count += 1;

        if command == Command::Quit {
            writer.shutdown().await?;
            return Ok(count);
        }
    }
}
