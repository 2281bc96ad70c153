//! Command server configuration

use std::net::SocketAddr;

/// Default TCP port for motion commands
pub const DEFAULT_COMMAND_PORT: u16 = 9090;

/// Command server configuration options
#[derive(Debug, Clone)]
pub struct CommandConfig {
    /// Address to bind to
    pub bind_addr: SocketAddr,

    /// Longest accepted line, excluding the newline
    pub max_line_len: usize,
}

impl Default for CommandConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([0, 0, 0, 0], DEFAULT_COMMAND_PORT)),
            max_line_len: 1024,
        }
    }
}

impl CommandConfig {
    /// Create a new config with custom bind address
    pub fn with_addr(addr: SocketAddr) -> Self {
        Self {
            bind_addr: addr,
            ..Default::default()
        }
    }

    /// Set the maximum line length
    pub fn max_line_len(mut self, len: usize) -> Self {
        self.max_line_len = len.max(1);
        self
    }
}
