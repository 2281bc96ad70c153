//! Robot motion command server
//!
//! A small, independent TCP service: one newline-terminated command per line,
//! one fixed status token per reply. It shares no state with the video relay.
//!
//! Commands: `stand_up`, `sit_down`, `forward`, `backward`, `left`, `right`,
//! `turn_left`, `turn_right`, `stop`, `quit`.

pub mod config;
pub mod controller;
pub mod parser;
pub mod server;

pub use config::CommandConfig;
pub use controller::{execute, LoggingController, MotionCall, MotionController, MotionError};
pub use parser::{Command, Reply, UnknownCommand, Velocity};
pub use server::{serve_connection, CommandServer};
