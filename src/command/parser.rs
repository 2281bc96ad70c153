//! Command line parsing and replies

use std::fmt;
use std::str::FromStr;

/// A motion command received as one text line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    StandUp,
    SitDown,
    Forward,
    Backward,
    Left,
    Right,
    TurnLeft,
    TurnRight,
    Stop,
    Quit,
}

/// Body-frame velocity request (m/s, m/s, rad/s)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Velocity {
    pub vx: f32,
    pub vy: f32,
    pub vyaw: f32,
}

impl Velocity {
    pub const fn new(vx: f32, vy: f32, vyaw: f32) -> Self {
        Self { vx, vy, vyaw }
    }
}

impl Command {
    pub const ALL: [Command; 10] = [
        Command::StandUp,
        Command::SitDown,
        Command::Forward,
        Command::Backward,
        Command::Left,
        Command::Right,
        Command::TurnLeft,
        Command::TurnRight,
        Command::Stop,
        Command::Quit,
    ];

    /// Wire name of the command
    pub fn name(self) -> &'static str {
        match self {
            Command::StandUp => "stand_up",
            Command::SitDown => "sit_down",
            Command::Forward => "forward",
            Command::Backward => "backward",
            Command::Left => "left",
            Command::Right => "right",
            Command::TurnLeft => "turn_left",
            Command::TurnRight => "turn_right",
            Command::Stop => "stop",
            Command::Quit => "quit",
        }
    }

    /// Velocity for movement commands, `None` for posture and control commands
    pub fn velocity(self) -> Option<Velocity> {
        match self {
            Command::Forward => Some(Velocity::new(0.3, 0.0, 0.0)),
            Command::Backward => Some(Velocity::new(-0.3, 0.0, 0.0)),
            Command::Left => Some(Velocity::new(0.0, 0.2, 0.0)),
            Command::Right => Some(Velocity::new(0.0, -0.2, 0.0)),
            Command::TurnLeft => Some(Velocity::new(0.1, 0.0, 0.5)),
            Command::TurnRight => Some(Velocity::new(0.1, 0.0, -0.5)),
            _ => None,
        }
    }

    /// Parse a received line; trailing CR/LF are ignored
    pub fn parse_line(line: &str) -> Option<Self> {
        line.trim_end_matches(['\r', '\n']).parse().ok()
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// The line did not name a known command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownCommand(pub String);

impl fmt::Display for UnknownCommand {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown command: {:?}", self.0)
    }
}

impl std::error::Error for UnknownCommand {}

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Command::ALL
            .into_iter()
            .find(|command| command.name() == s)
            .ok_or_else(|| UnknownCommand(s.to_string()))
    }
}

/// Fixed status token sent after each line
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reply {
    Ok,
    Err,
    Unknown,
}

impl Reply {
    pub fn as_bytes(self) -> &'static [u8] {
        match self {
            Reply::Ok => b"OK\n",
            Reply::Err => b"ERR\n",
            Reply::Unknown => b"UNKNOWN COMMAND\n",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_all_names() {
        for command in Command::ALL {
            assert_eq!(command.name().parse::<Command>(), Ok(command));
        }
    }

    #[test]
    fn test_parse_line_strips_terminators() {
        assert_eq!(Command::parse_line("forward\n"), Some(Command::Forward));
        assert_eq!(Command::parse_line("turn_left\r\n"), Some(Command::TurnLeft));
        assert_eq!(Command::parse_line("quit"), Some(Command::Quit));
    }

    #[test]
    fn test_parse_is_exact() {
        assert_eq!(Command::parse_line("Forward\n"), None);
        assert_eq!(Command::parse_line(" stop\n"), None);
        assert_eq!(Command::parse_line("jump\n"), None);
        assert_eq!(Command::parse_line("\n"), None);
    }

    #[test]
    fn test_velocities() {
        assert_eq!(Command::Forward.velocity(), Some(Velocity::new(0.3, 0.0, 0.0)));
        assert_eq!(Command::Right.velocity(), Some(Velocity::new(0.0, -0.2, 0.0)));
        assert_eq!(Command::TurnRight.velocity(), Some(Velocity::new(0.1, 0.0, -0.5)));
        assert_eq!(Command::StandUp.velocity(), None);
        assert_eq!(Command::Stop.velocity(), None);
    }

    #[test]
    fn test_reply_tokens() {
        assert_eq!(Reply::Ok.as_bytes(), b"OK\n");
        assert_eq!(Reply::Err.as_bytes(), b"ERR\n");
        assert_eq!(Reply::Unknown.as_bytes(), b"UNKNOWN COMMAND\n");
    }
}
