//! The closed command table for the worker control channel.

use std::fmt;
use std::str::FromStr;

use thiserror::Error;

/// A control-channel action.
///
/// The table is closed: anything else arriving on the channel is an
/// unknown command, logged and ignored by the reader.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    /// Snapshot the in-flight result as a lossy RGB preview.
    SavePreview,
    /// Snapshot the current result as the lossless RGBA render artifact.
    SaveRender,
    /// Terminate the channel's read loop.
    End,
}

/// Raised for command names outside the action table.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown command \"{0}\"")]
pub struct UnknownCommand(pub String);

impl FromStr for Command {
    type Err = UnknownCommand;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "savePreview" => Ok(Command::SavePreview),
            "saveRender" => Ok(Command::SaveRender),
            "end" => Ok(Command::End),
            other => Err(UnknownCommand(other.to_string())),
        }
    }
}

impl Command {
    /// The wire name of this command.
    pub fn as_str(&self) -> &'static str {
        match self {
            Command::SavePreview => "savePreview",
            Command::SaveRender => "saveRender",
            Command::End => "end",
        }
    }
}

impl fmt::Display for Command {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn the_action_table_is_closed() {
        assert_eq!("savePreview".parse::<Command>(), Ok(Command::SavePreview));
        assert_eq!("saveRender".parse::<Command>(), Ok(Command::SaveRender));
        assert_eq!("end".parse::<Command>(), Ok(Command::End));

        assert_eq!(
            "savepreview".parse::<Command>(),
            Err(UnknownCommand("savepreview".to_string()))
        );
        assert_eq!(
            "quit".parse::<Command>(),
            Err(UnknownCommand("quit".to_string()))
        );
    }

    #[test]
    fn wire_names_roundtrip() {
        for command in [Command::SavePreview, Command::SaveRender, Command::End] {
            assert_eq!(command.as_str().parse::<Command>(), Ok(command));
        }
    }
}
