//! Console control commands
//!
//! One command per stdin line. Seek positions are given in percent (0-100),
//! the scale a progress bar shows, and converted to ratios here.

use crate::error::{Error, Result};
use crate::playback::PlayerCommand;

pub const HELP: &str = "\
Commands:
  play                      start or resume global playback
  pause                     pause global playback
  seek <0-100>              jump to a percentage of the transcript
  local <n> play|pause      control the standalone player of turn n
  local <n> seek <0-100>    seek within turn n
  status                    print progress, active turn and state
  help                      show this message
  quit                      stop and exit";

/// A parsed console line
#[derive(Debug, Clone, PartialEq)]
pub enum ConsoleCommand {
    Play,
    Pause,
    /// Ratio in [0, 1]
    Seek(f64),
    LocalPlay(usize),
    LocalPause(usize),
    /// Turn index and ratio in [0, 1]
    LocalSeek(usize, f64),
    Status,
    Help,
    Quit,
}

impl ConsoleCommand {
    /// Engine command for this console command, if it maps to one
    ///
    /// `Status`, `Help` and `Quit` are handled by the console itself.
    pub fn to_player_command(&self) -> Option<PlayerCommand> {
        match *self {
            ConsoleCommand::Play => Some(PlayerCommand::Play),
            ConsoleCommand::Pause => Some(PlayerCommand::Pause),
            ConsoleCommand::Seek(ratio) => Some(PlayerCommand::SeekToRatio(ratio)),
            ConsoleCommand::LocalPlay(index) => Some(PlayerCommand::LocalPlay(index)),
            ConsoleCommand::LocalPause(index) => Some(PlayerCommand::LocalPause(index)),
            ConsoleCommand::LocalSeek(index, ratio) => Some(PlayerCommand::LocalSeek(index, ratio)),
            ConsoleCommand::Status | ConsoleCommand::Help | ConsoleCommand::Quit => None,
        }
    }
}

/// Parse one console line (case-insensitive, surrounding whitespace ignored)
pub fn parse_command(line: &str) -> Result<ConsoleCommand> {
    let lowered = line.trim().to_ascii_lowercase();
    let words: Vec<&str> = lowered.split_whitespace().collect();

    match words.as_slice() {
        ["play"] => Ok(ConsoleCommand::Play),
        ["pause"] => Ok(ConsoleCommand::Pause),
        ["seek", pct] => Ok(ConsoleCommand::Seek(parse_percent(pct)?)),
        ["local", index, rest @ ..] => {
            let index = index
                .parse::<usize>()
                .map_err(|_| Error::InvalidCommand(format!("'{}' is not a turn number", index)))?;
            match rest {
                ["play"] => Ok(ConsoleCommand::LocalPlay(index)),
                ["pause"] => Ok(ConsoleCommand::LocalPause(index)),
                ["seek", pct] => Ok(ConsoleCommand::LocalSeek(index, parse_percent(pct)?)),
                _ => Err(Error::InvalidCommand(format!(
                    "expected 'local {} play|pause|seek <0-100>'",
                    index
                ))),
            }
        }
        ["status"] => Ok(ConsoleCommand::Status),
        ["help"] | ["?"] => Ok(ConsoleCommand::Help),
        ["quit"] | ["exit"] | ["q"] => Ok(ConsoleCommand::Quit),
        [] => Err(Error::InvalidCommand("empty line".to_string())),
        _ => Err(Error::InvalidCommand(format!("unknown command '{}'", line.trim()))),
    }
}

/// Percent string (0-100) to ratio (0-1)
fn parse_percent(text: &str) -> Result<f64> {
    let value: f64 = text
        .trim_end_matches('%')
        .parse()
        .map_err(|_| Error::InvalidCommand(format!("'{}' is not a number", text)))?;

    if !(0.0..=100.0).contains(&value) {
        return Err(Error::InvalidCommand(format!(
            "seek position must be between 0 and 100, got {}",
            value
        )));
    }

    Ok(value / 100.0)
}
