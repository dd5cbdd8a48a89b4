//! Parser for `lspath` output.
//!
//! Each line lists one MPIO path as `<status> <device> <adapter>`, e.g.
//! `Enabled hdisk2 fscsi0`. Surrounding ASCII whitespace is ignored and tokens
//! after the third are discarded.

use std::fmt;
use std::str::FromStr;

/// Path states reported by `lspath`. Matching is case-sensitive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PathState {
    Enabled,
    Failed,
    Disabled,
    Missing,
    Defined,
}

impl PathState {
    pub fn as_str(&self) -> &'static str {
        match self {
            PathState::Enabled => "Enabled",
            PathState::Failed => "Failed",
            PathState::Disabled => "Disabled",
            PathState::Missing => "Missing",
            PathState::Defined => "Defined",
        }
    }

    /// `1` for a usable path, `0` otherwise.
    pub fn health_value(&self) -> u8 {
        match self {
            PathState::Enabled => 1,
            PathState::Failed | PathState::Disabled | PathState::Missing | PathState::Defined => 0,
        }
    }
}

impl fmt::Display for PathState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PathState {
    type Err = ParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Enabled" => Ok(PathState::Enabled),
            "Failed" => Ok(PathState::Failed),
            "Disabled" => Ok(PathState::Disabled),
            "Missing" => Ok(PathState::Missing),
            "Defined" => Ok(PathState::Defined),
            other => Err(ParseError::UnknownStatus(other.to_owned())),
        }
    }
}

/// One parsed `lspath` line, borrowing from the command output.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathStatus<'a> {
    pub status: PathState,
    pub device: &'a str,
    pub adapter: &'a str,
}

impl PathStatus<'_> {
    pub fn health_value(&self) -> u8 {
        self.status.health_value()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ParseError {
    #[error("blank line")]
    Blank,
    #[error("expected `<status> <device> <adapter>`, found {0} token(s)")]
    Malformed(usize),
    #[error("unknown MPIO path status `{0}`")]
    UnknownStatus(String),
}

/// Separators recognised between and around tokens. Other Unicode whitespace,
/// such as a no-break space, is part of a token.
const WHITESPACE: [char; 6] = [' ', '\t', '\n', '\r', '\x0c', '\x0b'];

fn tokens(line: &str) -> impl Iterator<Item = &str> {
    line.split(&WHITESPACE[..]).filter(|token| !token.is_empty())
}

/// Parses a single `lspath` line.
///
/// # Errors
///
/// - [`ParseError::Blank`] for empty or whitespace-only lines.
/// - [`ParseError::Malformed`] if fewer than three tokens are present.
/// - [`ParseError::UnknownStatus`] if the status token is not a known state.
pub fn parse_path_status_line(line: &str) -> Result<PathStatus<'_>, ParseError> {
    let line = line.trim_matches(&WHITESPACE[..]);
    if line.is_empty() {
        return Err(ParseError::Blank);
    }

    let mut fields = tokens(line);
    let (Some(status), Some(device), Some(adapter)) = (fields.next(), fields.next(), fields.next())
    else {
        return Err(ParseError::Malformed(tokens(line).count()));
    };

    Ok(PathStatus {
        status: status.parse()?,
        device,
        adapter,
    })
}
