//! This module defines the core data structures and types shared by every device kind,
//! including the device kind tag, head directions, execution verdicts, limits and error types.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use crate::validator::ValidationError;

/// The maximum number of steps a tape machine may take before it is reported as non-halting.
pub const DEFAULT_MAX_STEPS: usize = 10000;
/// The maximum allowed size for a definition document in bytes.
pub const MAX_DEFINITION_SIZE: usize = 65536; // 64KB

/// The three classes of device this crate knows how to validate, run and render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Kind {
    /// Deterministic finite automaton.
    Dfa,
    /// Deterministic pushdown automaton.
    Dpda,
    /// Deterministic single-tape machine.
    Dtm,
}

impl Kind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Kind::Dfa => "dfa",
            Kind::Dpda => "dpda",
            Kind::Dtm => "dtm",
        }
    }
}

impl fmt::Display for Kind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Kind {
    type Err = AutomatonError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "dfa" => Ok(Kind::Dfa),
            "dpda" => Ok(Kind::Dpda),
            "dtm" => Ok(Kind::Dtm),
            other => Err(AutomatonError::Parse(format!("Unknown device kind: {}", other))),
        }
    }
}

/// Represents the possible directions a tape head can move.
///
/// On the wire the directions are spelled `"L"`, `"R"` and `"N"`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Direction {
    /// Move the head one position to the left.
    #[serde(rename = "L", alias = "Left")]
    Left,
    /// Move the head one position to the right.
    #[serde(rename = "R", alias = "Right")]
    Right,
    /// Keep the head in the same position.
    #[serde(rename = "N", alias = "Stay")]
    Stay,
}

impl Direction {
    /// Single-letter form used in graph labels.
    pub fn letter(&self) -> char {
        match self {
            Direction::Left => 'L',
            Direction::Right => 'R',
            Direction::Stay => 'N',
        }
    }

    /// The head offset this direction applies.
    pub fn offset(&self) -> i64 {
        match self {
            Direction::Left => -1,
            Direction::Right => 1,
            Direction::Stay => 0,
        }
    }
}

/// Runtime knobs for executing devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Limits {
    /// Step bound after which a tape machine is reported as not halting.
    pub max_steps: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_steps: DEFAULT_MAX_STEPS,
        }
    }
}

/// The outcome of running a recognizer (DFA or DPDA) over an input.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Verdict {
    /// All input was consumed and the device ended in a final state.
    Accept,
    Reject(Rejection),
}

impl Verdict {
    pub fn is_accept(&self) -> bool {
        matches!(self, Verdict::Accept)
    }
}

/// Details of a rejection outcome. Rejections are device behaviour, not errors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum Rejection {
    /// The input was consumed but the device stopped outside `final_states`.
    NonFinalState { state: String },
    /// A pushdown automaton had no move for the current configuration.
    /// `stack_top` is `None` once the stack has been emptied.
    NoTransition {
        state: String,
        symbol: char,
        stack_top: Option<char>,
    },
}

/// An input that cannot be fed to a device at all.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InputError {
    #[error("Symbol {symbol:?} at position {position} is not in the input alphabet")]
    UnknownSymbol { symbol: char, position: usize },
}

impl InputError {
    /// Rejects the first symbol of `input` that is outside `alphabet`.
    pub fn check(input: &str, alphabet: &BTreeSet<char>) -> Result<(), InputError> {
        input
            .chars()
            .enumerate()
            .find(|(_, symbol)| !alphabet.contains(symbol))
            .map_or(Ok(()), |(position, symbol)| {
                Err(InputError::UnknownSymbol { symbol, position })
            })
    }
}

/// Represents the errors surfaced by this crate.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum AutomatonError {
    /// The definition violates a structural invariant.
    #[error("Definition validation error: {0}")]
    Validation(#[from] ValidationError),
    /// The input string is not over the device's input alphabet.
    #[error("Invalid input: {0}")]
    Input(#[from] InputError),
    /// The definition document could not be decoded.
    #[error("Definition parsing error: {0}")]
    Parse(String),
    /// Indicates an error related to file system operations.
    #[error("File error: {0}")]
    File(String),
    /// A shared store could not be accessed.
    #[error("Storage error: {0}")]
    Storage(String),
    /// A lookup by name or identifier found nothing.
    #[error("Not found: {0}")]
    NotFound(String),
    /// The operation does not exist for this kind of device.
    #[error("Operation '{operation}' is not supported by {kind} devices")]
    Unsupported { operation: &'static str, kind: Kind },
}

impl From<serde_json::Error> for AutomatonError {
    fn from(error: serde_json::Error) -> Self {
        AutomatonError::Parse(error.to_string())
    }
}
