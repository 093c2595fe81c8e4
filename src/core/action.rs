//! Move outcomes and history records.
//!
//! `MoveResult` is what a host gets back from a successful move: where the
//! marble came from and went, whether it sent an opponent home, and whether
//! it settled in the final home. `MoveRecord` adds the turn context for the
//! engine's history.

use serde::{Deserialize, Serialize};

use super::marble::MarbleSelector;
use super::{Coordinate, PlayerId};

/// An opponent marble sent back to its pen.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Capture {
    /// Owner of the captured marble.
    pub player: PlayerId,
    /// Index of the captured marble within its owner's set.
    pub marble: u8,
    /// Track cell the marble was taken from.
    pub at: Coordinate,
}

/// Outcome of a committed move.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MoveResult {
    /// Index of the marble that moved.
    pub marble: u8,
    /// Cell the marble left (a pen slot when leaving the pen).
    pub from: Coordinate,
    /// Cell the marble now occupies.
    pub to: Coordinate,
    pub captured_opponent: Option<Capture>,
    /// True when the marble ended the move settled in the final home.
    pub entered_final_home: bool,
}

/// A move with its turn context.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct MoveRecord {
    /// Turn number when the move was made (starts at 1).
    pub turn: u32,
    pub player: PlayerId,
    pub roll: u8,
    pub selector: MarbleSelector,
    pub result: MoveResult,
}

impl MoveRecord {
    /// Create a new move record.
    #[must_use]
    pub fn new(turn: u32, player: PlayerId, roll: u8, selector: MarbleSelector, result: MoveResult) -> Self {
        Self {
            turn,
            player,
            roll,
            selector,
            result,
        }
    }
}
