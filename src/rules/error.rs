//! Move rejection reasons.

use thiserror::Error;

use crate::board::BoardError;
use crate::core::{Coordinate, PlayerId};

/// Why a candidate move is illegal.
///
/// Every variant is recoverable; a rejected move never changes the game state.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum MoveError {
    #[error("roll of {roll} would carry the marble past the last final-home slot")]
    Overshoot { roll: u8 },

    #[error("{0} is already occupied by one of the mover's own marbles")]
    OwnMarbleBlock(Coordinate),

    #[error("cannot leave the pen: {reason}")]
    PenBlocked { reason: PenBlockReason },

    #[error("{0} has no marble left in the pen")]
    NoMarbleAvailable(PlayerId),

    #[error("{0} is not taking part in this game")]
    InvalidPlayer(PlayerId),

    #[error("marble index {0} is out of range")]
    InvalidMarbleIndex(u8),

    #[error("die roll {0} is outside 1..=6")]
    InvalidDieRoll(u8),

    #[error("marble {0} is still in the pen")]
    MarbleInPen(u8),

    #[error("marble {0} is settled in the final home")]
    MarbleFinished(u8),

    #[error("marble {marble} is not on the board: {source}")]
    OffBoard {
        marble: u8,
        #[source]
        source: BoardError,
    },
}

/// Why the pen cannot be left on this roll.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PenBlockReason {
    /// Only a 1 or a 6 brings a marble out.
    NotAnExitRoll,
    /// One of the player's own marbles is sitting on the start.
    StartOccupied,
}

impl std::fmt::Display for PenBlockReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PenBlockReason::NotAnExitRoll => write!(f, "a 1 or a 6 is needed"),
            PenBlockReason::StartOccupied => write!(f, "own marble on the start"),
        }
    }
}
