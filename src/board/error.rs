//! Errors raised while building or walking the board.

use thiserror::Error;

use crate::core::{Coordinate, PlayerId};

/// Errors from template parsing and topology queries.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum BoardError {
    #[error("board template has no rows")]
    EmptyTemplate,

    #[error("template row {row} is {found} cells wide, expected {expected}")]
    RaggedRow {
        row: usize,
        expected: usize,
        found: usize,
    },

    #[error("unrecognized template cell {ch:?} at {at}")]
    UnknownCell { ch: char, at: Coordinate },

    #[error("malformed board: {0}")]
    Malformed(String),

    #[error("{0} is not a track cell")]
    OutOfBounds(Coordinate),

    #[error("{player} cannot step past the last final-home slot {at}")]
    Overshoot { player: PlayerId, at: Coordinate },
}
