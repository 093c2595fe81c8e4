//! Aggravation rules.
//!
//! - `resolver`: pure move validation and path resolution
//! - `engine`: the turn state machine, captures and win detection
//!
//! The engine calls into the resolver and never touches rendering or I/O.

pub mod error;
pub mod resolver;
pub mod engine;

pub use error::{MoveError, PenBlockReason};
pub use resolver::{is_exit_roll, MovePath, MovePlan, MoveResolver, ValidMoves};
pub use engine::{GameEngine, GameError, RollOutcome, TurnPhase};
