//! # aggravation
//!
//! Rules engine for Aggravation, the four-player marble race.
//!
//! Marbles leave a pen on a 1 or a 6, race clockwise around a shared track,
//! turn into their owner's home lane and must land exactly in the final home.
//! Landing on an opponent anywhere but its final home sends that marble back
//! to its pen. The first player with all four marbles home wins.
//!
//! ## Design Principles
//!
//! 1. **Data-driven board**: The track, lanes, pens and starts are derived
//!    from a textual template once. No rule compares literal coordinates.
//!
//! 2. **Seat-generic**: Every rule is written once and parameterized on
//!    `PlayerId`; per-player data lives in a `PlayerMap`.
//!
//! 3. **Atomic commands**: A command either commits fully, captures
//!    included, or leaves the state unchanged.
//!
//! ## Modules
//!
//! - `core`: Coordinates, players, marbles, state, move records, RNG, configuration
//! - `board`: Template parsing and the `BoardTopology` lookup tables
//! - `rules`: Move validation (`MoveResolver`) and the turn engine (`GameEngine`)
//! - `persist`: Versioned JSON save documents and the sandboxed `SaveStore`
//! - `sim`: Headless random-play simulation

pub mod core;
pub mod board;
pub mod rules;
pub mod persist;
pub mod sim;

// Re-export commonly used types
pub use crate::core::{
    Capture, Coordinate, GameConfig, GameRng, GameRngState, GameState, MarbleCounts, MarbleSelector,
    MarbleState, MoveRecord, MoveResult, PlayerId, PlayerMap, PlayerState, StateError,
};

pub use crate::board::{BoardError, BoardTemplate, BoardTopology, STANDARD_TEMPLATE};

pub use crate::rules::{GameEngine, GameError, MoveError, MoveResolver, RollOutcome, TurnPhase};

pub use crate::persist::{PersistenceError, SaveDocument, SaveInfo, SaveStore};

pub use crate::sim::{simulate_batch, simulate_game, BatchReport, GameSummary};
