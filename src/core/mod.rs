//! Core game types: coordinates, players, marbles, state, moves, RNG, configuration.
//!
//! Everything here is board-agnostic data. Positional meaning comes from the
//! `BoardTopology` built from the configured template.

pub mod coord;
pub mod player;
pub mod rng;
pub mod config;
pub mod marble;
pub mod action;
pub mod state;

pub use coord::Coordinate;
pub use player::{PlayerId, PlayerMap, MAX_PLAYERS};
pub use rng::{GameRng, GameRngState, DIE_FACES};
pub use config::{GameConfig, DEFAULT_START_OFFSET};
pub use marble::{MarbleCounts, MarbleSelector, MarbleState, PlayerState, MARBLES_PER_PLAYER};
pub use action::{Capture, MoveRecord, MoveResult};
pub use state::{GameState, StateError, STATE_VERSION};
