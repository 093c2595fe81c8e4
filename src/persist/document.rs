//! Versioned JSON save documents.
//!
//! ```text
//! {
//!   "version": "1.0",
//!   "timestamp": "2024-05-01T12:00:00Z",
//!   "name": "Friday game",
//!   "game_state": {
//!     "num_players": 2, "current_player": 1, "game_over": false, "winner": null,
//!     "players": {
//!       "1": { "home": [[3,2],[5,3]], "marbles": [[19,2],[15,3],null,null],
//!              "end": [15,3], "end_home": [null,null,null,null], "start_occupied": false },
//!       ...
//!     }
//!   }
//! }
//! ```
//!
//! `home` lists the coordinates of penned marbles in marble order and
//! `marbles[i]` is null exactly for those marbles. `end_home[i]` holds lane
//! slot `i` when a settled marble fills it. Derived fields are checked
//! against the marble positions on load.

use std::collections::BTreeMap;
use std::path::PathBuf;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::board::BoardTopology;
use crate::core::{
    Coordinate, GameConfig, GameState, MarbleState, PlayerId, PlayerState, MARBLES_PER_PLAYER,
    MAX_PLAYERS, STATE_VERSION,
};
use crate::rules::GameEngine;

use super::error::{PersistenceError, Result};

/// A complete save file.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SaveDocument {
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub name: String,
    pub game_state: GameStateDocument,
}

/// Board and turn state as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameStateDocument {
    pub num_players: usize,
    pub current_player: u8,
    pub game_over: bool,
    pub winner: Option<u8>,
    /// Keyed by seat number, `"1"` through `"4"`.
    pub players: BTreeMap<String, PlayerDocument>,
}

/// One seat as stored on disk.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDocument {
    pub home: Vec<Coordinate>,
    pub marbles: [Option<Coordinate>; MARBLES_PER_PLAYER],
    pub end: Option<Coordinate>,
    pub end_home: [Option<Coordinate>; MARBLES_PER_PLAYER],
    pub start_occupied: bool,
}

/// Summary of a save file, as shown in a load menu.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct SaveInfo {
    pub path: PathBuf,
    pub name: String,
    pub version: String,
    pub timestamp: DateTime<Utc>,
    pub current_player: u8,
    pub num_players: usize,
}

impl SaveInfo {
    #[must_use]
    pub fn new(path: PathBuf, document: &SaveDocument) -> Self {
        Self {
            path,
            name: document.name.clone(),
            version: document.version.clone(),
            timestamp: document.timestamp,
            current_player: document.game_state.current_player,
            num_players: document.game_state.num_players,
        }
    }
}

/// Snapshot a running game, stamped with the current time.
#[must_use]
pub fn to_document(engine: &GameEngine, name: &str) -> SaveDocument {
    SaveDocument::new(engine, name, Utc::now())
}

/// Restore a game on the standard board.
///
/// The die is reseeded from the operating system; roll history is not saved.
pub fn from_document(document: &SaveDocument) -> Result<GameEngine> {
    let players = document.game_state.num_players;
    if !(1..=MAX_PLAYERS).contains(&players) {
        return Err(corrupt(format!("num_players {players} is outside 1..=4")));
    }
    document.restore(GameConfig::new(players))
}

impl SaveDocument {
    /// Snapshot a running game.
    #[must_use]
    pub fn new(engine: &GameEngine, name: &str, timestamp: DateTime<Utc>) -> Self {
        let topology = engine.topology();
        let state = engine.state();

        let players = state
            .players()
            .map(|(id, player)| (id.0.to_string(), PlayerDocument::new(topology, player)))
            .collect();

        Self {
            version: state.version().to_string(),
            timestamp,
            name: name.to_string(),
            game_state: GameStateDocument {
                num_players: state.player_count(),
                current_player: state.current_player().0,
                game_over: state.is_game_over(),
                winner: state.winner().map(|w| w.0),
                players,
            },
        }
    }

    /// Parse a document, checking the version before the structure.
    pub fn from_json(json: &str) -> Result<Self> {
        let value: serde_json::Value = serde_json::from_str(json)?;
        let found = value
            .get("version")
            .and_then(serde_json::Value::as_str)
            .ok_or_else(|| corrupt("missing version"))?;
        if found != STATE_VERSION {
            return Err(PersistenceError::VersionMismatch {
                found: found.to_string(),
                expected: STATE_VERSION.to_string(),
            });
        }
        Ok(serde_json::from_value(value)?)
    }

    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Rebuild the game state on `topology`.
    pub fn to_state(&self, topology: &BoardTopology) -> Result<GameState> {
        let doc = &self.game_state;
        if !(1..=MAX_PLAYERS).contains(&doc.num_players) {
            return Err(corrupt(format!("num_players {} is outside 1..=4", doc.num_players)));
        }
        if let Some(key) = doc.players.keys().find(|key| parse_seat(key).is_none()) {
            return Err(corrupt(format!("unknown player key {key:?}")));
        }

        let mut state = GameState::new(doc.num_players);
        for seat in PlayerId::seats() {
            let player = doc
                .players
                .get(&seat.0.to_string())
                .ok_or_else(|| corrupt(format!("missing {seat}")))?;
            player.apply(topology, seat, state.player_mut(seat))?;
        }

        state.current_player = PlayerId::new(doc.current_player);
        state.game_over = doc.game_over;
        state.winner = doc.winner.map(PlayerId::new);
        Ok(state)
    }

    /// Restore a running game with the given configuration.
    pub fn restore(&self, config: GameConfig) -> Result<GameEngine> {
        let topology = BoardTopology::from_config(&config).map_err(|e| corrupt(e.to_string()))?;
        let state = self.to_state(&topology)?;
        GameEngine::from_state(config, state).map_err(|e| corrupt(e.to_string()))
    }
}

impl PlayerDocument {
    fn new(topology: &BoardTopology, player: &PlayerState) -> Self {
        let owner = player.player();
        let marbles = player.marbles();

        let home = marbles
            .iter()
            .filter(|m| m.is_in_pen())
            .filter_map(|m| m.coordinate(topology, owner))
            .collect();

        let mut end_home = [None; MARBLES_PER_PLAYER];
        for marble in marbles {
            if let MarbleState::InFinalHome(slot) = *marble {
                if let Some(cell) = end_home.get_mut(slot as usize) {
                    *cell = topology.lane_slot(owner, slot);
                }
            }
        }

        Self {
            home,
            marbles: std::array::from_fn(|i| marbles[i].board_coordinate(topology, owner)),
            end: player.last_position(),
            end_home,
            start_occupied: player.start_occupied(),
        }
    }

    /// Write this seat into `target`, checking the derived fields.
    fn apply(&self, topology: &BoardTopology, seat: PlayerId, target: &mut PlayerState) -> Result<()> {
        let penned = self.marbles.iter().filter(|m| m.is_none()).count();
        if self.home.len() != penned {
            return Err(corrupt(format!(
                "{seat} lists {} pen marbles but {penned} marbles are off the board",
                self.home.len()
            )));
        }

        let mut home = self.home.iter();
        for (i, position) in self.marbles.iter().enumerate() {
            let state = match position {
                None => {
                    let cell = home.next().copied().ok_or_else(|| corrupt("pen list ran short"))?;
                    topology
                        .pen_index(seat, cell)
                        .map(MarbleState::InPen)
                        .ok_or_else(|| corrupt(format!("{cell} is not a pen slot of {seat}")))?
                }
                Some(cell) => match topology.lane_index(seat, *cell) {
                    Some(slot) => MarbleState::OnHomeLane(slot),
                    None if topology.is_track(*cell) => MarbleState::OnTrack(*cell),
                    None => return Err(corrupt(format!("{seat} marble {i} is off the board at {cell}"))),
                },
            };
            target.set_marble(i as u8, state);
        }
        target.refresh(topology);
        if let Some(end) = self.end {
            if !topology.is_track(end) && topology.lane_index(seat, end).is_none() {
                return Err(corrupt(format!("{seat} last position {end} is off its path")));
            }
        }
        target.set_last_position(self.end);

        if target.start_occupied() != self.start_occupied {
            return Err(corrupt(format!("{seat} start_occupied does not match its marbles")));
        }
        if PlayerDocument::new(topology, target).end_home != self.end_home {
            return Err(corrupt(format!("{seat} end_home does not match its marbles")));
        }
        Ok(())
    }
}

fn parse_seat(key: &str) -> Option<PlayerId> {
    key.parse::<u8>().ok().map(PlayerId::new).filter(|id| id.is_seat())
}

fn corrupt(reason: impl Into<String>) -> PersistenceError {
    PersistenceError::Corrupt(reason.into())
}
