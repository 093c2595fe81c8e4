//! Game state snapshot.
//!
//! `GameState` holds everything needed to resume a game: all four seats'
//! marbles, whose turn it is, and the outcome. Seats beyond the player count
//! keep their marbles in the pen.
//!
//! A `GameState` is plain data; it can be assembled freely (for tests or from
//! a save file) and is validated with [`GameState::check_invariants`] before
//! an engine accepts it.

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::BoardTopology;

use super::marble::{MarbleCounts, MarbleState, PlayerState, MARBLES_PER_PLAYER};
use super::player::{PlayerId, PlayerMap, MAX_PLAYERS};
use super::Coordinate;

/// Version tag written with every saved state.
pub const STATE_VERSION: &str = "1.0";

/// A state that breaks one of the board invariants.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum StateError {
    #[error("player count {0} is outside 1..=4")]
    PlayerCount(usize),

    #[error("configured for {config} players but the state has {state}")]
    PlayerCountMismatch { config: usize, state: usize },

    #[error("seat {expected} holds state for {found}")]
    SeatMismatch { expected: PlayerId, found: PlayerId },

    #[error("current player {0} is not taking part")]
    InactiveCurrentPlayer(PlayerId),

    #[error("{player} marble {marble} is in an invalid position: {state:?}")]
    InvalidPosition {
        player: PlayerId,
        marble: u8,
        state: MarbleState,
    },

    #[error("{player} pen slot {slot} holds more than one marble")]
    PenSlotShared { player: PlayerId, slot: u8 },

    #[error("{0} is occupied by more than one marble")]
    CoOccupied(Coordinate),

    #[error("{0} start flag does not match the board")]
    StartFlagMismatch(PlayerId),

    #[error("{0} final-home settlement does not match the lane")]
    SettlementMismatch(PlayerId),

    #[error("game-over flag and winner disagree with the board")]
    WinnerMismatch,
}

/// Full game snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct GameState {
    version: String,
    player_count: usize,
    /// Every seat, including inactive ones.
    players: PlayerMap<PlayerState>,
    pub(crate) current_player: PlayerId,
    pub(crate) game_over: bool,
    pub(crate) winner: Option<PlayerId>,
}

impl GameState {
    /// Fresh game: every marble in its pen, seat 1 to move.
    #[must_use]
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(
            player_count <= MAX_PLAYERS,
            "At most {MAX_PLAYERS} players supported"
        );

        Self {
            version: STATE_VERSION.to_string(),
            player_count,
            players: PlayerMap::new(MAX_PLAYERS, PlayerState::new),
            current_player: PlayerId::new(1),
            game_over: false,
            winner: None,
        }
    }

    #[must_use]
    pub fn version(&self) -> &str {
        &self.version
    }

    #[must_use]
    pub fn player_count(&self) -> usize {
        self.player_count
    }

    /// Iterate over the seats taking part.
    pub fn player_ids(&self) -> impl Iterator<Item = PlayerId> {
        PlayerId::all(self.player_count)
    }

    /// State of one seat. Panics if `player` is not a seat.
    #[must_use]
    pub fn player(&self, player: PlayerId) -> &PlayerState {
        &self.players[player]
    }

    pub(crate) fn player_mut(&mut self, player: PlayerId) -> &mut PlayerState {
        &mut self.players[player]
    }

    /// Every seat's state, active or not.
    pub fn players(&self) -> impl Iterator<Item = (PlayerId, &PlayerState)> {
        self.players.iter()
    }

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.current_player
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.game_over
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.winner
    }

    #[must_use]
    pub fn counts(&self, player: PlayerId) -> MarbleCounts {
        self.players[player].counts()
    }

    /// The marble on a track or lane cell, if any.
    #[must_use]
    pub fn marble_at(&self, coord: Coordinate, topology: &BoardTopology) -> Option<(PlayerId, u8)> {
        self.players
            .iter()
            .find_map(|(id, state)| state.marble_on(coord, topology).map(|i| (id, i)))
    }

    // === Setup ===

    /// Put a marble somewhere directly, re-deriving the owner's flags.
    ///
    /// Intended for setting up positions; the result is only accepted by an
    /// engine if it passes [`GameState::check_invariants`]. Panics if `player`
    /// is not a seat or `marble` is not 0..=3.
    pub fn place_marble(&mut self, topology: &BoardTopology, player: PlayerId, marble: u8, state: MarbleState) {
        let seat = &mut self.players[player];
        seat.set_marble(marble, state);
        seat.refresh(topology);
    }

    pub fn set_current_player(&mut self, player: PlayerId) {
        self.current_player = player;
    }

    pub(crate) fn set_outcome(&mut self, winner: Option<PlayerId>) {
        self.game_over = winner.is_some();
        self.winner = winner;
    }

    pub(crate) fn set_last_position(&mut self, player: PlayerId, coord: Option<Coordinate>) {
        self.players[player].set_last_position(coord);
    }

    // === Validation ===

    /// Check every board invariant against `topology`.
    pub fn check_invariants(&self, topology: &BoardTopology) -> Result<(), StateError> {
        if !(1..=MAX_PLAYERS).contains(&self.player_count) {
            return Err(StateError::PlayerCount(self.player_count));
        }
        if !self.current_player.is_active(self.player_count) {
            return Err(StateError::InactiveCurrentPlayer(self.current_player));
        }

        let mut occupied: FxHashMap<Coordinate, (PlayerId, u8)> = FxHashMap::default();
        for (seat, player) in self.players.iter() {
            if player.player() != seat {
                return Err(StateError::SeatMismatch {
                    expected: seat,
                    found: player.player(),
                });
            }

            let mut pen_used = [false; MARBLES_PER_PLAYER];
            for (i, &marble) in player.marbles().iter().enumerate() {
                let invalid = StateError::InvalidPosition {
                    player: seat,
                    marble: i as u8,
                    state: marble,
                };
                match marble {
                    MarbleState::InPen(slot) => {
                        let used = pen_used.get_mut(slot as usize).ok_or(invalid)?;
                        if *used {
                            return Err(StateError::PenSlotShared { player: seat, slot });
                        }
                        *used = true;
                    }
                    MarbleState::OnTrack(coord) if !topology.is_track(coord) => return Err(invalid),
                    _ => {
                        let coord = marble.board_coordinate(topology, seat).ok_or(invalid)?;
                        if occupied.insert(coord, (seat, i as u8)).is_some() {
                            return Err(StateError::CoOccupied(coord));
                        }
                    }
                }
            }

            let mut derived = player.clone();
            derived.refresh(topology);
            if derived.start_occupied() != player.start_occupied() {
                return Err(StateError::StartFlagMismatch(seat));
            }
            if derived.marbles() != player.marbles() {
                return Err(StateError::SettlementMismatch(seat));
            }
        }

        match self.winner {
            Some(w) if !self.game_over || !w.is_active(self.player_count) => Err(StateError::WinnerMismatch),
            Some(w) if !self.players[w].all_final_home() => Err(StateError::WinnerMismatch),
            None if self.game_over => Err(StateError::WinnerMismatch),
            None if self.player_ids().any(|p| self.players[p].all_final_home()) => Err(StateError::WinnerMismatch),
            _ => Ok(()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn topo() -> BoardTopology {
        BoardTopology::standard().unwrap()
    }

    #[test]
    fn test_new_state() {
        let state = GameState::new(2);

        assert_eq!(state.player_count(), 2);
        assert_eq!(state.version(), STATE_VERSION);
        assert_eq!(state.current_player(), PlayerId::new(1));
        assert_eq!(state.players().count(), 4);
        for (_, player) in state.players() {
            assert_eq!(player.counts().in_pen, 4);
        }
        assert!(state.check_invariants(&topo()).is_ok());
    }

    #[test]
    fn test_marble_at() {
        let topo = topo();
        let mut state = GameState::new(4);

        state.place_marble(&topo, PlayerId::new(1), 0, MarbleState::OnTrack(Coordinate::new(19, 2)));
        state.place_marble(&topo, PlayerId::new(2), 1, MarbleState::OnTrack(Coordinate::new(25, 10)));
        state.place_marble(&topo, PlayerId::new(3), 2, MarbleState::OnTrack(Coordinate::new(11, 12)));

        assert_eq!(state.marble_at(Coordinate::new(19, 2), &topo), Some((PlayerId::new(1), 0)));
        assert_eq!(state.marble_at(Coordinate::new(25, 10), &topo), Some((PlayerId::new(2), 1)));
        assert_eq!(state.marble_at(Coordinate::new(11, 12), &topo), Some((PlayerId::new(3), 2)));
        assert_eq!(state.marble_at(Coordinate::new(1, 1), &topo), None);
    }

    #[test]
    fn test_co_occupancy_rejected() {
        let topo = topo();
        let mut state = GameState::new(2);
        let spot = Coordinate::new(19, 3);

        state.place_marble(&topo, PlayerId::new(1), 0, MarbleState::OnTrack(spot));
        state.place_marble(&topo, PlayerId::new(2), 0, MarbleState::OnTrack(spot));

        assert_eq!(state.check_invariants(&topo), Err(StateError::CoOccupied(spot)));
    }

    #[test]
    fn test_off_track_rejected() {
        let topo = topo();
        let mut state = GameState::new(2);

        state.place_marble(&topo, PlayerId::new(1), 0, MarbleState::OnTrack(Coordinate::new(15, 8)));

        assert!(matches!(
            state.check_invariants(&topo),
            Err(StateError::InvalidPosition { .. })
        ));
    }

    #[test]
    fn test_shared_pen_slot_rejected() {
        let topo = topo();
        let mut state = GameState::new(2);

        state.place_marble(&topo, PlayerId::new(1), 0, MarbleState::InPen(1));

        assert_eq!(
            state.check_invariants(&topo),
            Err(StateError::PenSlotShared {
                player: PlayerId::new(1),
                slot: 1
            })
        );
    }

    #[test]
    fn test_inactive_current_player_rejected() {
        let mut state = GameState::new(2);
        state.set_current_player(PlayerId::new(3));

        assert_eq!(
            state.check_invariants(&topo()),
            Err(StateError::InactiveCurrentPlayer(PlayerId::new(3)))
        );
    }

    #[test]
    fn test_winner_must_match_board() {
        let topo = topo();
        let mut state = GameState::new(2);
        state.set_outcome(Some(PlayerId::new(1)));

        assert_eq!(state.check_invariants(&topo), Err(StateError::WinnerMismatch));

        for i in 0..4u8 {
            state.place_marble(&topo, PlayerId::new(1), i, MarbleState::OnHomeLane(i));
        }
        assert!(state.check_invariants(&topo).is_ok());
    }

    #[test]
    fn test_unrecorded_win_rejected() {
        let topo = topo();
        let mut state = GameState::new(2);
        for i in 0..4u8 {
            state.place_marble(&topo, PlayerId::new(1), i, MarbleState::OnHomeLane(i));
        }

        assert!(state.player(PlayerId::new(1)).all_final_home());
        assert!(!state.is_game_over());
        assert_eq!(state.check_invariants(&topo), Err(StateError::WinnerMismatch));
    }
}
