//! Marbles and per-player state.
//!
//! ## MarbleState
//!
//! Every marble is in exactly one of four places:
//!
//! - `InPen(slot)`: waiting in one of the owner's pen slots
//! - `OnTrack(coord)`: on the shared ring, capturable
//! - `OnHomeLane(index)`: inside the owner's lane with an empty slot ahead
//! - `InFinalHome(slot)`: packed against the end of the lane; never moves again
//!
//! Lane indices and final-home slots name the same four cells. A lane marble
//! is settled into `InFinalHome` once every deeper slot holds one of its
//! owner's marbles, which [`PlayerState::refresh`] re-derives after each move.

use serde::{Deserialize, Serialize};

use crate::board::BoardTopology;

use super::{Coordinate, PlayerId};

/// Marbles owned by each player.
pub const MARBLES_PER_PLAYER: usize = 4;

/// Where a single marble is.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarbleState {
    InPen(u8),
    OnTrack(Coordinate),
    OnHomeLane(u8),
    InFinalHome(u8),
}

impl MarbleState {
    #[must_use]
    pub fn is_in_pen(self) -> bool {
        matches!(self, MarbleState::InPen(_))
    }

    #[must_use]
    pub fn is_finished(self) -> bool {
        matches!(self, MarbleState::InFinalHome(_))
    }

    /// The lane slot this marble occupies, settled or not.
    #[must_use]
    pub fn lane_slot(self) -> Option<u8> {
        match self {
            MarbleState::OnHomeLane(slot) | MarbleState::InFinalHome(slot) => Some(slot),
            _ => None,
        }
    }

    /// The board cell this marble occupies, including pen slots.
    #[must_use]
    pub fn coordinate(self, topology: &BoardTopology, owner: PlayerId) -> Option<Coordinate> {
        match self {
            MarbleState::InPen(slot) => topology.pen_slot(owner, slot),
            MarbleState::OnTrack(coord) => Some(coord),
            MarbleState::OnHomeLane(slot) | MarbleState::InFinalHome(slot) => {
                topology.lane_slot(owner, slot)
            }
        }
    }

    /// The track or lane cell this marble occupies; `None` while in the pen.
    #[must_use]
    pub fn board_coordinate(self, topology: &BoardTopology, owner: PlayerId) -> Option<Coordinate> {
        match self {
            MarbleState::InPen(_) => None,
            other => other.coordinate(topology, owner),
        }
    }
}

/// Which marble a move applies to.
///
/// Leaving the pen is its own selector; the engine picks which pen marble goes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum MarbleSelector {
    ExitPen,
    MoveMarble(u8),
}

impl std::fmt::Display for MarbleSelector {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            MarbleSelector::ExitPen => write!(f, "exit pen"),
            MarbleSelector::MoveMarble(i) => write!(f, "marble {i}"),
        }
    }
}

/// How many of a player's marbles are in each state.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct MarbleCounts {
    pub in_pen: usize,
    pub on_track: usize,
    pub on_home_lane: usize,
    pub in_final_home: usize,
}

impl MarbleCounts {
    #[must_use]
    pub fn total(&self) -> usize {
        self.in_pen + self.on_track + self.on_home_lane + self.in_final_home
    }
}

/// One player's marbles plus derived flags.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerState {
    player: PlayerId,
    marbles: [MarbleState; MARBLES_PER_PLAYER],
    /// True iff one of this player's marbles sits on its start cell.
    start_occupied: bool,
    /// Where this player's most recently moved marble landed.
    last_position: Option<Coordinate>,
}

impl PlayerState {
    /// All marbles in the pen, one per slot.
    #[must_use]
    pub fn new(player: PlayerId) -> Self {
        Self {
            player,
            marbles: std::array::from_fn(|i| MarbleState::InPen(i as u8)),
            start_occupied: false,
            last_position: None,
        }
    }

    #[must_use]
    pub fn player(&self) -> PlayerId {
        self.player
    }

    #[must_use]
    pub fn marbles(&self) -> &[MarbleState; MARBLES_PER_PLAYER] {
        &self.marbles
    }

    #[must_use]
    pub fn marble(&self, index: u8) -> Option<MarbleState> {
        self.marbles.get(index as usize).copied()
    }

    #[must_use]
    pub fn start_occupied(&self) -> bool {
        self.start_occupied
    }

    #[must_use]
    pub fn last_position(&self) -> Option<Coordinate> {
        self.last_position
    }

    #[must_use]
    pub fn counts(&self) -> MarbleCounts {
        let mut counts = MarbleCounts::default();
        for marble in &self.marbles {
            match marble {
                MarbleState::InPen(_) => counts.in_pen += 1,
                MarbleState::OnTrack(_) => counts.on_track += 1,
                MarbleState::OnHomeLane(_) => counts.on_home_lane += 1,
                MarbleState::InFinalHome(_) => counts.in_final_home += 1,
            }
        }
        counts
    }

    /// True iff all marbles are settled in the final home.
    #[must_use]
    pub fn all_final_home(&self) -> bool {
        self.marbles.iter().all(|m| m.is_finished())
    }

    /// The marble that leaves the pen next: the highest-indexed one still there.
    #[must_use]
    pub fn next_pen_marble(&self) -> Option<u8> {
        self.marbles.iter().rposition(|m| m.is_in_pen()).map(|i| i as u8)
    }

    /// Lowest pen slot not holding a marble.
    #[must_use]
    pub fn first_free_pen_slot(&self) -> Option<u8> {
        (0..MARBLES_PER_PLAYER as u8).find(|slot| !self.marbles.contains(&MarbleState::InPen(*slot)))
    }

    /// Index of this player's marble on a track or lane cell.
    #[must_use]
    pub fn marble_on(&self, coord: Coordinate, topology: &BoardTopology) -> Option<u8> {
        self.marbles
            .iter()
            .position(|m| m.board_coordinate(topology, self.player) == Some(coord))
            .map(|i| i as u8)
    }

    pub(crate) fn set_marble(&mut self, index: u8, state: MarbleState) {
        self.marbles[index as usize] = state;
    }

    pub(crate) fn set_last_position(&mut self, coord: Option<Coordinate>) {
        self.last_position = coord;
    }

    /// Send a marble back to the first free pen slot.
    pub(crate) fn return_to_pen(&mut self, index: u8) {
        // At most three marbles are penned while this one is out.
        let slot = self.first_free_pen_slot().unwrap_or(index);
        self.marbles[index as usize] = MarbleState::InPen(slot);
    }

    /// Re-derive lane settlement and the start flag from marble positions.
    pub fn refresh(&mut self, topology: &BoardTopology) {
        let mut holders = [None; MARBLES_PER_PLAYER];
        for (i, marble) in self.marbles.iter().enumerate() {
            if let Some(slot) = marble.lane_slot() {
                if let Some(holder) = holders.get_mut(slot as usize) {
                    *holder = Some(i);
                }
            }
        }

        let mut packed = true;
        for slot in (0..MARBLES_PER_PLAYER).rev() {
            match holders[slot] {
                Some(i) if packed => self.marbles[i] = MarbleState::InFinalHome(slot as u8),
                Some(i) => self.marbles[i] = MarbleState::OnHomeLane(slot as u8),
                None => packed = false,
            }
        }

        let start = topology.start(self.player);
        self.start_occupied = self.marbles.contains(&MarbleState::OnTrack(start));
    }
}
