//! Move validation and path resolution.
//!
//! The `MoveResolver` works on a `GameState` snapshot without modifying it.
//! A move is replayed one step at a time so that every cell the marble
//! passes through is checked, not just the destination.

use smallvec::SmallVec;

use crate::board::{BoardError, BoardTopology};
use crate::core::{Coordinate, GameState, MarbleSelector, MarbleState, PlayerId, PlayerState, DIE_FACES, MARBLES_PER_PLAYER};

use super::error::{MoveError, PenBlockReason};

/// Legal selectors for one roll. At most the pen exit plus every marble.
pub type ValidMoves = SmallVec<[MarbleSelector; MARBLES_PER_PLAYER + 1]>;

/// Cells visited by one move, in order. The last entry is the destination.
pub type MovePath = SmallVec<[Coordinate; DIE_FACES as usize]>;

/// Whether a die value lets a marble leave the pen.
#[must_use]
pub fn is_exit_roll(roll: u8) -> bool {
    roll == 1 || roll == 6
}

/// A validated move, ready to be committed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MovePlan {
    pub player: PlayerId,
    /// Index of the marble that moves.
    pub marble: u8,
    /// Where the marble starts (its pen slot when leaving the pen).
    pub from: Coordinate,
    /// Marble state once the move lands, before lane settlement.
    pub to: MarbleState,
    pub path: MovePath,
}

impl MovePlan {
    /// Final cell of the move.
    #[must_use]
    pub fn destination(&self) -> Coordinate {
        // A plan always records at least one step.
        self.path.last().copied().unwrap_or(self.from)
    }
}

/// Pure move rules over a state snapshot.
pub struct MoveResolver;

impl MoveResolver {
    /// Check a move without computing anything else.
    pub fn validate(
        topology: &BoardTopology,
        state: &GameState,
        player: PlayerId,
        selector: MarbleSelector,
        roll: u8,
    ) -> Result<(), MoveError> {
        Self::plan(topology, state, player, selector, roll).map(|_| ())
    }

    /// Destination of a legal move.
    pub fn resolve_path(
        topology: &BoardTopology,
        state: &GameState,
        player: PlayerId,
        selector: MarbleSelector,
        roll: u8,
    ) -> Result<Coordinate, MoveError> {
        Self::plan(topology, state, player, selector, roll).map(|plan| plan.destination())
    }

    /// Reject die values the game's die cannot show.
    pub fn validate_roll(roll: u8) -> Result<(), MoveError> {
        if (1..=DIE_FACES).contains(&roll) {
            Ok(())
        } else {
            Err(MoveError::InvalidDieRoll(roll))
        }
    }

    /// Validate a move and describe what committing it would do.
    pub fn plan(
        topology: &BoardTopology,
        state: &GameState,
        player: PlayerId,
        selector: MarbleSelector,
        roll: u8,
    ) -> Result<MovePlan, MoveError> {
        Self::validate_roll(roll)?;
        if !player.is_active(state.player_count()) {
            return Err(MoveError::InvalidPlayer(player));
        }

        let mover = state.player(player);
        match selector {
            MarbleSelector::ExitPen => Self::plan_exit(topology, mover, roll),
            MarbleSelector::MoveMarble(index) => Self::plan_step(topology, mover, index, roll),
        }
    }

    fn plan_exit(topology: &BoardTopology, mover: &PlayerState, roll: u8) -> Result<MovePlan, MoveError> {
        let player = mover.player();
        let marble = mover
            .next_pen_marble()
            .ok_or(MoveError::NoMarbleAvailable(player))?;
        if !is_exit_roll(roll) {
            return Err(MoveError::PenBlocked {
                reason: PenBlockReason::NotAnExitRoll,
            });
        }
        if mover.start_occupied() {
            return Err(MoveError::PenBlocked {
                reason: PenBlockReason::StartOccupied,
            });
        }

        let from = mover
            .marble(marble)
            .and_then(|m| m.coordinate(topology, player))
            .ok_or_else(|| MoveError::OffBoard {
                marble,
                source: BoardError::Malformed(format!("{player} marble {marble} has no pen slot")),
            })?;
        let start = topology.start(player);

        Ok(MovePlan {
            player,
            marble,
            from,
            to: MarbleState::OnTrack(start),
            path: SmallVec::from_slice(&[start]),
        })
    }

    fn plan_step(topology: &BoardTopology, mover: &PlayerState, marble: u8, roll: u8) -> Result<MovePlan, MoveError> {
        let player = mover.player();
        let state = mover
            .marble(marble)
            .ok_or(MoveError::InvalidMarbleIndex(marble))?;

        let from = match state {
            MarbleState::InPen(_) => return Err(MoveError::MarbleInPen(marble)),
            MarbleState::InFinalHome(_) => return Err(MoveError::MarbleFinished(marble)),
            MarbleState::OnTrack(coord) if topology.is_track(coord) => coord,
            MarbleState::OnTrack(coord) => {
                return Err(MoveError::OffBoard {
                    marble,
                    source: BoardError::OutOfBounds(coord),
                })
            }
            MarbleState::OnHomeLane(slot) => {
                topology
                    .lane_slot(player, slot)
                    .ok_or_else(|| MoveError::OffBoard {
                        marble,
                        source: BoardError::Malformed(format!("{player} has no lane slot {slot}")),
                    })?
            }
        };

        let mut path = MovePath::new();
        let mut current = from;
        for _ in 0..roll {
            current = topology
                .next_on_home_lane(player, current)
                .map_err(|err| match err {
                    BoardError::Overshoot { .. } => MoveError::Overshoot { roll },
                    source => MoveError::OffBoard { marble, source },
                })?;
            if mover.marble_on(current, topology).is_some_and(|other| other != marble) {
                return Err(MoveError::OwnMarbleBlock(current));
            }
            path.push(current);
        }

        let to = match topology.lane_index(player, current) {
            Some(slot) => MarbleState::OnHomeLane(slot),
            None => MarbleState::OnTrack(current),
        };

        Ok(MovePlan {
            player,
            marble,
            from,
            to,
            path,
        })
    }

    /// Every legal selector for `player` on `roll`: pen exit first, then
    /// marbles in index order. Empty means the turn is forfeit.
    #[must_use]
    pub fn valid_moves(topology: &BoardTopology, state: &GameState, player: PlayerId, roll: u8) -> ValidMoves {
        std::iter::once(MarbleSelector::ExitPen)
            .chain((0..MARBLES_PER_PLAYER as u8).map(MarbleSelector::MoveMarble))
            .filter(|&selector| Self::validate(topology, state, player, selector, roll).is_ok())
            .collect()
    }

    /// True iff every marble is settled in the final home.
    #[must_use]
    pub fn all_final_home(player: &PlayerState) -> bool {
        player.all_final_home()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn c(x: i32, y: i32) -> Coordinate {
        Coordinate::new(x, y)
    }

    fn p(id: u8) -> PlayerId {
        PlayerId::new(id)
    }

    fn setup() -> (BoardTopology, GameState) {
        (BoardTopology::standard().unwrap(), GameState::new(4))
    }

    #[test]
    fn test_fresh_game_needs_exit_roll() {
        let (topo, state) = setup();

        assert!(MoveResolver::valid_moves(&topo, &state, p(1), 3).is_empty());
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::ExitPen, 3),
            Err(MoveError::PenBlocked {
                reason: PenBlockReason::NotAnExitRoll
            })
        );
        for roll in [1, 6] {
            assert_eq!(
                MoveResolver::valid_moves(&topo, &state, p(1), roll).as_slice(),
                &[MarbleSelector::ExitPen]
            );
        }
    }

    #[test]
    fn test_exit_takes_highest_pen_marble() {
        let (topo, state) = setup();

        let plan = MoveResolver::plan(&topo, &state, p(2), MarbleSelector::ExitPen, 6).unwrap();
        assert_eq!(plan.marble, 3);
        assert_eq!(plan.from, c(21, 5));
        assert_eq!(plan.to, MarbleState::OnTrack(c(29, 10)));
        assert_eq!(plan.destination(), c(29, 10));
    }

    #[test]
    fn test_exit_blocked_by_own_marble_on_start() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 3, MarbleState::OnTrack(c(19, 1)));

        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::ExitPen, 1),
            Err(MoveError::PenBlocked {
                reason: PenBlockReason::StartOccupied
            })
        );
    }

    #[test]
    fn test_exit_with_empty_pen() {
        let (topo, mut state) = setup();
        let ring = [c(19, 2), c(19, 3), c(19, 4), c(19, 5)];
        for (i, coord) in ring.into_iter().enumerate() {
            state.place_marble(&topo, p(1), i as u8, MarbleState::OnTrack(coord));
        }

        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::ExitPen, 6),
            Err(MoveError::NoMarbleAvailable(p(1)))
        );
    }

    #[test]
    fn test_ring_step() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnTrack(c(19, 1)));

        let plan = MoveResolver::plan(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 3).unwrap();
        assert_eq!(plan.path.as_slice(), &[c(19, 2), c(19, 3), c(19, 4)]);
        assert_eq!(plan.to, MarbleState::OnTrack(c(19, 4)));
    }

    #[test]
    fn test_turn_into_lane() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnTrack(c(11, 3)));

        // (11,3) -> (11,2) -> (11,1) -> (13,1) -> (15,1) -> lane (15,2) -> (15,3)
        let dest = MoveResolver::resolve_path(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 6).unwrap();
        assert_eq!(dest, c(15, 3));

        let plan = MoveResolver::plan(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 6).unwrap();
        assert_eq!(plan.to, MarbleState::OnHomeLane(1));
    }

    #[test]
    fn test_overshoot() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnHomeLane(1));

        assert!(MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 2).is_ok());
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 3),
            Err(MoveError::Overshoot { roll: 3 })
        );
    }

    #[test]
    fn test_own_marble_blocks_any_step() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnTrack(c(19, 2)));
        state.place_marble(&topo, p(1), 1, MarbleState::OnTrack(c(19, 4)));

        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 2),
            Err(MoveError::OwnMarbleBlock(c(19, 4)))
        );
        // Passing over counts too.
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 5),
            Err(MoveError::OwnMarbleBlock(c(19, 4)))
        );
    }

    #[test]
    fn test_opponents_are_jumped() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnTrack(c(19, 2)));
        state.place_marble(&topo, p(2), 0, MarbleState::OnTrack(c(19, 3)));

        let dest = MoveResolver::resolve_path(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 4).unwrap();
        assert_eq!(dest, c(19, 6));
    }

    #[test]
    fn test_selector_errors() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnHomeLane(3));

        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(1), 1),
            Err(MoveError::MarbleInPen(1))
        );
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 1),
            Err(MoveError::MarbleFinished(0))
        );
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::MoveMarble(4), 1),
            Err(MoveError::InvalidMarbleIndex(4))
        );
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::ExitPen, 0),
            Err(MoveError::InvalidDieRoll(0))
        );
        assert_eq!(
            MoveResolver::validate(&topo, &state, p(1), MarbleSelector::ExitPen, 7),
            Err(MoveError::InvalidDieRoll(7))
        );
    }

    #[test]
    fn test_inactive_player() {
        let topo = BoardTopology::standard().unwrap();
        let state = GameState::new(2);

        assert_eq!(
            MoveResolver::validate(&topo, &state, p(3), MarbleSelector::ExitPen, 6),
            Err(MoveError::InvalidPlayer(p(3)))
        );
        assert!(MoveResolver::valid_moves(&topo, &state, p(3), 6).is_empty());
    }

    #[test]
    fn test_valid_moves_order() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnTrack(c(19, 3)));

        let moves = MoveResolver::valid_moves(&topo, &state, p(1), 6);
        assert_eq!(
            moves.as_slice(),
            &[MarbleSelector::ExitPen, MarbleSelector::MoveMarble(0)]
        );
    }

    #[test]
    fn test_validation_is_pure() {
        let (topo, mut state) = setup();
        state.place_marble(&topo, p(1), 0, MarbleState::OnTrack(c(19, 3)));
        let before = state.clone();

        let first = MoveResolver::plan(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 4);
        let second = MoveResolver::plan(&topo, &state, p(1), MarbleSelector::MoveMarble(0), 4);
        assert_eq!(first, second);
        assert_eq!(state, before);
    }
}
