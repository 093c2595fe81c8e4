//! Turn orchestration.
//!
//! `GameEngine` owns the board topology, the game state and the die. A turn
//! runs in two commands:
//!
//! 1. `roll_dice` (or `apply_roll` with a physical die value). If the roll
//!    leaves no legal move the turn is forfeit and play passes on at once.
//! 2. `execute_move` with one of the selectors the roll allowed.
//!
//! Every command either commits fully or leaves the state untouched.

use im::Vector;
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::board::{BoardError, BoardTopology};
use crate::core::{
    Capture, Coordinate, GameConfig, GameRng, GameRngState, GameState, MarbleSelector, MoveRecord,
    MoveResult, PlayerId, StateError,
};

use super::error::MoveError;
use super::resolver::{MoveResolver, ValidMoves};

/// Where the engine is within a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TurnPhase {
    /// The current player has to roll.
    AwaitingRoll,
    /// The current player rolled and has to pick a move for that roll.
    AwaitingMoveSelection { roll: u8 },
    /// Someone won; no further commands are accepted.
    Finished,
}

/// What a roll allows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum RollOutcome {
    /// At least one move is legal; one of them must be executed.
    MustMove { roll: u8, moves: ValidMoves },
    /// Nothing is legal. The turn has already passed to `next_player`.
    Forfeit { roll: u8, next_player: PlayerId },
}

impl RollOutcome {
    #[must_use]
    pub fn roll(&self) -> u8 {
        match self {
            RollOutcome::MustMove { roll, .. } | RollOutcome::Forfeit { roll, .. } => *roll,
        }
    }
}

/// Errors from engine commands.
#[derive(Clone, Debug, PartialEq, Eq, Error)]
pub enum GameError {
    #[error("the game is over")]
    GameOver,

    #[error("it is {expected}'s turn, not {actual}'s")]
    NotPlayersTurn { expected: PlayerId, actual: PlayerId },

    #[error("command not allowed while {phase:?}")]
    UnexpectedPhase { phase: TurnPhase },

    #[error("move submitted for a roll of {submitted} but {rolled} was rolled")]
    RollMismatch { rolled: u8, submitted: u8 },

    #[error("invalid move: {0}")]
    InvalidMove(#[from] MoveError),

    #[error(transparent)]
    Board(#[from] BoardError),

    #[error("invalid game state: {0}")]
    InvalidState(#[from] StateError),
}

/// A running game.
///
/// ## Example
///
/// ```
/// use aggravation::core::{GameConfig, MarbleSelector};
/// use aggravation::rules::{GameEngine, RollOutcome};
///
/// let mut engine = GameEngine::new(GameConfig::new(2).with_seed(7)).unwrap();
/// let player = engine.current_player();
///
/// match engine.apply_roll(6).unwrap() {
///     RollOutcome::MustMove { moves, .. } => {
///         assert_eq!(moves.as_slice(), &[MarbleSelector::ExitPen]);
///         let result = engine.execute_move(player, MarbleSelector::ExitPen, 6).unwrap();
///         assert_eq!(Some(result.to), engine.state().player(player).last_position());
///     }
///     RollOutcome::Forfeit { .. } => unreachable!("a 6 always leaves the pen on a fresh board"),
/// }
/// ```
#[derive(Clone, Debug)]
pub struct GameEngine {
    config: GameConfig,
    topology: BoardTopology,
    state: GameState,
    phase: TurnPhase,
    rng: GameRng,
    history: Vector<MoveRecord>,
    /// Turns completed so far, forfeits included.
    turns: u32,
}

impl GameEngine {
    /// Start a fresh game: every marble penned, seat 1 to roll.
    pub fn new(config: GameConfig) -> Result<Self, GameError> {
        let state = GameState::new(config.player_count);
        Self::from_state(config, state)
    }

    /// Resume from a snapshot, rejecting it if any board invariant fails.
    pub fn from_state(config: GameConfig, state: GameState) -> Result<Self, GameError> {
        let topology = BoardTopology::from_config(&config)?;
        if state.player_count() != config.player_count {
            return Err(StateError::PlayerCountMismatch {
                config: config.player_count,
                state: state.player_count(),
            }
            .into());
        }
        state.check_invariants(&topology)?;

        let phase = if state.is_game_over() {
            TurnPhase::Finished
        } else {
            TurnPhase::AwaitingRoll
        };

        tracing::debug!(
            "Game ready: {} players, {} to roll, seed {}",
            config.player_count,
            state.current_player(),
            config.seed
        );

        Ok(Self {
            rng: GameRng::new(config.seed),
            config,
            topology,
            state,
            phase,
            history: Vector::new(),
            turns: 0,
        })
    }

    // === Queries ===

    #[must_use]
    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    #[must_use]
    pub fn topology(&self) -> &BoardTopology {
        &self.topology
    }

    /// Read-only snapshot of the game.
    #[must_use]
    pub fn state(&self) -> &GameState {
        &self.state
    }

    #[must_use]
    pub fn phase(&self) -> TurnPhase {
        self.phase
    }

    #[must_use]
    pub fn current_player(&self) -> PlayerId {
        self.state.current_player()
    }

    /// Moves made so far, oldest first.
    #[must_use]
    pub fn history(&self) -> &Vector<MoveRecord> {
        &self.history
    }

    #[must_use]
    pub fn turns(&self) -> u32 {
        self.turns
    }

    #[must_use]
    pub fn rng_state(&self) -> GameRngState {
        self.rng.state()
    }

    /// Legal selectors for `player` on `roll`. Empty is a forced pass.
    #[must_use]
    pub fn valid_moves(&self, player: PlayerId, roll: u8) -> ValidMoves {
        MoveResolver::valid_moves(&self.topology, &self.state, player, roll)
    }

    pub fn validate(&self, player: PlayerId, selector: MarbleSelector, roll: u8) -> Result<(), MoveError> {
        MoveResolver::validate(&self.topology, &self.state, player, selector, roll)
    }

    pub fn resolve_path(&self, player: PlayerId, selector: MarbleSelector, roll: u8) -> Result<Coordinate, MoveError> {
        MoveResolver::resolve_path(&self.topology, &self.state, player, selector, roll)
    }

    /// True iff all of `player`'s marbles are settled in the final home.
    #[must_use]
    pub fn check_win(&self, player: PlayerId) -> bool {
        player.is_active(self.state.player_count())
            && MoveResolver::all_final_home(self.state.player(player))
    }

    #[must_use]
    pub fn is_game_over(&self) -> bool {
        self.state.is_game_over() || self.state.player_ids().any(|p| self.check_win(p))
    }

    #[must_use]
    pub fn winner(&self) -> Option<PlayerId> {
        self.state.winner()
    }

    /// The marble on a track or lane cell, if any.
    #[must_use]
    pub fn marble_at(&self, coord: Coordinate) -> Option<(PlayerId, u8)> {
        self.state.marble_at(coord, &self.topology)
    }

    // === Commands ===

    /// Roll the engine's die for the current player.
    pub fn roll_dice(&mut self) -> Result<RollOutcome, GameError> {
        self.expect_roll_phase()?;
        let roll = self.rng.roll_die();
        self.apply_roll(roll)
    }

    /// Apply a die value rolled outside the engine.
    pub fn apply_roll(&mut self, roll: u8) -> Result<RollOutcome, GameError> {
        self.expect_roll_phase()?;
        MoveResolver::validate_roll(roll)?;

        let player = self.current_player();
        let moves = self.valid_moves(player, roll);
        if moves.is_empty() {
            let next_player = self.pass_turn();
            tracing::debug!("{} rolled {} with no legal move, {} is up", player, roll, next_player);
            return Ok(RollOutcome::Forfeit { roll, next_player });
        }

        tracing::debug!("{} rolled {}: {} legal moves", player, roll, moves.len());
        self.phase = TurnPhase::AwaitingMoveSelection { roll };
        Ok(RollOutcome::MustMove { roll, moves })
    }

    /// Move one marble for the roll just made.
    ///
    /// Any opponent marble on the destination is found and sent back to its
    /// pen before the mover is written there.
    pub fn execute_move(&mut self, player: PlayerId, selector: MarbleSelector, roll: u8) -> Result<MoveResult, GameError> {
        if self.phase == TurnPhase::Finished || self.state.is_game_over() {
            return Err(GameError::GameOver);
        }
        let expected = self.current_player();
        if player != expected {
            return Err(GameError::NotPlayersTurn {
                expected,
                actual: player,
            });
        }
        match self.phase {
            TurnPhase::AwaitingMoveSelection { roll: rolled } if rolled == roll => {}
            TurnPhase::AwaitingMoveSelection { roll: rolled } => {
                return Err(GameError::RollMismatch {
                    rolled,
                    submitted: roll,
                })
            }
            phase => return Err(GameError::UnexpectedPhase { phase }),
        }

        let plan = MoveResolver::plan(&self.topology, &self.state, player, selector, roll)?;
        let to = plan.destination();

        let captured_opponent = self
            .state
            .player_ids()
            .filter(|&other| other != player && !self.topology.is_final_home(other, to))
            .find_map(|other| {
                self.state
                    .player(other)
                    .marble_on(to, &self.topology)
                    .map(|marble| Capture {
                        player: other,
                        marble,
                        at: to,
                    })
            });

        if let Some(capture) = captured_opponent {
            let victim = self.state.player_mut(capture.player);
            victim.return_to_pen(capture.marble);
            victim.refresh(&self.topology);
            tracing::debug!("{} sent {} marble {} home from {}", player, capture.player, capture.marble, to);
        }

        let mover = self.state.player_mut(player);
        mover.set_marble(plan.marble, plan.to);
        mover.refresh(&self.topology);
        self.state.set_last_position(player, Some(to));

        let entered_final_home = self
            .state
            .player(player)
            .marble(plan.marble)
            .is_some_and(|m| m.is_finished());

        let result = MoveResult {
            marble: plan.marble,
            from: plan.from,
            to,
            captured_opponent,
            entered_final_home,
        };
        tracing::debug!("{} moved {} from {} to {} on a {}", player, selector, plan.from, to, roll);

        self.history
            .push_back(MoveRecord::new(self.turns + 1, player, roll, selector, result));

        if self.check_win(player) {
            self.state.set_outcome(Some(player));
            self.phase = TurnPhase::Finished;
            self.turns += 1;
            tracing::info!("{} wins after {} turns", player, self.turns);
        } else {
            self.pass_turn();
        }

        Ok(result)
    }

    fn expect_roll_phase(&self) -> Result<(), GameError> {
        match self.phase {
            _ if self.state.is_game_over() => Err(GameError::GameOver),
            TurnPhase::AwaitingRoll => Ok(()),
            TurnPhase::Finished => Err(GameError::GameOver),
            phase => Err(GameError::UnexpectedPhase { phase }),
        }
    }

    /// Hand the turn to the next active seat.
    fn pass_turn(&mut self) -> PlayerId {
        let next = self.current_player().next(self.state.player_count());
        self.state.set_current_player(next);
        self.phase = TurnPhase::AwaitingRoll;
        self.turns += 1;
        next
    }
}
