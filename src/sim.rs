//! Headless random-play simulation.
//!
//! Every active seat picks uniformly among its legal moves. Useful for
//! smoke-testing the rules over many full games and for rough statistics
//! on game length.

use serde::Serialize;

use crate::core::{GameConfig, GameRng, PlayerId, PlayerMap};
use crate::rules::{GameEngine, GameError, RollOutcome};

/// Outcome of one simulated game.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GameSummary {
    pub seed: u64,
    /// Turns played, forfeits included.
    pub turns: u32,
    pub moves: usize,
    pub captures: usize,
    /// `None` if the turn limit was reached first.
    pub winner: Option<PlayerId>,
}

/// Aggregate statistics over a batch of games.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct BatchReport {
    pub games_played: usize,
    pub games_completed: usize,
    pub total_turns: u64,
    /// Turns summed over completed games only.
    pub completed_turns: u64,
    pub total_captures: usize,
    /// Turn counts over completed games only.
    pub min_turns: Option<u32>,
    pub max_turns: Option<u32>,
    pub wins: PlayerMap<usize>,
}

impl BatchReport {
    fn new(player_count: usize) -> Self {
        Self {
            games_played: 0,
            games_completed: 0,
            total_turns: 0,
            completed_turns: 0,
            total_captures: 0,
            min_turns: None,
            max_turns: None,
            wins: PlayerMap::with_value(player_count, 0),
        }
    }

    fn record(&mut self, game: &GameSummary) {
        self.games_played += 1;
        self.total_turns += u64::from(game.turns);
        self.total_captures += game.captures;

        if let Some(winner) = game.winner {
            self.games_completed += 1;
            self.completed_turns += u64::from(game.turns);
            self.wins[winner] += 1;
            self.min_turns = Some(self.min_turns.map_or(game.turns, |t| t.min(game.turns)));
            self.max_turns = Some(self.max_turns.map_or(game.turns, |t| t.max(game.turns)));
        }
    }

    /// Mean turns per completed game.
    #[must_use]
    pub fn mean_turns(&self) -> Option<f64> {
        if self.games_completed == 0 {
            return None;
        }
        Some(self.completed_turns as f64 / self.games_completed as f64)
    }

    /// Share of games that produced a winner, 0.0 to 1.0.
    #[must_use]
    pub fn completion_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            self.games_completed as f64 / self.games_played as f64
        }
    }
}

/// Play one game to a win or `max_turns`, whichever comes first.
pub fn simulate_game(config: GameConfig, max_turns: u32) -> Result<GameSummary, GameError> {
    let seed = config.seed;
    let mut chooser = GameRng::new(seed).for_context("simulation");
    let mut engine = GameEngine::new(config)?;
    let mut moves = 0;
    let mut captures = 0;

    while !engine.is_game_over() && engine.turns() < max_turns {
        let player = engine.current_player();
        if let RollOutcome::MustMove { roll, moves: options } = engine.roll_dice()? {
            let Some(&selector) = chooser.choose(&options) else {
                break;
            };
            let result = engine.execute_move(player, selector, roll)?;
            moves += 1;
            if result.captured_opponent.is_some() {
                captures += 1;
            }
        }
    }

    let summary = GameSummary {
        seed,
        turns: engine.turns(),
        moves,
        captures,
        winner: engine.winner(),
    };
    tracing::debug!(
        "Simulated game seed {}: {} turns, {} moves, {} captures, winner {:?}",
        summary.seed,
        summary.turns,
        summary.moves,
        summary.captures,
        summary.winner
    );
    Ok(summary)
}

/// Play `games` games with seeds forked from `config.seed`.
pub fn simulate_batch(config: &GameConfig, games: usize, max_turns: u32) -> Result<BatchReport, GameError> {
    let mut seeds = GameRng::new(config.seed);
    let mut report = BatchReport::new(config.player_count);

    for _ in 0..games {
        let seed = seeds.fork().seed();
        let summary = simulate_game(config.clone().with_seed(seed), max_turns)?;
        report.record(&summary);
    }

    tracing::info!(
        "Simulated {} games: {} completed, mean turns {:?}, {} captures",
        report.games_played,
        report.games_completed,
        report.mean_turns(),
        report.total_captures
    );
    Ok(report)
}
