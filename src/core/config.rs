//! Game configuration.
//!
//! Hosts configure a game at startup with a `GameConfig`:
//! - how many seats take part
//! - the RNG seed for die rolls
//! - the board template the topology is built from
//! - how far past the lane entrance each player's start sits
//!
//! The engine never hardcodes board coordinates; everything positional is
//! derived from the template.

use crate::board::STANDARD_TEMPLATE;

use super::player::MAX_PLAYERS;
use super::rng::GameRng;

/// Default ring distance from a lane entrance to that player's start.
pub const DEFAULT_START_OFFSET: usize = 2;

/// Complete game configuration.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GameConfig {
    /// Number of seats taking part (1-4). Seats above this count keep their
    /// marbles in the pen and never take a turn.
    pub player_count: usize,

    /// Seed for die rolls.
    pub seed: u64,

    /// Board template rows.
    pub template: Vec<String>,

    /// Ring steps from a lane entrance forward to the player's start.
    pub start_offset: usize,
}

impl GameConfig {
    /// Create a configuration for the standard board with an OS-derived seed.
    pub fn new(player_count: usize) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(
            player_count <= MAX_PLAYERS,
            "At most {MAX_PLAYERS} players supported"
        );

        Self {
            player_count,
            seed: GameRng::from_entropy().seed(),
            template: STANDARD_TEMPLATE.iter().map(|row| row.to_string()).collect(),
            start_offset: DEFAULT_START_OFFSET,
        }
    }

    /// Set the die seed.
    #[must_use]
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Use a custom board template.
    #[must_use]
    pub fn with_template<S: AsRef<str>>(mut self, rows: &[S]) -> Self {
        self.template = rows.iter().map(|row| row.as_ref().to_string()).collect();
        self
    }

    /// Set the distance from lane entrance to start.
    #[must_use]
    pub fn with_start_offset(mut self, offset: usize) -> Self {
        self.start_offset = offset;
        self
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self::new(MAX_PLAYERS)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_game_config_builder() {
        let config = GameConfig::new(2).with_seed(99).with_start_offset(3);

        assert_eq!(config.player_count, 2);
        assert_eq!(config.seed, 99);
        assert_eq!(config.start_offset, 3);
        assert_eq!(config.template.len(), STANDARD_TEMPLATE.len());
    }

    #[test]
    fn test_default_is_four_players() {
        let config = GameConfig::default();
        assert_eq!(config.player_count, 4);
        assert_eq!(config.start_offset, DEFAULT_START_OFFSET);
    }

    #[test]
    fn test_custom_template() {
        let config = GameConfig::new(1).with_template(&["...", ".#."]);
        assert_eq!(config.template, vec!["...".to_string(), ".#.".to_string()]);
    }

    #[test]
    #[should_panic(expected = "Must have at least 1 player")]
    fn test_game_config_zero_players() {
        GameConfig::new(0);
    }

    #[test]
    #[should_panic(expected = "At most 4 players supported")]
    fn test_game_config_too_many_players() {
        GameConfig::new(5);
    }
}
