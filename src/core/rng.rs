//! The die.
//!
//! Every roll comes from a seeded ChaCha8 stream, so a game replays exactly
//! from its seed. The stream position can be captured as a `GameRngState`
//! and resumed later without replaying the rolls.
//!
//! ```
//! use aggravation::core::GameRng;
//!
//! let mut a = GameRng::new(42);
//! let mut b = GameRng::new(42);
//! for _ in 0..20 {
//!     let roll = a.roll_die();
//!     assert!((1..=6).contains(&roll));
//!     assert_eq!(roll, b.roll_die());
//! }
//! ```

use std::hash::{Hash, Hasher};

use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use rand_chacha::ChaCha8Rng;
use serde::{Deserialize, Serialize};

/// Faces on the game's single die.
pub const DIE_FACES: u8 = 6;

/// Golden-ratio increment separating successive derived seeds.
const SEED_STRIDE: u64 = 0x9E37_79B9_7F4A_7C15;

/// Seeded source of die rolls and simulated choices.
#[derive(Clone, Debug)]
pub struct GameRng {
    inner: ChaCha8Rng,
    seed: u64,
    derived: u64,
}

impl GameRng {
    #[must_use]
    pub fn new(seed: u64) -> Self {
        Self {
            inner: ChaCha8Rng::seed_from_u64(seed),
            seed,
            derived: 0,
        }
    }

    /// Seeded from the operating system.
    #[must_use]
    pub fn from_entropy() -> Self {
        Self::new(rand::thread_rng().gen())
    }

    #[must_use]
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// A uniform roll in 1..=6.
    pub fn roll_die(&mut self) -> u8 {
        self.inner.gen_range(1..=DIE_FACES)
    }

    /// Derive the next child RNG, e.g. one per simulated game.
    ///
    /// Children depend only on the parent seed and how many came before.
    #[must_use]
    pub fn fork(&mut self) -> Self {
        self.derived += 1;
        Self::new(self.seed.wrapping_add(self.derived.wrapping_mul(SEED_STRIDE)))
    }

    /// A stream named `context`, independent of the die stream.
    #[must_use]
    pub fn for_context(&self, context: &str) -> Self {
        let mut hasher = std::collections::hash_map::DefaultHasher::new();
        self.seed.hash(&mut hasher);
        context.hash(&mut hasher);
        Self::new(hasher.finish())
    }

    /// Pick one option uniformly. `None` for an empty slice.
    pub fn choose<'a, T>(&mut self, options: &'a [T]) -> Option<&'a T> {
        options.choose(&mut self.inner)
    }

    /// Capture the stream position.
    #[must_use]
    pub fn state(&self) -> GameRngState {
        GameRngState {
            seed: self.seed,
            word_pos: self.inner.get_word_pos(),
            derived: self.derived,
        }
    }

    /// Resume a captured stream.
    #[must_use]
    pub fn from_state(state: &GameRngState) -> Self {
        let mut inner = ChaCha8Rng::seed_from_u64(state.seed);
        inner.set_word_pos(state.word_pos);
        Self {
            inner,
            seed: state.seed,
            derived: state.derived,
        }
    }
}

/// Position of a `GameRng` stream.
///
/// ChaCha8's word counter makes capture and resume constant-time however
/// many rolls were made.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameRngState {
    pub seed: u64,
    pub word_pos: u128,
    /// Children already derived with `fork`.
    pub derived: u64,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rolls(rng: &mut GameRng, n: usize) -> Vec<u8> {
        (0..n).map(|_| rng.roll_die()).collect()
    }

    #[test]
    fn test_same_seed_same_rolls() {
        assert_eq!(rolls(&mut GameRng::new(42), 100), rolls(&mut GameRng::new(42), 100));
    }

    #[test]
    fn test_every_face_appears() {
        let mut rng = GameRng::new(7);
        let mut seen = [false; DIE_FACES as usize];

        for roll in rolls(&mut rng, 600) {
            assert!((1..=DIE_FACES).contains(&roll));
            seen[(roll - 1) as usize] = true;
        }
        assert!(seen.iter().all(|&s| s));
    }

    #[test]
    fn test_forked_seeds() {
        let mut parent = GameRng::new(42);
        let mut first = parent.fork();
        let second = parent.fork();

        assert_ne!(first.seed(), second.seed());
        assert_ne!(rolls(&mut parent, 20), rolls(&mut first, 20));

        let mut replay = GameRng::new(42);
        assert_eq!(replay.fork().seed(), first.seed());
        assert_eq!(replay.fork().seed(), second.seed());
    }

    #[test]
    fn test_context_streams() {
        let rng = GameRng::new(42);
        let mut a = rng.for_context("simulation");
        let mut b = rng.for_context("simulation");
        let mut other = rng.for_context("dice");

        let seq = rolls(&mut a, 20);
        assert_eq!(seq, rolls(&mut b, 20));
        assert_ne!(seq, rolls(&mut other, 20));
    }

    #[test]
    fn test_choose() {
        let mut rng = GameRng::new(3);
        let options = ['a', 'b', 'c'];

        for _ in 0..20 {
            assert!(options.contains(rng.choose(&options).unwrap()));
        }
        assert_eq!(rng.choose::<char>(&[]), None);
    }

    #[test]
    fn test_resume_continues_rolls() {
        let mut rng = GameRng::new(42);
        rolls(&mut rng, 50);

        let state = rng.state();
        let expected = rolls(&mut rng, 10);
        assert_eq!(rolls(&mut GameRng::from_state(&state), 10), expected);

        let json = serde_json::to_string(&state).unwrap();
        assert_eq!(serde_json::from_str::<GameRngState>(&json).unwrap(), state);
    }
}
