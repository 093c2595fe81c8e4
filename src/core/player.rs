//! Player identification and per-player data storage.
//!
//! ## PlayerId
//!
//! Type-safe seat identifier. Seats are numbered 1 through 4, matching the
//! digits used for player-owned cells in the board template.
//!
//! ## PlayerMap
//!
//! Per-player storage backed by `Vec` for O(1) access, indexed by `PlayerId`.

use serde::{Deserialize, Serialize};
use std::ops::{Index, IndexMut};

/// Number of seats on the board.
pub const MAX_PLAYERS: usize = 4;

/// Seat identifier, 1-based.
///
/// `PlayerId(1)` is the first seat. Whether a seat is taking part in a game
/// depends on the game's player count; see [`PlayerId::is_active`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct PlayerId(pub u8);

impl PlayerId {
    /// Create a new player ID.
    #[must_use]
    pub const fn new(id: u8) -> Self {
        Self(id)
    }

    /// Storage index (0-based) for this seat.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0.saturating_sub(1) as usize
    }

    /// Whether this is one of the board's seats (1..=4).
    #[must_use]
    pub const fn is_seat(self) -> bool {
        self.0 >= 1 && self.0 as usize <= MAX_PLAYERS
    }

    /// Whether this seat takes part in a game with `player_count` players.
    #[must_use]
    pub const fn is_active(self, player_count: usize) -> bool {
        self.0 >= 1 && (self.0 as usize) <= player_count
    }

    /// The seat that plays after this one in a game with `player_count` players.
    #[must_use]
    pub fn next(self, player_count: usize) -> Self {
        Self((self.0 as usize % player_count) as u8 + 1)
    }

    /// Iterate over the seats taking part in a game with `player_count` players.
    ///
    /// ```
    /// use aggravation::core::PlayerId;
    ///
    /// let players: Vec<_> = PlayerId::all(4).collect();
    /// assert_eq!(players.len(), 4);
    /// assert_eq!(players[0], PlayerId::new(1));
    /// assert_eq!(players[3], PlayerId::new(4));
    /// ```
    pub fn all(player_count: usize) -> impl Iterator<Item = PlayerId> {
        (1..=player_count as u8).map(PlayerId)
    }

    /// Iterate over every seat on the board, active or not.
    pub fn seats() -> impl Iterator<Item = PlayerId> {
        Self::all(MAX_PLAYERS)
    }
}

impl std::fmt::Display for PlayerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Player {}", self.0)
    }
}

/// Per-player data storage with O(1) access.
///
/// Backed by a `Vec<T>` with one entry per seat. Indexing with a seat that
/// is not present panics; use [`PlayerMap::try_get`] when the seat comes from
/// untrusted input.
///
/// ## Example
///
/// ```
/// use aggravation::core::{PlayerId, PlayerMap};
///
/// let mut captures: PlayerMap<u32> = PlayerMap::new(4, |_| 0);
/// captures[PlayerId::new(2)] += 1;
/// assert_eq!(captures[PlayerId::new(2)], 1);
/// assert_eq!(captures[PlayerId::new(1)], 0);
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PlayerMap<T> {
    data: Vec<T>,
}

impl<T> PlayerMap<T> {
    /// Create a new PlayerMap with values from a factory function.
    ///
    /// The factory receives the `PlayerId` for each seat.
    pub fn new(player_count: usize, factory: impl Fn(PlayerId) -> T) -> Self {
        assert!(player_count > 0, "Must have at least 1 player");
        assert!(
            player_count <= MAX_PLAYERS,
            "At most {MAX_PLAYERS} players supported"
        );

        let data = PlayerId::all(player_count).map(factory).collect();

        Self { data }
    }

    /// Create a new PlayerMap with all entries set to the same value.
    pub fn with_value(player_count: usize, value: T) -> Self
    where
        T: Clone,
    {
        Self::new(player_count, |_| value.clone())
    }

    /// Get the number of seats stored.
    #[must_use]
    pub fn player_count(&self) -> usize {
        self.data.len()
    }

    /// Get a reference to a player's data.
    #[must_use]
    pub fn get(&self, player: PlayerId) -> &T {
        &self.data[player.index()]
    }

    /// Get a mutable reference to a player's data.
    pub fn get_mut(&mut self, player: PlayerId) -> &mut T {
        &mut self.data[player.index()]
    }

    /// Get a player's data, or `None` for a seat outside the map.
    #[must_use]
    pub fn try_get(&self, player: PlayerId) -> Option<&T> {
        if player.0 == 0 {
            return None;
        }
        self.data.get(player.index())
    }

    /// Iterate over (PlayerId, &T) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (PlayerId, &T)> {
        self.data
            .iter()
            .enumerate()
            .map(|(i, v)| (PlayerId(i as u8 + 1), v))
    }
}

impl<T> Index<PlayerId> for PlayerMap<T> {
    type Output = T;

    fn index(&self, player: PlayerId) -> &Self::Output {
        self.get(player)
    }
}

impl<T> IndexMut<PlayerId> for PlayerMap<T> {
    fn index_mut(&mut self, player: PlayerId) -> &mut Self::Output {
        self.get_mut(player)
    }
}
