//! Board coordinates.
//!
//! A `Coordinate` is a (column, row) cell of the board template. Columns step
//! by two along horizontal runs of the track because the template interleaves
//! blank padding cells, while rows step by one.

use serde::{Deserialize, Serialize};

/// A (column, row) cell of the board template.
///
/// Serialized as a two-element array `[x, y]`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "[i32; 2]", into = "[i32; 2]")]
pub struct Coordinate {
    pub x: i32,
    pub y: i32,
}

impl Coordinate {
    /// Create a new coordinate.
    #[must_use]
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// The coordinate displaced by `(dx, dy)`.
    #[must_use]
    pub const fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    /// The four cells that can be track-adjacent to this one.
    ///
    /// Horizontal neighbours sit two columns away; vertical neighbours one row away.
    #[must_use]
    pub fn neighbours(self) -> [Coordinate; 4] {
        NEIGHBOUR_OFFSETS.map(|(dx, dy)| self.offset(dx, dy))
    }
}

/// Offsets between adjacent playable cells of the template.
pub const NEIGHBOUR_OFFSETS: [(i32, i32); 4] = [(2, 0), (-2, 0), (0, 1), (0, -1)];

impl From<[i32; 2]> for Coordinate {
    fn from([x, y]: [i32; 2]) -> Self {
        Self { x, y }
    }
}

impl From<Coordinate> for [i32; 2] {
    fn from(coord: Coordinate) -> Self {
        [coord.x, coord.y]
    }
}

impl From<(i32, i32)> for Coordinate {
    fn from((x, y): (i32, i32)) -> Self {
        Self { x, y }
    }
}

impl std::fmt::Display for Coordinate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}
