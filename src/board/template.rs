//! Textual board template and cell classification.

use crate::core::{Coordinate, PlayerId, MAX_PLAYERS};

use super::BoardError;

/// The standard four-player board.
///
/// `#` cells form the shared track (plus the isolated centre hole), digits mark
/// each seat's pen and final-home lane.
pub const STANDARD_TEMPLATE: [&str; 17] = [
    "...............................",
    "...........#.#.#.#.#...........",
    "...1.......#...1...#.......2...",
    ".....1.....#...1...#.....2.....",
    ".......1...#...1...#...2.......",
    ".........1.#...1...#.2.........",
    ".#.#.#.#.#.#.......#.#.#.#.#.#.",
    ".#...........................#.",
    ".#.4.4.4.4.....#.....2.2.2.2.#.",
    ".#...........................#.",
    ".#.#.#.#.#.#.......#.#.#.#.#.#.",
    ".........4.#...3...#.3.........",
    ".......4...#...3...#...3.......",
    ".....4.....#...3...#.....3.....",
    "...4.......#...3...#.......3...",
    "...........#.#.#.#.#...........",
    "...............................",
];

/// Classification of a single template cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    /// Padding; not part of the board.
    Blank,
    /// A shared spot.
    Spot,
    /// A pen or final-home cell owned by a seat.
    Owned(PlayerId),
}

impl Cell {
    fn parse(ch: char) -> Option<Self> {
        match ch {
            '.' => Some(Cell::Blank),
            '#' => Some(Cell::Spot),
            '1'..='9' => {
                let seat = ch as u8 - b'0';
                (seat as usize <= MAX_PLAYERS).then_some(Cell::Owned(PlayerId::new(seat)))
            }
            _ => None,
        }
    }
}

/// A parsed, rectangular board template.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BoardTemplate {
    rows: Vec<Vec<Cell>>,
    width: usize,
}

impl BoardTemplate {
    /// Parse template rows. Every row must have the same width.
    pub fn parse<S: AsRef<str>>(rows: &[S]) -> Result<Self, BoardError> {
        let width = rows
            .first()
            .map(|row| row.as_ref().chars().count())
            .ok_or(BoardError::EmptyTemplate)?;

        let mut parsed = Vec::with_capacity(rows.len());
        for (y, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            let found = row.chars().count();
            if found != width {
                return Err(BoardError::RaggedRow {
                    row: y,
                    expected: width,
                    found,
                });
            }

            let cells = row
                .chars()
                .enumerate()
                .map(|(x, ch)| {
                    Cell::parse(ch).ok_or(BoardError::UnknownCell {
                        ch,
                        at: Coordinate::new(x as i32, y as i32),
                    })
                })
                .collect::<Result<Vec<_>, _>>()?;
            parsed.push(cells);
        }

        Ok(Self {
            rows: parsed,
            width,
        })
    }

    /// Template width in cells.
    #[must_use]
    pub fn width(&self) -> usize {
        self.width
    }

    /// Template height in cells.
    #[must_use]
    pub fn height(&self) -> usize {
        self.rows.len()
    }

    /// The cell at `coord`; anything outside the template is `Blank`.
    #[must_use]
    pub fn cell(&self, coord: Coordinate) -> Cell {
        if coord.x < 0 || coord.y < 0 {
            return Cell::Blank;
        }
        self.rows
            .get(coord.y as usize)
            .and_then(|row| row.get(coord.x as usize))
            .copied()
            .unwrap_or(Cell::Blank)
    }

    /// All cells in reading order (row by row, left to right).
    pub fn cells(&self) -> impl Iterator<Item = (Coordinate, Cell)> + '_ {
        self.rows.iter().enumerate().flat_map(|(y, row)| {
            row.iter()
                .enumerate()
                .map(move |(x, &cell)| (Coordinate::new(x as i32, y as i32), cell))
        })
    }
}
