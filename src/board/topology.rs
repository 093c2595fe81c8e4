//! Static board graph.
//!
//! ## Construction
//!
//! 1. Every `#` cell with exactly two `#` neighbours is a track cell. A `#`
//!    with no neighbours (the centre hole) is ignored.
//! 2. The track is traced once as a single loop and oriented clockwise on
//!    screen (positive shoelace area with y growing downward).
//! 3. For each seat, the final-home lane is the straight run of four owned
//!    cells leading away from a track cell; that track cell is the lane
//!    entrance. The seat's remaining owned cells are its pen.
//! 4. The start is the lane entrance advanced `start_offset` ring steps.
//!
//! The result is a set of lookup tables keyed by coordinate.

use rustc_hash::{FxHashMap, FxHashSet};
use smallvec::SmallVec;

use crate::core::coord::NEIGHBOUR_OFFSETS;
use crate::core::marble::MARBLES_PER_PLAYER;
use crate::core::{Coordinate, GameConfig, PlayerId, PlayerMap, DEFAULT_START_OFFSET, MAX_PLAYERS};

use super::template::{BoardTemplate, Cell, STANDARD_TEMPLATE};
use super::BoardError;

/// Cells in one player's final-home lane.
pub const LANE_LENGTH: usize = MARBLES_PER_PLAYER;

/// Slots in one player's pen.
pub const PEN_SIZE: usize = MARBLES_PER_PLAYER;

/// Board graph built once from a template.
#[derive(Clone, Debug)]
pub struct BoardTopology {
    template: BoardTemplate,
    /// Track cells in clockwise order.
    ring: Vec<Coordinate>,
    /// Track cell -> clockwise successor.
    successors: FxHashMap<Coordinate, Coordinate>,
    /// Track cell -> position in `ring`.
    ring_index: FxHashMap<Coordinate, usize>,
    entrances: PlayerMap<Coordinate>,
    starts: PlayerMap<Coordinate>,
    /// Final-home slots ordered from the entrance inward.
    lanes: PlayerMap<[Coordinate; LANE_LENGTH]>,
    /// Pen slots in template reading order.
    pens: PlayerMap<[Coordinate; PEN_SIZE]>,
}

impl BoardTopology {
    /// Topology of the standard board.
    pub fn standard() -> Result<Self, BoardError> {
        Self::from_template(BoardTemplate::parse(&STANDARD_TEMPLATE)?, DEFAULT_START_OFFSET)
    }

    /// Topology described by a game configuration.
    pub fn from_config(config: &GameConfig) -> Result<Self, BoardError> {
        Self::from_template(BoardTemplate::parse(&config.template)?, config.start_offset)
    }

    /// Build the topology from a parsed template.
    pub fn from_template(template: BoardTemplate, start_offset: usize) -> Result<Self, BoardError> {
        let spots: FxHashSet<Coordinate> = template
            .cells()
            .filter(|(_, cell)| *cell == Cell::Spot)
            .map(|(coord, _)| coord)
            .collect();

        let mut track = Vec::new();
        let mut links: FxHashMap<Coordinate, SmallVec<[Coordinate; 2]>> = FxHashMap::default();
        for (coord, cell) in template.cells() {
            if cell != Cell::Spot {
                continue;
            }
            let adjacent: SmallVec<[Coordinate; 2]> = coord
                .neighbours()
                .into_iter()
                .filter(|n| spots.contains(n))
                .collect();
            match adjacent.len() {
                0 => continue,
                2 => {
                    track.push(coord);
                    links.insert(coord, adjacent);
                }
                n => {
                    return Err(BoardError::Malformed(format!(
                        "track cell {coord} has {n} neighbours"
                    )))
                }
            }
        }

        let mut ring = trace_ring(&track, &links)?;
        if signed_area(&ring) < 0 {
            ring[1..].reverse();
        }

        let ring_index: FxHashMap<Coordinate, usize> =
            ring.iter().enumerate().map(|(i, &c)| (c, i)).collect();
        let successors: FxHashMap<Coordinate, Coordinate> = ring
            .iter()
            .enumerate()
            .map(|(i, &c)| (c, ring[(i + 1) % ring.len()]))
            .collect();

        let mut entrances = Vec::with_capacity(MAX_PLAYERS);
        let mut lanes = Vec::with_capacity(MAX_PLAYERS);
        let mut pens = Vec::with_capacity(MAX_PLAYERS);
        for seat in PlayerId::seats() {
            let (entrance, lane) = find_lane(&template, &ring, seat)?;
            let pen: Vec<Coordinate> = template
                .cells()
                .filter(|(coord, cell)| *cell == Cell::Owned(seat) && !lane.contains(coord))
                .map(|(coord, _)| coord)
                .collect();
            let pen: [Coordinate; PEN_SIZE] = pen.try_into().map_err(|cells: Vec<_>| {
                BoardError::Malformed(format!("{seat} has {} pen cells", cells.len()))
            })?;

            entrances.push(entrance);
            lanes.push(lane);
            pens.push(pen);
        }

        let starts: Vec<Coordinate> = entrances
            .iter()
            .map(|entrance| ring[(ring_index[entrance] + start_offset % ring.len()) % ring.len()])
            .collect();

        Ok(Self {
            template,
            ring,
            successors,
            ring_index,
            entrances: PlayerMap::new(MAX_PLAYERS, |p| entrances[p.index()]),
            starts: PlayerMap::new(MAX_PLAYERS, |p| starts[p.index()]),
            lanes: PlayerMap::new(MAX_PLAYERS, |p| lanes[p.index()]),
            pens: PlayerMap::new(MAX_PLAYERS, |p| pens[p.index()]),
        })
    }

    // === Ring ===

    /// Clockwise successor of a track cell.
    pub fn next(&self, coord: Coordinate) -> Result<Coordinate, BoardError> {
        self.successors
            .get(&coord)
            .copied()
            .ok_or(BoardError::OutOfBounds(coord))
    }

    /// The track cell `steps` clockwise from `coord`.
    pub fn advance(&self, coord: Coordinate, steps: usize) -> Result<Coordinate, BoardError> {
        let index = self.ring_position(coord).ok_or(BoardError::OutOfBounds(coord))?;
        let len = self.ring.len();
        Ok(self.ring[(index + steps % len) % len])
    }

    /// Successor along `player`'s path home.
    ///
    /// Track cells step clockwise, except the player's own lane entrance which
    /// steps into lane slot 0. Lane slots step inward; the deepest slot has no
    /// successor and yields `Overshoot`.
    ///
    /// Panics if `player` is not a seat.
    pub fn next_on_home_lane(&self, player: PlayerId, coord: Coordinate) -> Result<Coordinate, BoardError> {
        if let Some(slot) = self.lane_index(player, coord) {
            return self.lanes[player]
                .get(slot as usize + 1)
                .copied()
                .ok_or(BoardError::Overshoot { player, at: coord });
        }
        if coord == self.entrances[player] {
            return Ok(self.lanes[player][0]);
        }
        self.next(coord)
    }

    /// Track cells in clockwise order.
    #[must_use]
    pub fn ring(&self) -> &[Coordinate] {
        &self.ring
    }

    /// Number of track cells.
    #[must_use]
    pub fn ring_len(&self) -> usize {
        self.ring.len()
    }

    /// Index of a track cell in clockwise order.
    #[must_use]
    pub fn ring_position(&self, coord: Coordinate) -> Option<usize> {
        self.ring_index.get(&coord).copied()
    }

    /// Whether `coord` is on the shared track.
    #[must_use]
    pub fn is_track(&self, coord: Coordinate) -> bool {
        self.successors.contains_key(&coord)
    }

    // === Per-player cells ===

    /// Track cell where `player`'s marbles leave the pen.
    #[must_use]
    pub fn start(&self, player: PlayerId) -> Coordinate {
        self.starts[player]
    }

    #[must_use]
    pub fn is_start(&self, player: PlayerId, coord: Coordinate) -> bool {
        self.starts[player] == coord
    }

    /// Track cell from which `player` turns into the final-home lane.
    #[must_use]
    pub fn lane_entrance(&self, player: PlayerId) -> Coordinate {
        self.entrances[player]
    }

    /// `player`'s final-home slots, entrance side first.
    #[must_use]
    pub fn lane(&self, player: PlayerId) -> &[Coordinate; LANE_LENGTH] {
        &self.lanes[player]
    }

    #[must_use]
    pub fn lane_slot(&self, player: PlayerId, slot: u8) -> Option<Coordinate> {
        self.lanes[player].get(slot as usize).copied()
    }

    #[must_use]
    pub fn lane_index(&self, player: PlayerId, coord: Coordinate) -> Option<u8> {
        self.lanes[player].iter().position(|&c| c == coord).map(|i| i as u8)
    }

    /// Whether `coord` is one of `player`'s final-home slots, the only cells
    /// where that player's marbles cannot be captured.
    #[must_use]
    pub fn is_final_home(&self, player: PlayerId, coord: Coordinate) -> bool {
        self.lanes[player].contains(&coord)
    }

    #[must_use]
    pub fn pen(&self, player: PlayerId) -> &[Coordinate; PEN_SIZE] {
        &self.pens[player]
    }

    #[must_use]
    pub fn pen_slot(&self, player: PlayerId, slot: u8) -> Option<Coordinate> {
        self.pens[player].get(slot as usize).copied()
    }

    #[must_use]
    pub fn pen_index(&self, player: PlayerId, coord: Coordinate) -> Option<u8> {
        self.pens[player].iter().position(|&c| c == coord).map(|i| i as u8)
    }

    #[must_use]
    pub fn template(&self) -> &BoardTemplate {
        &self.template
    }
}

/// Walk the track loop starting from the first cell in reading order.
fn trace_ring(
    track: &[Coordinate],
    links: &FxHashMap<Coordinate, SmallVec<[Coordinate; 2]>>,
) -> Result<Vec<Coordinate>, BoardError> {
    let first = *track
        .first()
        .ok_or_else(|| BoardError::Malformed("no track cells".into()))?;
    let neighbours_of = |coord: &Coordinate| {
        links
            .get(coord)
            .ok_or_else(|| BoardError::Malformed(format!("{coord} leaves the track")))
    };

    let mut ring = vec![first];
    let mut previous = first;
    let mut current = neighbours_of(&first)?[0];
    while current != first {
        if ring.len() >= track.len() {
            return Err(BoardError::Malformed("track does not close".into()));
        }
        ring.push(current);
        let adjacent = neighbours_of(&current)?;
        let next = if adjacent[0] == previous { adjacent[1] } else { adjacent[0] };
        previous = current;
        current = next;
    }

    if ring.len() != track.len() {
        return Err(BoardError::Malformed(format!(
            "track splits into several loops ({} of {} cells reachable)",
            ring.len(),
            track.len()
        )));
    }
    Ok(ring)
}

/// Twice the signed polygon area; positive when the loop runs clockwise on screen.
fn signed_area(ring: &[Coordinate]) -> i64 {
    ring.iter()
        .zip(ring.iter().cycle().skip(1))
        .map(|(a, b)| a.x as i64 * b.y as i64 - b.x as i64 * a.y as i64)
        .sum()
}

/// Locate the straight run of `seat`-owned cells leading off the track.
fn find_lane(
    template: &BoardTemplate,
    ring: &[Coordinate],
    seat: PlayerId,
) -> Result<(Coordinate, [Coordinate; LANE_LENGTH]), BoardError> {
    let mut found = None;
    for &entrance in ring {
        for (dx, dy) in NEIGHBOUR_OFFSETS {
            let lane: [Coordinate; LANE_LENGTH] = std::array::from_fn(|k| {
                let step = k as i32 + 1;
                entrance.offset(dx * step, dy * step)
            });
            if lane.iter().all(|&c| template.cell(c) == Cell::Owned(seat)) {
                if found.is_some() {
                    return Err(BoardError::Malformed(format!("{seat} has more than one lane")));
                }
                found = Some((entrance, lane));
            }
        }
    }
    found.ok_or_else(|| BoardError::Malformed(format!("{seat} has no lane")))
}
