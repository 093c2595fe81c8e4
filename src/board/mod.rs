//! Board topology derived from a textual template.
//!
//! The template marks track spots with `#` and player-owned cells with the
//! owning seat's digit. `BoardTopology` reads it once and produces lookup
//! tables: the clockwise ring successor of every track cell, each player's
//! lane entrance, final-home lane, pen slots, and start coordinate.
//! Nothing downstream compares against literal coordinates.

pub mod error;
pub mod template;
pub mod topology;

pub use error::BoardError;
pub use template::{BoardTemplate, Cell, STANDARD_TEMPLATE};
pub use topology::BoardTopology;
