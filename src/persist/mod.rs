//! Saving and loading games.
//!
//! - `document`: the versioned JSON save format and its conversion to and
//!   from a running engine
//! - `store`: a sandboxed save directory (save, load, list, info, delete)

pub mod error;
pub mod document;
pub mod store;

pub use error::PersistenceError;
pub use document::{from_document, to_document, GameStateDocument, PlayerDocument, SaveDocument, SaveInfo};
pub use store::SaveStore;
