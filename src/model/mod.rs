//! Extraction result model for slide decks.
//!
//! Extractors convert slide-part XML into these structures. Every type is
//! serializable with camelCase field names so results can be handed to
//! downstream collaborators as JSON.

mod asset;
mod deck;
mod layout;
mod slide;

pub use asset::*;
pub use deck::*;
pub use layout::*;
pub use slide::*;
