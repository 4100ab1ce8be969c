//! Card and deck loaders
//!
//! Card databases come from normalized JSON card records; decks from
//! sectioned text files.

pub mod database;
pub mod deck;
pub mod game_init;

pub use database::CardDatabase;
pub use deck::{DeckEntry, DeckList, DeckLoader};
pub use game_init::MatchInitializer;
