pub mod controller;
pub mod model;
pub mod state;

pub use controller::{DeckController, DeckFetch, FetchOutcome};
pub use model::{parse_deck, Slide, SlideDeck, MALFORMED_PAYLOAD};
pub use state::{DeckEffect, DeckEvent, DeckState, DeckStatus, Direction, NavigationState};
