use serde::{Deserialize, Serialize};

use super::model::{Slide, SlideDeck};

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum Direction {
    Next,
    Prev,
}

#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct NavigationState {
    pub current_index: usize,
}

impl NavigationState {
    /// Move one slide in `direction`, clamped to `[0, len - 1]` (0 when empty).
    pub fn step(self, direction: Direction, len: usize) -> Self {
        let last = len.saturating_sub(1);
        let current_index = match direction {
            Direction::Next => self.current_index.saturating_add(1).min(last),
            Direction::Prev => self.current_index.saturating_sub(1).min(last),
        };
        Self { current_index }
    }
}

/// Coarse status used by the renderer; `Empty` is a `Ready` deck without slides.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum DeckStatus {
    Loading,
    Ready,
    Empty,
    Error,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum DeckState {
    #[default]
    Loading,
    Ready {
        deck: SlideDeck,
        navigation: NavigationState,
    },
    Error {
        message: String,
    },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeckEvent {
    LoadRequested,
    RetryRequested,
    Loaded(SlideDeck),
    LoadFailed(String),
    Navigate(Direction),
}

/// Work the caller has to perform after a transition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeckEffect {
    Fetch,
}

impl DeckState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn reduce(&mut self, event: DeckEvent) -> Vec<DeckEffect> {
        let mut effects = Vec::new();

        match event {
            DeckEvent::LoadRequested => {
                *self = DeckState::Loading;
                effects.push(DeckEffect::Fetch);
            }
            DeckEvent::RetryRequested => {
                if self.is_error() {
                    *self = DeckState::Loading;
                    effects.push(DeckEffect::Fetch);
                }
            }
            // Whichever response lands last replaces the deck, even if it
            // belongs to an older request.
            DeckEvent::Loaded(deck) => {
                *self = DeckState::Ready {
                    deck,
                    navigation: NavigationState::default(),
                };
            }
            DeckEvent::LoadFailed(message) => {
                *self = DeckState::Error { message };
            }
            DeckEvent::Navigate(direction) => {
                if let DeckState::Ready { deck, navigation } = self {
                    *navigation = navigation.step(direction, deck.len());
                }
            }
        }

        effects
    }

    pub fn status(&self) -> DeckStatus {
        match self {
            DeckState::Loading => DeckStatus::Loading,
            DeckState::Ready { deck, .. } if deck.is_empty() => DeckStatus::Empty,
            DeckState::Ready { .. } => DeckStatus::Ready,
            DeckState::Error { .. } => DeckStatus::Error,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, DeckState::Error { .. })
    }

    pub fn deck(&self) -> Option<&SlideDeck> {
        match self {
            DeckState::Ready { deck, .. } => Some(deck),
            _ => None,
        }
    }

    pub fn current_index(&self) -> Option<usize> {
        match self {
            DeckState::Ready { navigation, .. } => Some(navigation.current_index),
            _ => None,
        }
    }

    pub fn current_slide(&self) -> Option<&Slide> {
        match self {
            DeckState::Ready { deck, navigation } => deck.get(navigation.current_index),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            DeckState::Error { message } => Some(message),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ready(titles: &[&str]) -> DeckState {
        let mut state = DeckState::new();
        state.reduce(DeckEvent::Loaded(SlideDeck::new(
            titles.iter().map(|t| Slide::titled(*t)).collect(),
        )));
        state
    }

    #[test]
    fn starts_loading() {
        assert_eq!(DeckState::new().status(), DeckStatus::Loading);
    }

    #[test]
    fn load_success_resets_index() {
        let mut state = ready(&["A", "B", "C"]);
        state.reduce(DeckEvent::Navigate(Direction::Next));
        assert_eq!(state.current_index(), Some(1));

        let effects = state.reduce(DeckEvent::LoadRequested);
        assert_eq!(effects, vec![DeckEffect::Fetch]);
        assert_eq!(state.status(), DeckStatus::Loading);

        let deck = SlideDeck::new(vec![Slide::titled("A"), Slide::titled("B"), Slide::titled("C")]);
        state.reduce(DeckEvent::Loaded(deck.clone()));
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.deck(), Some(&deck));
    }

    #[test]
    fn retry_only_fetches_from_error() {
        let mut state = ready(&["A"]);
        assert!(state.reduce(DeckEvent::RetryRequested).is_empty());
        assert_eq!(state.status(), DeckStatus::Ready);

        state.reduce(DeckEvent::LoadFailed("boom".into()));
        assert_eq!(state.error_message(), Some("boom"));
        assert_eq!(state.reduce(DeckEvent::RetryRequested), vec![DeckEffect::Fetch]);
        assert_eq!(state.status(), DeckStatus::Loading);
    }

    #[test]
    fn navigation_is_ignored_outside_ready() {
        let mut state = DeckState::new();
        state.reduce(DeckEvent::Navigate(Direction::Next));
        assert_eq!(state, DeckState::Loading);

        state.reduce(DeckEvent::LoadFailed("down".into()));
        state.reduce(DeckEvent::Navigate(Direction::Prev));
        assert!(state.is_error());
    }

    #[test]
    fn empty_deck_is_distinguishable_and_stays_at_zero() {
        let mut state = ready(&[]);
        assert_eq!(state.status(), DeckStatus::Empty);
        state.reduce(DeckEvent::Navigate(Direction::Next));
        state.reduce(DeckEvent::Navigate(Direction::Prev));
        assert_eq!(state.current_index(), Some(0));
        assert_eq!(state.current_slide(), None);
    }

    #[test]
    fn intro_roots_walkthrough() {
        let mut state = ready(&["Intro", "Roots"]);
        assert_eq!(state.current_slide().unwrap().heading(0), "Intro");

        state.reduce(DeckEvent::Navigate(Direction::Next));
        assert_eq!(state.current_index(), Some(1));
        assert_eq!(state.current_slide().unwrap().heading(1), "Roots");

        state.reduce(DeckEvent::Navigate(Direction::Next));
        assert_eq!(state.current_index(), Some(1));

        state.reduce(DeckEvent::Navigate(Direction::Prev));
        state.reduce(DeckEvent::Navigate(Direction::Prev));
        assert_eq!(state.current_index(), Some(0));
    }

    fn direction() -> impl Strategy<Value = Direction> {
        prop_oneof![Just(Direction::Next), Just(Direction::Prev)]
    }

    proptest! {
        #[test]
        fn index_stays_in_bounds(
            len in 0usize..12,
            moves in prop::collection::vec(direction(), 0..64),
        ) {
            let titles: Vec<String> = (0..len).map(|i| format!("s{i}")).collect();
            let refs: Vec<&str> = titles.iter().map(String::as_str).collect();
            let mut state = ready(&refs);

            for direction in moves {
                state.reduce(DeckEvent::Navigate(direction));
                let index = state.current_index().unwrap();
                if len > 0 {
                    prop_assert!(index < len);
                    prop_assert!(state.current_slide().is_some());
                } else {
                    prop_assert_eq!(index, 0);
                }
            }
        }
    }
}
