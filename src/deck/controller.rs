use std::sync::Arc;

use crate::api::LessonApi;
use crate::error::FetchError;

use super::model::SlideDeck;
use super::state::{DeckEffect, DeckEvent, DeckState, DeckStatus, Direction};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// One outstanding request for the lesson's slides.
///
/// Produced whenever the deck enters `Loading`; the caller decides where to
/// await it (inline in [`DeckController::load`], or on a spawned task whose
/// result is fed back through [`DeckController::complete_load`]).
pub struct DeckFetch {
    api: Arc<dyn LessonApi>,
    lesson_id: String,
    attempt: u64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchOutcome {
    pub attempt: u64,
    pub result: Result<SlideDeck, FetchError>,
}

impl DeckFetch {
    pub fn attempt(&self) -> u64 {
        self.attempt
    }

    pub async fn run(self) -> FetchOutcome {
        let result = self.api.fetch_deck(&self.lesson_id).await;
        FetchOutcome {
            attempt: self.attempt,
            result,
        }
    }
}

pub struct DeckController {
    api: Arc<dyn LessonApi>,
    lesson_id: String,
    state: DeckState,
    attempts: u64,
    torn_down: bool,
}

impl DeckController {
    pub fn new(api: Arc<dyn LessonApi>, lesson_id: impl Into<String>) -> Self {
        Self {
            api,
            lesson_id: lesson_id.into(),
            state: DeckState::new(),
            attempts: 0,
            torn_down: false,
        }
    }

    pub fn state(&self) -> &DeckState {
        &self.state
    }

    pub fn status(&self) -> DeckStatus {
        self.state.status()
    }

    pub fn lesson_id(&self) -> &str {
        &self.lesson_id
    }

    /// Enter `Loading` and hand back the request to run.
    pub fn begin_load(&mut self) -> Option<DeckFetch> {
        self.dispatch(DeckEvent::LoadRequested)
    }

    /// Same as [`begin_load`](Self::begin_load), but only from `Error`.
    pub fn begin_retry(&mut self) -> Option<DeckFetch> {
        if !self.state.is_error() {
            log_debug!("retry ignored while deck is {:?}", self.state.status());
            return None;
        }
        self.dispatch(DeckEvent::RetryRequested)
    }

    /// Apply a finished fetch. Returns `false` when the result was dropped
    /// because the controller has been torn down.
    pub fn complete_load(&mut self, outcome: FetchOutcome) -> bool {
        if self.torn_down {
            log_debug!("dropping fetch #{} that resolved after teardown", outcome.attempt);
            return false;
        }

        match outcome.result {
            Ok(deck) => {
                log_info!(
                    "lesson {} loaded with {} slides (fetch #{})",
                    self.lesson_id,
                    deck.len(),
                    outcome.attempt
                );
                self.state.reduce(DeckEvent::Loaded(deck));
            }
            Err(err) => {
                log_warn!("lesson {} failed to load: {err}", self.lesson_id);
                self.state.reduce(DeckEvent::LoadFailed(err.to_string()));
            }
        }
        true
    }

    pub async fn load(&mut self) -> DeckStatus {
        if let Some(fetch) = self.begin_load() {
            let outcome = fetch.run().await;
            self.complete_load(outcome);
        }
        self.status()
    }

    /// Returns whether the retry was accepted (the deck was in `Error`).
    pub async fn retry(&mut self) -> bool {
        match self.begin_retry() {
            Some(fetch) => {
                let outcome = fetch.run().await;
                self.complete_load(outcome);
                true
            }
            None => false,
        }
    }

    pub fn navigate(&mut self, direction: Direction) {
        self.state.reduce(DeckEvent::Navigate(direction));
    }

    pub fn teardown(&mut self) {
        self.torn_down = true;
    }

    pub fn is_torn_down(&self) -> bool {
        self.torn_down
    }

    fn dispatch(&mut self, event: DeckEvent) -> Option<DeckFetch> {
        if self.torn_down {
            return None;
        }

        let effects = self.state.reduce(event);
        if !effects.contains(&DeckEffect::Fetch) {
            return None;
        }

        self.attempts += 1;
        Some(DeckFetch {
            api: Arc::clone(&self.api),
            lesson_id: self.lesson_id.clone(),
            attempt: self.attempts,
        })
    }
}
