//! Plain-text rendering of a [`ShellSnapshot`].
//!
//! Deliberately dumb: everything shown here is derived from the snapshot, so
//! the deck and attention state machines can be tested without it.

use serde::Serialize;
use std::fmt::Write as _;

use crate::attention::AttentionSample;
use crate::deck::{DeckState, Slide};

pub const EMPTY_MESSAGE: &str = "No slides found. Try running ingestion or check the server.";
pub const LOADING_MESSAGE: &str = "Loading slides…";
pub const ERROR_HEADING: &str = "Failed to load slides:";

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub enum AttentionIndicator {
    Attentive,
    Distracted,
}

impl From<AttentionSample> for AttentionIndicator {
    fn from(sample: AttentionSample) -> Self {
        if sample.is_attentive() {
            AttentionIndicator::Attentive
        } else {
            AttentionIndicator::Distracted
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SlideView {
    pub index: usize,
    pub total: usize,
    pub heading: String,
    pub bullets: Vec<String>,
    pub formula: Option<String>,
    pub narration: Option<String>,
    pub can_prev: bool,
    pub can_next: bool,
}

impl SlideView {
    fn new(slide: &Slide, index: usize, total: usize) -> Self {
        Self {
            index,
            total,
            heading: slide.heading(index),
            bullets: slide.bullets.clone(),
            formula: slide.formula.clone(),
            narration: slide.narration.clone(),
            can_prev: index > 0,
            can_next: index + 1 < total,
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "kind")]
pub enum DeckView {
    Loading,
    Error { message: String },
    Empty,
    Slide(SlideView),
}

impl From<&DeckState> for DeckView {
    fn from(state: &DeckState) -> Self {
        match state {
            DeckState::Loading => DeckView::Loading,
            DeckState::Error { message } => DeckView::Error {
                message: message.clone(),
            },
            DeckState::Ready { deck, navigation } => match deck.get(navigation.current_index) {
                Some(slide) => DeckView::Slide(SlideView::new(
                    slide,
                    navigation.current_index,
                    deck.len(),
                )),
                None => DeckView::Empty,
            },
        }
    }
}

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct ShellSnapshot {
    pub lesson_id: String,
    pub chapter_title: Option<String>,
    pub deck: DeckView,
    pub attention: AttentionIndicator,
}

pub fn render(snapshot: &ShellSnapshot) -> String {
    let mut out = String::new();

    let eye = match snapshot.attention {
        AttentionIndicator::Attentive => "attentive",
        AttentionIndicator::Distracted => "distracted",
    };
    let lesson = match &snapshot.chapter_title {
        Some(title) => format!("lesson {} · {title}", snapshot.lesson_id),
        None => format!("lesson {}", snapshot.lesson_id),
    };
    let _ = writeln!(out, "[{lesson}]  attention: {eye}");

    match &snapshot.deck {
        DeckView::Loading => {
            let _ = writeln!(out, "{LOADING_MESSAGE}");
        }
        DeckView::Error { message } => {
            let _ = writeln!(out, "{ERROR_HEADING}");
            let _ = writeln!(out, "  {message}");
            let _ = writeln!(out, "Press r to retry.");
        }
        DeckView::Empty => {
            let _ = writeln!(out, "{EMPTY_MESSAGE}");
        }
        DeckView::Slide(slide) => {
            let _ = writeln!(out, "{}  ({}/{})", slide.heading, slide.index + 1, slide.total);
            for bullet in &slide.bullets {
                let _ = writeln!(out, "  • {bullet}");
            }
            if let Some(formula) = &slide.formula {
                let _ = writeln!(out, "  $$ {formula} $$");
            }
            if let Some(narration) = &slide.narration {
                let _ = writeln!(out, "  {narration}");
            }
            let prev = if slide.can_prev { "[← Prev]" } else { "        " };
            let next = if slide.can_next { "[Next →]" } else { "" };
            let _ = writeln!(out, "{prev}  {next}");
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::deck::{DeckEvent, Direction, SlideDeck};

    fn snapshot(deck: DeckView, attention: AttentionIndicator) -> ShellSnapshot {
        ShellSnapshot {
            lesson_id: "2".into(),
            chapter_title: None,
            deck,
            attention,
        }
    }

    #[test]
    fn indicator_follows_threshold() {
        assert_eq!(
            AttentionIndicator::from(AttentionSample { score: 1.0 }),
            AttentionIndicator::Attentive
        );
        assert_eq!(
            AttentionIndicator::from(AttentionSample::NEUTRAL),
            AttentionIndicator::Distracted
        );
    }

    #[test]
    fn empty_ready_deck_renders_empty_state() {
        let mut state = DeckState::new();
        state.reduce(DeckEvent::Loaded(SlideDeck::default()));
        let view = DeckView::from(&state);
        assert_eq!(view, DeckView::Empty);

        let text = render(&snapshot(view, AttentionIndicator::Distracted));
        assert!(text.contains(EMPTY_MESSAGE));
    }

    #[test]
    fn slide_view_tracks_bounds() {
        let mut state = DeckState::new();
        state.reduce(DeckEvent::Loaded(SlideDeck::new(vec![
            Slide::titled("Intro"),
            Slide::default(),
        ])));

        let DeckView::Slide(first) = DeckView::from(&state) else {
            panic!("expected a slide");
        };
        assert!(!first.can_prev && first.can_next);

        state.reduce(DeckEvent::Navigate(Direction::Next));
        let DeckView::Slide(second) = DeckView::from(&state) else {
            panic!("expected a slide");
        };
        assert_eq!(second.heading, "Slide 2");
        assert!(second.can_prev && !second.can_next);
    }

    #[test]
    fn renders_slide_content_and_pager() {
        let slide = Slide {
            title: Some("Roots".into()),
            bullets: vec!["a zero of p".into()],
            formula: Some("p(x)=0".into()),
            narration: Some("Let us find roots.".into()),
        };
        let view = DeckView::Slide(SlideView::new(&slide, 1, 2));
        let text = render(&snapshot(view, AttentionIndicator::Attentive));

        assert!(text.contains("attention: attentive"));
        assert!(text.contains("Roots  (2/2)"));
        assert!(text.contains("• a zero of p"));
        assert!(text.contains("p(x)=0"));
        assert!(text.contains("Let us find roots."));
        assert!(text.contains("[← Prev]"));
        assert!(!text.contains("[Next →]"));
    }

    #[test]
    fn error_view_offers_retry() {
        let view = DeckView::Error {
            message: "request failed: connection refused".into(),
        };
        let text = render(&snapshot(view, AttentionIndicator::Distracted));
        assert!(text.contains(ERROR_HEADING));
        assert!(text.contains("connection refused"));
        assert!(text.contains("retry"));
    }
}
