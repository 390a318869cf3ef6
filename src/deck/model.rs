use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

use crate::error::FetchError;

pub const MALFORMED_PAYLOAD: &str = "Unexpected response shape from server";

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Slide {
    #[serde(default, deserialize_with = "lenient_text")]
    pub title: Option<String>,
    #[serde(default, deserialize_with = "lenient_bullets")]
    pub bullets: Vec<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub formula: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub narration: Option<String>,
}

// Slide fields come straight from model output. A bad field is blanked
// rather than failing the whole deck.
fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::String(text) => Some(text),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    })
}

fn lenient_bullets<'de, D>(deserializer: D) -> Result<Vec<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match Value::deserialize(deserializer)? {
        Value::Array(items) => items
            .into_iter()
            .filter_map(|item| match item {
                Value::String(text) => Some(text),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    })
}

impl Slide {
    pub fn titled(title: impl Into<String>) -> Self {
        Self {
            title: Some(title.into()),
            ..Self::default()
        }
    }

    /// Header text for the slide at `index`, falling back to `Slide N`.
    pub fn heading(&self, index: usize) -> String {
        match self.title.as_deref().map(str::trim) {
            Some(title) if !title.is_empty() => title.to_string(),
            _ => format!("Slide {}", index + 1),
        }
    }
}

/// The slides of one generated lesson, replaced wholesale on every reload.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct SlideDeck {
    #[serde(default, deserialize_with = "lenient_text")]
    pub chapter_title: Option<String>,
    pub slides: Vec<Slide>,
}

impl SlideDeck {
    pub fn new(slides: Vec<Slide>) -> Self {
        Self {
            chapter_title: None,
            slides,
        }
    }

    pub fn len(&self) -> usize {
        self.slides.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slides.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&Slide> {
        self.slides.get(index)
    }
}

/// Decode a `/generate` response body.
///
/// The body must be an object whose `slides` member is an array of slide
/// objects. Individual slide fields of the wrong type are dropped.
pub fn parse_deck(payload: Value) -> Result<SlideDeck, FetchError> {
    let is_well_shaped = payload
        .get("slides")
        .and_then(Value::as_array)
        .is_some_and(|slides| slides.iter().all(Value::is_object));
    if !payload.is_object() || !is_well_shaped {
        return Err(FetchError::Malformed(MALFORMED_PAYLOAD.into()));
    }

    serde_json::from_value(payload)
        .map_err(|err| FetchError::Malformed(format!("{MALFORMED_PAYLOAD}: {err}")))
}
