//! Backend contract for lesson generation and attention logging.

mod http;

pub use http::HttpLessonApi;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::deck::SlideDeck;
use crate::error::{FetchError, TelemetrySendError};

/// Body of `POST /lessons/attention-log`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct AttentionReport {
    pub lesson_id: String,
    pub attention_score: f32,
}

#[async_trait]
pub trait LessonApi: Send + Sync {
    /// `GET /lessons/{lesson_id}/generate`.
    async fn fetch_deck(&self, lesson_id: &str) -> Result<SlideDeck, FetchError>;

    /// `POST /lessons/attention-log`. The response body is ignored.
    async fn post_attention(&self, report: &AttentionReport) -> Result<(), TelemetrySendError>;
}
