use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::watch;

/// Scores above this render as "attentive".
pub const ATTENTIVE_THRESHOLD: f32 = 0.5;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct AttentionSample {
    pub score: f32,
}

impl AttentionSample {
    /// Value held before the first inference result arrives ("no face yet").
    pub const NEUTRAL: Self = Self { score: 0.0 };

    pub fn is_attentive(&self) -> bool {
        self.score > ATTENTIVE_THRESHOLD
    }
}

impl Default for AttentionSample {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

/// Binary presence: any detected face counts as present, more faces do not
/// count for more.
pub fn presence_score(face_count: usize) -> f32 {
    if face_count >= 1 {
        1.0
    } else {
        0.0
    }
}

/// The single latest-value slot shared by the inference engine (writer) and
/// the telemetry reporter and shell (readers). No history is kept.
#[derive(Debug, Clone)]
pub struct AttentionCell {
    tx: Arc<watch::Sender<AttentionSample>>,
}

impl Default for AttentionCell {
    fn default() -> Self {
        Self::new()
    }
}

impl AttentionCell {
    pub fn new() -> Self {
        let (tx, _rx) = watch::channel(AttentionSample::NEUTRAL);
        Self { tx: Arc::new(tx) }
    }

    /// Overwrite the current sample. Subscribers are only woken when the
    /// score actually changes.
    pub fn publish(&self, score: f32) {
        let score = score.clamp(0.0, 1.0);
        self.tx.send_if_modified(|current| {
            if current.score == score {
                false
            } else {
                current.score = score;
                true
            }
        });
    }

    pub fn latest(&self) -> AttentionSample {
        *self.tx.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<AttentionSample> {
        self.tx.subscribe()
    }
}
