use std::sync::Arc;
use tokio::sync::watch;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::api::{AttentionReport, LessonApi};
use crate::attention::AttentionSample;
use crate::error::TelemetrySendError;

use super::config::TelemetryConfig;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Report the current sample on tick 0 and then every `config.interval`.
/// Each report is sent on its own task; failed reports are not retried.
pub async fn reporter_loop(
    api: Arc<dyn LessonApi>,
    config: TelemetryConfig,
    mut samples: watch::Receiver<AttentionSample>,
    cancel_token: CancellationToken,
) {
    // The first tick of a tokio interval completes immediately: that is tick 0.
    let mut ticker = time::interval(config.interval);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut watching = config.reset_on_sample_change;
    samples.borrow_and_update();
    let mut ticks: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!(
                    "attention reporter for lesson {} stopped after {ticks} reports",
                    config.lesson_id
                );
                break;
            }
            changed = samples.changed(), if watching => {
                if changed.is_err() {
                    // Writer is gone; keep reporting the last value on schedule.
                    watching = false;
                    continue;
                }
                let sample = *samples.borrow_and_update();
                log_debug!("attention changed to {:.1}; restarting report interval", sample.score);
                ticker.reset_immediately();
            }
            _ = ticker.tick() => {
                ticks += 1;
                let sample = *samples.borrow();
                let report = AttentionReport {
                    lesson_id: config.lesson_id.clone(),
                    attention_score: sample.score,
                };
                tokio::spawn(send_report(Arc::clone(&api), report));
            }
        }
    }
}

async fn send_report(api: Arc<dyn LessonApi>, report: AttentionReport) {
    match api.post_attention(&report).await {
        Ok(()) => log_debug!(
            "attention {:.1} logged for lesson {}",
            report.attention_score,
            report.lesson_id
        ),
        Err(err @ TelemetrySendError::Status { .. }) => log_warn!("{err}"),
        Err(err) => log_debug!("{err}"),
    }
}
