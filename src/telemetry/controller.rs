use anyhow::{Context, Result};
use std::sync::Arc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::api::LessonApi;
use crate::attention::AttentionCell;

use super::config::TelemetryConfig;
use super::loop_worker::reporter_loop;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

pub struct TelemetryReporter {
    api: Arc<dyn LessonApi>,
    samples: AttentionCell,
    config: Option<TelemetryConfig>,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl TelemetryReporter {
    pub fn new(api: Arc<dyn LessonApi>, samples: AttentionCell) -> Self {
        Self {
            api,
            samples,
            config: None,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn is_running(&self) -> bool {
        self.handle.is_some()
    }

    pub fn config(&self) -> Option<&TelemetryConfig> {
        self.config.as_ref()
    }

    /// Start reporting under `config`, replacing any timer already running.
    pub async fn start(&mut self, config: TelemetryConfig) -> Result<()> {
        self.stop().await?;

        log_info!(
            "attention reporter started for lesson {} every {}ms",
            config.lesson_id,
            config.interval.as_millis()
        );

        let cancel_token = CancellationToken::new();
        let handle = tokio::spawn(reporter_loop(
            Arc::clone(&self.api),
            config.clone(),
            self.samples.subscribe(),
            cancel_token.clone(),
        ));

        self.handle = Some(handle);
        self.cancel_token = Some(cancel_token);
        self.config = Some(config);
        Ok(())
    }

    /// Restart under `config` if it differs from the running one.
    pub async fn reconfigure(&mut self, config: TelemetryConfig) -> Result<()> {
        if self.is_running() && self.config.as_ref() == Some(&config) {
            log_debug!("attention reporter config unchanged");
            return Ok(());
        }
        self.start(config).await
    }

    /// Cancel the timer. Reports already in flight are left to finish.
    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        if let Some(handle) = self.handle.take() {
            handle
                .await
                .context("attention reporter task failed to join")?;
        }
        Ok(())
    }
}
