use anyhow::{Context, Result};
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::{CaptureSettings, DetectorOptions};
use crate::error::InferenceInitError;

use super::capture::{CameraSource, CaptureSession, Frame};
use super::detector::{DetectorFactory, FaceDetector};
use super::loop_worker::inference_loop;
use super::sample::{presence_score, AttentionCell};

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_info, log_warn};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase", tag = "state")]
pub enum EngineStatus {
    Idle,
    Running,
    /// Camera or model could not be brought up; the score keeps its last value.
    Degraded { reason: String },
    Stopped,
}

static DRIVER_ENDED: EngineStatus = EngineStatus::Stopped;

pub struct AttentionEngine {
    camera: Arc<dyn CameraSource>,
    detectors: Arc<dyn DetectorFactory>,
    capture: CaptureSettings,
    options: DetectorOptions,
    cell: AttentionCell,
    status: EngineStatus,
    handle: Option<JoinHandle<()>>,
    cancel_token: Option<CancellationToken>,
}

impl AttentionEngine {
    pub fn new(
        camera: Arc<dyn CameraSource>,
        detectors: Arc<dyn DetectorFactory>,
        capture: CaptureSettings,
        options: DetectorOptions,
        cell: AttentionCell,
    ) -> Self {
        Self {
            camera,
            detectors,
            capture,
            options,
            cell,
            status: EngineStatus::Idle,
            handle: None,
            cancel_token: None,
        }
    }

    pub fn status(&self) -> &EngineStatus {
        if self.loop_exited() {
            return &DRIVER_ENDED;
        }
        &self.status
    }

    /// The inference loop ended on its own because the driver stopped
    /// delivering frames.
    fn loop_exited(&self) -> bool {
        self.handle.as_ref().is_some_and(JoinHandle::is_finished)
    }

    pub fn cell(&self) -> &AttentionCell {
        &self.cell
    }

    /// Acquire the camera and detector and start processing frames.
    ///
    /// Never fails: initialization problems leave the engine `Degraded`.
    pub fn start(&mut self) -> &EngineStatus {
        if self.loop_exited() {
            log_info!("capture driver ended; restarting attention engine");
            self.handle = None;
            self.cancel_token = None;
            self.status = EngineStatus::Stopped;
        }
        if self.handle.is_some() {
            log_warn!("attention engine already running");
            return &self.status;
        }

        let cancel_token = CancellationToken::new();
        match self.acquire(&cancel_token) {
            Ok((session, detector, frames)) => {
                let handle = tokio::spawn(inference_loop(
                    session,
                    detector,
                    frames,
                    cancel_token.clone(),
                ));
                self.handle = Some(handle);
                self.cancel_token = Some(cancel_token);
                self.status = EngineStatus::Running;
                log_info!("attention engine running");
            }
            Err(err) => {
                log_warn!("attention engine degraded: {err}");
                self.status = EngineStatus::Degraded {
                    reason: err.to_string(),
                };
            }
        }

        &self.status
    }

    /// Camera first, then detector. Any early return drops the session, which
    /// stops and releases whatever was already acquired.
    fn acquire(
        &self,
        cancel_token: &CancellationToken,
    ) -> Result<(CaptureSession, Box<dyn FaceDetector>, mpsc::Receiver<Frame>), InferenceInitError>
    {
        let driver = self.camera.open(&self.capture)?;
        let mut session = CaptureSession::new(driver);

        let mut detector = self.detectors.load(&self.options)?;
        let cell = self.cell.clone();
        let token = cancel_token.clone();
        detector.on_results(Box::new(move |result| {
            if token.is_cancelled() {
                return;
            }
            cell.publish(presence_score(result.face_count()));
        }));

        let frames = session.start()?;
        Ok((session, detector, frames))
    }

    pub async fn stop(&mut self) -> Result<()> {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }

        let joined = match self.handle.take() {
            Some(handle) => handle
                .await
                .context("inference loop task failed to join")
                .map(|_| ()),
            None => Ok(()),
        };

        if self.status == EngineStatus::Running {
            self.status = EngineStatus::Stopped;
        }
        joined
    }
}
