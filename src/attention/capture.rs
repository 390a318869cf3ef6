use chrono::{DateTime, Utc};
use image::RgbImage;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::time::{self, MissedTickBehavior};
use tokio_util::sync::CancellationToken;

use crate::config::CaptureSettings;
use crate::error::InferenceInitError;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info};

/// Frames waiting for inference. Anything beyond this is dropped by the
/// driver rather than queued.
pub const FRAME_BUFFER: usize = 1;

#[derive(Debug, Clone)]
pub struct Frame {
    pub index: u64,
    pub captured_at: DateTime<Utc>,
    pub image: Arc<RgbImage>,
}

/// A started camera that pushes frames at its own cadence.
pub trait CaptureDriver: Send {
    /// Begin delivering frames. The receiver closes when the driver stops.
    fn start(&mut self) -> Result<mpsc::Receiver<Frame>, InferenceInitError>;

    /// Stop delivering frames.
    fn stop(&mut self);

    /// Release the device and any attached video surface.
    fn release(&mut self);
}

/// Platform entry point for acquiring a camera (permission prompt included).
pub trait CameraSource: Send + Sync {
    fn open(
        &self,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureDriver>, InferenceInitError>;
}

/// Owns an acquired driver and guarantees it is stopped and released exactly
/// once, whichever way the owner exits.
pub struct CaptureSession {
    driver: Option<Box<dyn CaptureDriver>>,
}

impl CaptureSession {
    pub fn new(driver: Box<dyn CaptureDriver>) -> Self {
        Self {
            driver: Some(driver),
        }
    }

    pub fn start(&mut self) -> Result<mpsc::Receiver<Frame>, InferenceInitError> {
        match self.driver.as_mut() {
            Some(driver) => driver.start(),
            None => Err(InferenceInitError::CameraUnavailable(
                "capture session already shut down".into(),
            )),
        }
    }

    pub fn shutdown(&mut self) {
        if let Some(mut driver) = self.driver.take() {
            driver.stop();
            driver.release();
            log_debug!("capture driver stopped and released");
        }
    }
}

impl Drop for CaptureSession {
    fn drop(&mut self) {
        self.shutdown();
    }
}

/// Camera source used when no capture backend is available on this build.
/// Every open attempt fails, so the engine degrades and the score stays at
/// its default.
pub struct UnavailableCamera;

impl CameraSource for UnavailableCamera {
    fn open(
        &self,
        _settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureDriver>, InferenceInitError> {
        Err(InferenceInitError::CameraUnavailable(
            "no capture backend available".into(),
        ))
    }
}

/// Produces blank frames at the configured frame rate.
pub struct SyntheticCamera;

impl CameraSource for SyntheticCamera {
    fn open(
        &self,
        settings: &CaptureSettings,
    ) -> Result<Box<dyn CaptureDriver>, InferenceInitError> {
        Ok(Box::new(SyntheticDriver::new(*settings)))
    }
}

pub struct SyntheticDriver {
    settings: CaptureSettings,
    cancel_token: Option<CancellationToken>,
}

impl SyntheticDriver {
    pub fn new(settings: CaptureSettings) -> Self {
        Self {
            settings,
            cancel_token: None,
        }
    }
}

impl CaptureDriver for SyntheticDriver {
    fn start(&mut self) -> Result<mpsc::Receiver<Frame>, InferenceInitError> {
        if self.cancel_token.is_some() {
            return Err(InferenceInitError::CameraUnavailable(
                "synthetic camera already started".into(),
            ));
        }

        let (tx, rx) = mpsc::channel(FRAME_BUFFER);
        let token = CancellationToken::new();
        let settings = self.settings;
        let blank = Arc::new(RgbImage::new(settings.width, settings.height));

        tokio::spawn(frame_pump(tx, blank, settings, token.clone()));
        log_info!(
            "synthetic camera started at {}x{} @ {} fps",
            settings.width,
            settings.height,
            settings.fps
        );

        self.cancel_token = Some(token);
        Ok(rx)
    }

    fn stop(&mut self) {
        if let Some(token) = self.cancel_token.take() {
            token.cancel();
        }
    }

    fn release(&mut self) {}
}

async fn frame_pump(
    tx: mpsc::Sender<Frame>,
    image: Arc<RgbImage>,
    settings: CaptureSettings,
    cancel_token: CancellationToken,
) {
    let mut ticker = time::interval(settings.frame_interval());
    ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
    let mut index = 0u64;

    loop {
        tokio::select! {
            _ = cancel_token.cancelled() => break,
            _ = ticker.tick() => {
                let frame = Frame {
                    index,
                    captured_at: Utc::now(),
                    image: Arc::clone(&image),
                };
                index += 1;

                match tx.try_send(frame) {
                    Ok(()) => {}
                    // Inference is behind; drop the frame instead of queueing.
                    Err(mpsc::error::TrySendError::Full(_)) => {}
                    Err(mpsc::error::TrySendError::Closed(_)) => break,
                }
            }
        }
    }
}
