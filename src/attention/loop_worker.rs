use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use super::capture::{CaptureSession, Frame};
use super::detector::FaceDetector;

// Set to true to enable verbose logging in this module
const ENABLE_LOGS: bool = true;

use crate::{log_debug, log_info, log_warn};

/// Feed every delivered frame to the detector until cancelled or the driver
/// stops. The detector's result handler does the publishing.
pub async fn inference_loop(
    mut session: CaptureSession,
    mut detector: Box<dyn FaceDetector>,
    mut frames: mpsc::Receiver<Frame>,
    cancel_token: CancellationToken,
) {
    let mut processed: u64 = 0;
    let mut failed: u64 = 0;

    loop {
        tokio::select! {
            biased;
            _ = cancel_token.cancelled() => {
                log_info!(
                    "inference loop shutting down after {processed} frames ({failed} failed)"
                );
                break;
            }
            frame = frames.recv() => {
                let Some(frame) = frame else {
                    log_warn!("capture driver stopped delivering frames");
                    break;
                };

                match detector.send(&frame) {
                    Ok(()) => processed += 1,
                    Err(err) => {
                        failed += 1;
                        log_debug!("{err}");
                    }
                }
            }
        }
    }

    detector.close();
    session.shutdown();
}
