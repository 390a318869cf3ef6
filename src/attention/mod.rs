pub mod capture;
pub mod detector;
pub mod engine;
mod loop_worker;
pub mod sample;

pub use capture::{
    CameraSource, CaptureDriver, CaptureSession, Frame, SyntheticCamera, UnavailableCamera,
};
pub use detector::{
    DetectionResult, DetectorFactory, FaceDetector, FaceLandmarks, ResultsHandler,
    SyntheticDetectorFactory,
};
pub use engine::{AttentionEngine, EngineStatus};
pub use sample::{presence_score, AttentionCell, AttentionSample};
