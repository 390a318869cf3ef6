use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use crate::config::DetectorOptions;
use crate::error::{DetectorError, InferenceInitError};

use super::capture::Frame;

/// Landmarks for one detected face, normalized `[x, y, z]` coordinates.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct FaceLandmarks {
    pub points: Vec<[f32; 3]>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct DetectionResult {
    pub frame_index: u64,
    pub faces: Vec<FaceLandmarks>,
}

impl DetectionResult {
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }
}

/// Invoked once per processed frame.
pub type ResultsHandler = Box<dyn FnMut(&DetectionResult) + Send>;

/// A loaded face-landmark model.
///
/// Results are not returned from [`send`](Self::send); they are delivered to
/// the handler registered through [`on_results`](Self::on_results).
pub trait FaceDetector: Send {
    fn on_results(&mut self, handler: ResultsHandler);

    fn send(&mut self, frame: &Frame) -> Result<(), DetectorError>;

    fn close(&mut self) {}
}

pub trait DetectorFactory: Send + Sync {
    fn load(&self, options: &DetectorOptions) -> Result<Box<dyn FaceDetector>, InferenceInitError>;
}

/// Probability that the simulated learner looks away or back on a frame.
const DEFAULT_FLIP_PROBABILITY: f64 = 0.01;

/// Loads [`SyntheticDetector`]s: a stand-in model whose learner drifts in
/// and out of frame.
pub struct SyntheticDetectorFactory {
    flip_probability: f64,
    seed: Option<u64>,
}

impl Default for SyntheticDetectorFactory {
    fn default() -> Self {
        Self {
            flip_probability: DEFAULT_FLIP_PROBABILITY,
            seed: None,
        }
    }
}

impl SyntheticDetectorFactory {
    pub fn with_seed(seed: u64, flip_probability: f64) -> Self {
        Self {
            flip_probability: flip_probability.clamp(0.0, 1.0),
            seed: Some(seed),
        }
    }
}

impl DetectorFactory for SyntheticDetectorFactory {
    fn load(&self, options: &DetectorOptions) -> Result<Box<dyn FaceDetector>, InferenceInitError> {
        if options.max_num_faces == 0 {
            return Err(InferenceInitError::DetectorLoad(
                "max_num_faces must be at least 1".into(),
            ));
        }

        let rng = match self.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };

        Ok(Box::new(SyntheticDetector {
            rng,
            flip_probability: self.flip_probability,
            face_present: true,
            handler: None,
        }))
    }
}

pub struct SyntheticDetector {
    rng: StdRng,
    flip_probability: f64,
    face_present: bool,
    handler: Option<ResultsHandler>,
}

impl FaceDetector for SyntheticDetector {
    fn on_results(&mut self, handler: ResultsHandler) {
        self.handler = Some(handler);
    }

    fn send(&mut self, frame: &Frame) -> Result<(), DetectorError> {
        if self.rng.gen_bool(self.flip_probability) {
            self.face_present = !self.face_present;
        }

        let faces = if self.face_present {
            vec![FaceLandmarks::default()]
        } else {
            Vec::new()
        };

        if let Some(handler) = self.handler.as_mut() {
            handler(&DetectionResult {
                frame_index: frame.index,
                faces,
            });
        }
        Ok(())
    }

    fn close(&mut self) {
        self.handler = None;
    }
}
