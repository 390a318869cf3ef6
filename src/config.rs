use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::{
    fmt, fs,
    path::{Path, PathBuf},
    time::Duration,
};

use crate::error::ConfigError;
use crate::telemetry::TelemetryConfig;

/// Looked up in the working directory when no `--config` path is given.
pub const DEFAULT_CONFIG_FILE: &str = "lesson-player.json";

pub const ENV_BASE_URL: &str = "LESSON_PLAYER_BASE_URL";
pub const ENV_LESSON_ID: &str = "LESSON_PLAYER_LESSON_ID";
pub const ENV_INTERVAL_MS: &str = "LESSON_PLAYER_INTERVAL_MS";
pub const ENV_TOKEN: &str = "LESSON_PLAYER_TOKEN";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ApiSettings {
    pub base_url: String,
    pub request_timeout_ms: u64,
}

impl Default for ApiSettings {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".into(),
            request_timeout_ms: 5_000,
        }
    }
}

impl ApiSettings {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct TelemetrySettings {
    pub interval_ms: u64,
    /// Restart the tick-0/interval sequence whenever the presence score flips.
    pub reset_on_sample_change: bool,
}

impl Default for TelemetrySettings {
    fn default() -> Self {
        Self {
            interval_ms: 10_000,
            reset_on_sample_change: true,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct CaptureSettings {
    pub width: u32,
    pub height: u32,
    pub fps: u32,
}

impl Default for CaptureSettings {
    fn default() -> Self {
        Self {
            width: 640,
            height: 480,
            fps: 30,
        }
    }
}

impl CaptureSettings {
    pub fn frame_interval(&self) -> Duration {
        Duration::from_secs_f64(1.0 / f64::from(self.fps.max(1)))
    }
}

/// Options handed to the landmark detector when it is loaded.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DetectorOptions {
    pub max_num_faces: u32,
    pub refine_landmarks: bool,
    pub min_detection_confidence: f32,
    pub min_tracking_confidence: f32,
}

impl Default for DetectorOptions {
    fn default() -> Self {
        Self {
            max_num_faces: 1,
            refine_landmarks: true,
            min_detection_confidence: 0.5,
            min_tracking_confidence: 0.5,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PlayerConfig {
    pub api: ApiSettings,
    pub lesson_id: String,
    pub telemetry: TelemetrySettings,
    pub capture: CaptureSettings,
    pub detector: DetectorOptions,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            api: ApiSettings::default(),
            lesson_id: "2".into(),
            telemetry: TelemetrySettings::default(),
            capture: CaptureSettings::default(),
            detector: DetectorOptions::default(),
        }
    }
}

impl PlayerConfig {
    /// Defaults, then the given file (or `lesson-player.json` when present),
    /// then the process environment.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => {
                let fallback = PathBuf::from(DEFAULT_CONFIG_FILE);
                if fallback.exists() {
                    Self::from_file(&fallback)?
                } else {
                    Self::default()
                }
            }
        };

        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    /// Apply `LESSON_PLAYER_*` overrides using `lookup` to read variables.
    pub fn apply_overrides<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(base_url) = lookup(ENV_BASE_URL) {
            self.api.base_url = base_url;
        }
        if let Some(lesson_id) = lookup(ENV_LESSON_ID) {
            self.lesson_id = lesson_id;
        }
        if let Some(raw) = lookup(ENV_INTERVAL_MS) {
            self.telemetry.interval_ms = raw
                .trim()
                .parse()
                .with_context(|| format!("{ENV_INTERVAL_MS} is not an integer: {raw:?}"))?;
        }
        Ok(())
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.api.base_url.trim().is_empty() {
            return Err(ConfigError::Empty {
                field: "api.base_url",
            });
        }
        if self.lesson_id.trim().is_empty() {
            return Err(ConfigError::Empty { field: "lesson_id" });
        }
        if self.telemetry.interval_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "telemetry.interval_ms",
            });
        }
        if self.api.request_timeout_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "api.request_timeout_ms",
            });
        }
        if self.capture.fps == 0 {
            return Err(ConfigError::NotPositive {
                field: "capture.fps",
            });
        }
        for (field, value) in [
            (
                "detector.min_detection_confidence",
                self.detector.min_detection_confidence,
            ),
            (
                "detector.min_tracking_confidence",
                self.detector.min_tracking_confidence,
            ),
        ] {
            if !(0.0..=1.0).contains(&value) {
                return Err(ConfigError::OutOfUnitRange { field, value });
            }
        }
        Ok(())
    }

    pub fn telemetry_config(&self) -> Result<TelemetryConfig, ConfigError> {
        Ok(TelemetryConfig::new(self.lesson_id.clone(), self.telemetry.interval_ms)?
            .reset_on_sample_change(self.telemetry.reset_on_sample_change))
    }
}

/// Bearer token for the lesson backend. Supplied at runtime, never compiled in.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn from_env() -> Option<Self> {
        std::env::var(ENV_TOKEN)
            .ok()
            .map(|token| token.trim().to_string())
            .filter(|token| !token.is_empty())
            .map(Self)
    }

    pub fn from_file(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read token from {}", path.display()))?;
        let token = contents.trim();
        if token.is_empty() {
            anyhow::bail!("token file {} is empty", path.display());
        }
        Ok(Self(token.to_string()))
    }

    pub fn bearer(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn defaults_point_at_local_backend() {
        let config = PlayerConfig::default();
        assert_eq!(config.api.base_url, "http://localhost:8000");
        assert_eq!(config.lesson_id, "2");
        assert_eq!(config.telemetry.interval_ms, 10_000);
        assert_eq!(config.capture.width, 640);
        assert_eq!(config.capture.height, 480);
        assert_eq!(config.detector.max_num_faces, 1);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn partial_file_keeps_defaults_for_missing_sections() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("player.json");
        fs::write(
            &path,
            r#"{ "lesson_id": "7", "telemetry": { "interval_ms": 2500 } }"#,
        )
        .unwrap();

        let config = PlayerConfig::from_file(&path).unwrap();
        assert_eq!(config.lesson_id, "7");
        assert_eq!(config.telemetry.interval_ms, 2_500);
        assert!(config.telemetry.reset_on_sample_change);
        assert_eq!(config.api, ApiSettings::default());
    }

    #[test]
    fn environment_overrides_file_values() {
        let vars: HashMap<&str, &str> = [
            (ENV_BASE_URL, "https://lessons.example"),
            (ENV_INTERVAL_MS, "1500"),
        ]
        .into_iter()
        .collect();

        let mut config = PlayerConfig::default();
        config
            .apply_overrides(|key| vars.get(key).map(|v| v.to_string()))
            .unwrap();

        assert_eq!(config.api.base_url, "https://lessons.example");
        assert_eq!(config.telemetry.interval_ms, 1_500);
        assert_eq!(config.lesson_id, "2");
    }

    #[test]
    fn non_numeric_interval_override_is_rejected() {
        let mut config = PlayerConfig::default();
        let err = config
            .apply_overrides(|key| (key == ENV_INTERVAL_MS).then(|| "soon".to_string()))
            .unwrap_err();
        assert!(err.to_string().contains(ENV_INTERVAL_MS));
    }

    #[test]
    fn zero_interval_fails_validation() {
        let mut config = PlayerConfig::default();
        config.telemetry.interval_ms = 0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "telemetry.interval_ms"
            })
        );
    }

    #[test]
    fn confidence_outside_unit_range_fails_validation() {
        let mut config = PlayerConfig::default();
        config.detector.min_tracking_confidence = 1.5;
        assert_eq!(
            config.validate(),
            Err(ConfigError::OutOfUnitRange {
                field: "detector.min_tracking_confidence",
                value: 1.5,
            })
        );
    }

    #[test]
    fn credential_debug_is_redacted() {
        let credential = Credential::new("secret-token");
        assert_eq!(format!("{credential:?}"), "Credential(<redacted>)");
        assert_eq!(credential.bearer(), "secret-token");
    }

    #[test]
    fn credential_file_is_trimmed() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token");
        fs::write(&path, "abc.def\n").unwrap();
        assert_eq!(Credential::from_file(&path).unwrap().bearer(), "abc.def");
    }
}
