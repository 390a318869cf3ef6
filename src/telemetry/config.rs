use std::time::Duration;

use crate::error::ConfigError;

/// What the reporter sends and how often. Any change restarts the timer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelemetryConfig {
    pub lesson_id: String,
    pub interval: Duration,
    /// Restart the tick-0/interval sequence whenever the attention sample
    /// changes value.
    pub reset_on_sample_change: bool,
}

impl TelemetryConfig {
    pub fn new(lesson_id: impl Into<String>, interval_ms: u64) -> Result<Self, ConfigError> {
        if interval_ms == 0 {
            return Err(ConfigError::NotPositive {
                field: "interval_ms",
            });
        }
        Ok(Self {
            lesson_id: lesson_id.into(),
            interval: Duration::from_millis(interval_ms),
            reset_on_sample_change: true,
        })
    }

    pub fn reset_on_sample_change(mut self, enabled: bool) -> Self {
        self.reset_on_sample_change = enabled;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn zero_interval_is_rejected() {
        assert_eq!(
            TelemetryConfig::new("2", 0),
            Err(ConfigError::NotPositive {
                field: "interval_ms"
            })
        );
    }

    #[test]
    fn builds_interval_from_millis() {
        let config = TelemetryConfig::new("2", 10_000).unwrap();
        assert_eq!(config.interval, Duration::from_secs(10));
        assert!(config.reset_on_sample_change);
        assert!(!config.reset_on_sample_change(false).reset_on_sample_change);
    }
}
