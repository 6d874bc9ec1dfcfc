//! Gesture configuration
//!
//! Thresholds and timings shared by the built-in detectors. Distances are in
//! logical pixels, durations in milliseconds.
//!
//! ```toml
//! tap_slop = 12.0
//! long_press_ms = 600
//! max_fingers = 5
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{GestureError, Result};
use crate::events::{millis, Timestamp};

/// Detection thresholds for a touch surface
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GestureConfig {
    /// Maximum travel of a finger that still counts as a tap or press
    pub tap_slop: f32,
    /// Longest finger contact that still counts as a tap
    pub tap_timeout_ms: u64,
    /// Maximum gap between taps of a multi-tap
    pub multi_tap_interval_ms: u64,
    /// Hold time before a long press is recognized
    pub long_press_ms: u64,
    /// Travel needed before a pan is recognized
    pub pan_distance: f32,
    /// Change of finger spread needed before a pinch is recognized
    pub pinch_distance: f32,
    /// Time a sequence waits for its next gesture to begin
    pub sequence_timeout_ms: u64,
    /// Upper bound for any recognizer's finger window
    pub max_fingers: usize,
    /// Exponential smoothing factor for finger velocity (0.0 - 1.0)
    pub velocity_smoothing: f32,
}

impl Default for GestureConfig {
    fn default() -> Self {
        Self {
            tap_slop: 20.0,
            tap_timeout_ms: 800,
            multi_tap_interval_ms: 300,
            long_press_ms: 500,
            pan_distance: 5.0,
            pinch_distance: 5.0,
            sequence_timeout_ms: 300,
            max_fingers: 10,
            velocity_smoothing: 0.3,
        }
    }
}

impl GestureConfig {
    /// Parse a configuration from TOML text; missing keys keep their defaults
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let config: GestureConfig = toml::from_str(content)?;
        config.validate()?;
        tracing::debug!("Loaded gesture config: {:?}", config);
        Ok(config)
    }

    /// Serialize to TOML string
    pub fn to_toml(&self) -> Result<String> {
        toml::to_string_pretty(self).map_err(|e| GestureError::InvalidConfig(e.to_string()))
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<()> {
        if self.max_fingers == 0 {
            return Err(GestureError::InvalidConfig(
                "max_fingers must be at least 1".to_string(),
            ));
        }
        if !(0.0..=1.0).contains(&self.velocity_smoothing) {
            return Err(GestureError::InvalidConfig(format!(
                "velocity_smoothing {} outside 0.0..=1.0",
                self.velocity_smoothing
            )));
        }
        for (name, value) in [
            ("tap_slop", self.tap_slop),
            ("pan_distance", self.pan_distance),
            ("pinch_distance", self.pinch_distance),
        ] {
            if value.is_nan() || value < 0.0 {
                return Err(GestureError::InvalidConfig(format!(
                    "{name} must be non-negative, got {value}"
                )));
            }
        }
        Ok(())
    }

    pub fn with_tap_slop(mut self, slop: f32) -> Self {
        self.tap_slop = slop;
        self
    }

    pub fn with_long_press_ms(mut self, ms: u64) -> Self {
        self.long_press_ms = ms;
        self
    }

    pub fn with_multi_tap_interval_ms(mut self, ms: u64) -> Self {
        self.multi_tap_interval_ms = ms;
        self
    }

    pub fn with_pan_distance(mut self, distance: f32) -> Self {
        self.pan_distance = distance;
        self
    }

    pub fn with_pinch_distance(mut self, distance: f32) -> Self {
        self.pinch_distance = distance;
        self
    }

    pub fn with_sequence_timeout_ms(mut self, ms: u64) -> Self {
        self.sequence_timeout_ms = ms;
        self
    }

    pub fn with_max_fingers(mut self, max: usize) -> Self {
        self.max_fingers = max;
        self
    }

    pub fn tap_timeout(&self) -> Timestamp {
        millis(self.tap_timeout_ms)
    }

    pub fn multi_tap_interval(&self) -> Timestamp {
        millis(self.multi_tap_interval_ms)
    }

    pub fn long_press_duration(&self) -> Timestamp {
        millis(self.long_press_ms)
    }

    pub fn sequence_timeout(&self) -> Timestamp {
        millis(self.sequence_timeout_ms)
    }
}
