//! System configuration parameters
//!
//! All tunable parameters for the monitor core.  Supplied once at
//! start-up by the configuration collaborator, either as a value or as a
//! postcard blob passed to [`SystemConfig::decode`].  Only calibrations
//! can change afterwards, through `SensorSource::set_calibration`.

use core::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::ports::ConfigError;
use crate::sensors::calibration::Calibration;

/// Core system configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemConfig {
    // --- Acquisition ---
    /// Idle time between acquisition cycles (milliseconds)
    pub sample_period_ms: u32,
    /// Bound on every hardware / store lock acquisition (milliseconds)
    pub lock_timeout_ms: u32,
    /// Bound on a delivery-queue enqueue before the reading is dropped
    pub enqueue_timeout_ms: u32,

    // --- Aggregation ---
    /// Joint-readiness wait bound (milliseconds)
    pub readiness_timeout_ms: u32,
    /// Joint samples per summary window
    pub stats_window: u16,

    // --- Actuation ---
    pub blink_slow_ms: u32,
    pub blink_fast_ms: u32,
    /// Water raw value above which the LEDs blink fast
    pub water_high_threshold: u16,
    /// Water raw value below which the LEDs return to slow
    pub water_low_threshold: u16,

    // --- Liveness ---
    pub liveness_period_ms: u32,
    /// Stack high-water mark (bytes) below which a task is flagged
    pub stack_warning_bytes: u32,

    // --- Calibration defaults ---
    pub light_calibration: Calibration,
    pub water_calibration: Calibration,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            sample_period_ms: 2000,
            lock_timeout_ms: 100,
            enqueue_timeout_ms: 100,

            readiness_timeout_ms: 5000,
            stats_window: 10,

            blink_slow_ms: 500,
            blink_fast_ms: 100,
            water_high_threshold: 3000,
            water_low_threshold: 2000,

            liveness_period_ms: 10_000,
            stack_warning_bytes: 512,

            light_calibration: Calibration::default(),
            water_calibration: Calibration::default(),
        }
    }
}

impl SystemConfig {
    /// Decode a postcard blob and validate it.
    pub fn decode(bytes: &[u8]) -> Result<Self, ConfigError> {
        let cfg: Self = postcard::from_bytes(bytes).map_err(|_| ConfigError::Corrupted)?;
        cfg.validate()?;
        Ok(cfg)
    }

    pub fn encode(&self) -> Result<Vec<u8>, ConfigError> {
        postcard::to_allocvec(self).map_err(|_| ConfigError::Corrupted)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.sample_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("sample_period_ms must be > 0"));
        }
        if self.lock_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("lock_timeout_ms must be > 0"));
        }
        if self.readiness_timeout_ms == 0 {
            return Err(ConfigError::ValidationFailed("readiness_timeout_ms must be > 0"));
        }
        if self.stats_window == 0 {
            return Err(ConfigError::ValidationFailed("stats_window must be > 0"));
        }
        if self.blink_fast_ms == 0 || self.blink_slow_ms == 0 {
            return Err(ConfigError::ValidationFailed("blink periods must be > 0"));
        }
        if self.blink_fast_ms >= self.blink_slow_ms {
            return Err(ConfigError::ValidationFailed("blink_fast_ms must be < blink_slow_ms"));
        }
        if self.water_low_threshold >= self.water_high_threshold {
            return Err(ConfigError::ValidationFailed(
                "water_low_threshold must be < water_high_threshold",
            ));
        }
        if self.liveness_period_ms == 0 {
            return Err(ConfigError::ValidationFailed("liveness_period_ms must be > 0"));
        }
        Ok(())
    }

    pub fn sample_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.sample_period_ms))
    }

    pub fn lock_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.lock_timeout_ms))
    }

    pub fn enqueue_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.enqueue_timeout_ms))
    }

    pub fn readiness_timeout(&self) -> Duration {
        Duration::from_millis(u64::from(self.readiness_timeout_ms))
    }

    pub fn liveness_period(&self) -> Duration {
        Duration::from_millis(u64::from(self.liveness_period_ms))
    }
}
