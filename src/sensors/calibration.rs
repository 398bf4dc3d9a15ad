//! Calibration engine: maps a raw ADC sample to a physical value.
//!
//! Pure and total: no clamping, no range checks, no failure mode.
//! Out-of-range raw values are the [`SensorSource`](super::SensorSource)'s
//! concern, not this module's.

use serde::{Deserialize, Serialize};

/// Short unit label carried alongside a calibration ("raw", "lux", "%").
pub type Unit = heapless::String<8>;

/// Formula applied to a raw sample.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum CalibrationFunction {
    /// Identity: the raw value widened to `f32`.
    None,
    /// `y = m·x + b`
    Linear { m: f32, b: f32 },
    /// `y = a·x² + b·x + c`
    Polynomial { a: f32, b: f32, c: f32 },
}

/// A channel's calibration: the formula plus the unit its output is in.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Calibration {
    pub function: CalibrationFunction,
    pub unit: Unit,
}

impl Calibration {
    /// Build a calibration.  Units longer than 8 bytes are truncated on a
    /// character boundary.
    pub fn new(function: CalibrationFunction, unit: &str) -> Self {
        let mut u = Unit::new();
        for ch in unit.chars() {
            if u.push(ch).is_err() {
                break;
            }
        }
        Self { function, unit: u }
    }

    pub fn apply(&self, raw: u16) -> f32 {
        calibrate(raw, self.function)
    }
}

impl Default for Calibration {
    fn default() -> Self {
        Self::new(CalibrationFunction::None, "raw")
    }
}

/// Apply `function` to `raw`.
pub fn calibrate(raw: u16, function: CalibrationFunction) -> f32 {
    let x = f32::from(raw);
    match function {
        CalibrationFunction::None => x,
        CalibrationFunction::Linear { m, b } => m * x + b,
        CalibrationFunction::Polynomial { a, b, c } => a * x * x + b * x + c,
    }
}
