//! GPIO / ADC assignments for the Geekhouse sensor board.
//!
//! Single source of truth: drivers and metadata tables reference this
//! module rather than hard-coding pin numbers.

// ---------------------------------------------------------------------------
// Sensors — Analog (ADC1, 12-bit, 12 dB attenuation → 0 – 3.3 V)
// ---------------------------------------------------------------------------

/// Photoresistor divider on the roof.
pub const LIGHT_ADC_GPIO: i32 = 0;
/// ADC1 channel 0.
pub const LIGHT_ADC_CHANNEL: u32 = 0;

/// Resistive rain/water sensor on the roof.
pub const WATER_ADC_GPIO: i32 = 1;
/// ADC1 channel 1.
pub const WATER_ADC_CHANNEL: u32 = 1;

/// Largest value a 12-bit oneshot read can return.
pub const ADC_MAX: u16 = 4095;

// ---------------------------------------------------------------------------
// Actuators — Digital outputs
// ---------------------------------------------------------------------------

/// Yellow indicator LED (roof), active HIGH.
pub const LED_YELLOW_GPIO: i32 = 2;
/// White indicator LED (garden), active HIGH.
pub const LED_WHITE_GPIO: i32 = 3;
