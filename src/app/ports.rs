//! Port traits: the boundary between the concurrency core and the outside world.
//!
//! ```text
//!   Adapter ──▶ Port trait ──▶ core (SensorSource, tasks, monitor)
//! ```
//!
//! Driven adapters (ADC, event sinks, task probes) implement these traits.
//! The core consumes them via generics, so nothing above the adapters
//! touches hardware directly.  Digital outputs use
//! [`embedded_hal::digital::OutputPin`] rather than a port of our own.

use crate::diagnostics::SystemSample;
use crate::error::DeviceError;
use crate::sensors::SensorChannel;

// ───────────────────────────────────────────────────────────────
// Analog input port (driven adapter: hardware → core)
// ───────────────────────────────────────────────────────────────

/// One-shot analog sampling.  Implementations block for the duration of
/// a single conversion (a few hundred microseconds on ADC1).
///
/// Callers serialise access; implementations need not be re-entrant.
pub trait AnalogInput: Send {
    /// Take one 12-bit sample from `channel`.
    fn sample(&mut self, channel: SensorChannel) -> Result<u16, DeviceError>;
}

// ───────────────────────────────────────────────────────────────
// Event sink port (driven adapter: core → console / telemetry)
// ───────────────────────────────────────────────────────────────

/// The tasks emit structured [`AppEvent`](super::events::AppEvent)s
/// through this port.  Adapters decide where they go (serial log, an
/// MQTT publisher, a test recorder).
pub trait EventSink: Send {
    fn emit(&mut self, event: &super::events::AppEvent);
}

// ───────────────────────────────────────────────────────────────
// System probe port (driven adapter: RTOS → liveness monitor)
// ───────────────────────────────────────────────────────────────

/// Read-only view of scheduler and allocator bookkeeping.
pub trait SystemProbe: Send {
    /// Per-task stack high-water marks and run-time counters, plus heap
    /// figures, captured as one sample.
    fn sample(&self) -> SystemSample;
}

// ───────────────────────────────────────────────────────────────
// Error types
// ───────────────────────────────────────────────────────────────

/// Errors from decoding or validating a [`SystemConfig`](crate::config::SystemConfig).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigError {
    /// The blob handed over by the configuration collaborator did not decode.
    Corrupted,
    /// A config field failed range validation.
    /// The `&'static str` describes which field and why.
    ValidationFailed(&'static str),
}

impl core::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Corrupted => write!(f, "config corrupted"),
            Self::ValidationFailed(msg) => write!(f, "validation failed: {}", msg),
        }
    }
}

impl core::error::Error for ConfigError {}
