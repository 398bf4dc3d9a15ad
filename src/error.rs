//! Unified error types for the Geekhouse firmware core.
//!
//! Every recoverable failure in the core funnels into [`Error`].  All
//! variants are `Copy` so they can be logged, counted and handed across
//! task boundaries without allocation.  None of them is fatal: the call
//! site that detects one logs it and carries on (skip the cycle, drop the
//! item, retry next period).  Only [`Error::Init`] aborts start-up.

use core::fmt;

use crate::sensors::SensorChannel;

// ---------------------------------------------------------------------------
// Top-level firmware error
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// A bounded lock could not be obtained in time.
    AcquisitionTimeout(Resource),
    /// The hardware sample or pin write failed.
    Device(DeviceError),
    /// A raw channel id outside the known set.
    InvalidChannel(u8),
    /// The delivery queue stayed full for the whole enqueue bound.
    QueueFull,
    /// A joint readiness wait ended before every requested channel
    /// reported; `missing` is the bitmask of channels that did not.
    ReadinessTimeout { missing: u8 },
    /// One-time start-up failure.
    Init(&'static str),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AcquisitionTimeout(r) => write!(f, "{r} lock acquisition timed out"),
            Self::Device(e) => write!(f, "device: {e}"),
            Self::InvalidChannel(id) => write!(f, "invalid channel id {id}"),
            Self::QueueFull => write!(f, "delivery queue full"),
            Self::ReadinessTimeout { missing } => {
                write!(f, "readiness timed out (missing=0b{missing:02b})")
            }
            Self::Init(msg) => write!(f, "init: {msg}"),
        }
    }
}

// ---------------------------------------------------------------------------
// Lock-guarded resources
// ---------------------------------------------------------------------------

/// The three mutually exclusive resources of the core.  Used to tag
/// [`Error::AcquisitionTimeout`] so the log says which lock was contended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Resource {
    SensorHardware,
    ActuatorHardware,
    ReadingStore,
}

impl fmt::Display for Resource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SensorHardware => write!(f, "sensor hardware"),
            Self::ActuatorHardware => write!(f, "actuator hardware"),
            Self::ReadingStore => write!(f, "reading store"),
        }
    }
}

// ---------------------------------------------------------------------------
// Device errors
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeviceError {
    /// ADC oneshot read returned an error code.
    AdcReadFailed { channel: SensorChannel, code: i32 },
    /// The conversion returned more than 12 bits.
    OutOfRange { channel: SensorChannel, raw: u16 },
    /// GPIO level write failed.
    GpioWriteFailed { gpio: i32 },
}

impl fmt::Display for DeviceError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AdcReadFailed { channel, code } => {
                write!(f, "ADC read failed on {channel} (rc={code})")
            }
            Self::OutOfRange { channel, raw } => {
                write!(f, "{channel} sample {raw} out of range")
            }
            Self::GpioWriteFailed { gpio } => write!(f, "GPIO{gpio} write failed"),
        }
    }
}

impl From<DeviceError> for Error {
    fn from(e: DeviceError) -> Self {
        Self::Device(e)
    }
}

impl core::error::Error for Error {}

// ---------------------------------------------------------------------------
// Convenience Result alias
// ---------------------------------------------------------------------------

/// Firmware-wide `Result` alias.
pub type Result<T> = core::result::Result<T, Error>;
