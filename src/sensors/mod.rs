//! Sensor subsystem: channel metadata and the synchronized [`SensorSource`].
//!
//! The source owns the ADC handle and both channel calibrations behind a
//! single mutex.  Every caller (acquisition task, network handlers,
//! console) goes through [`SensorSource::read`], which holds the lock only
//! for the conversion itself; calibration runs after the lock is released.

pub mod calibration;

use core::fmt;
use core::time::Duration;

use log::{debug, info, warn};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};

use crate::adapters::time::Uptime;
use crate::app::ports::AnalogInput;
use crate::error::{DeviceError, Error, Resource, Result};
use crate::pins;
use calibration::{Calibration, Unit};

/// Number of analog channels on the board.
pub const SENSOR_COUNT: usize = 2;

// ═══════════════════════════════════════════════════════════════
//  Channel identity and metadata
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u8)]
pub enum SensorChannel {
    Light = 0,
    Water = 1,
}

impl SensorChannel {
    /// Sampling order used by the acquisition task.
    pub const ALL: [SensorChannel; SENSOR_COUNT] = [Self::Light, Self::Water];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for SensorChannel {
    type Error = Error;

    /// Collaborators address channels by number; anything unknown is
    /// rejected here rather than coerced.
    fn try_from(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Light),
            1 => Ok(Self::Water),
            other => Err(Error::InvalidChannel(other)),
        }
    }
}

impl fmt::Display for SensorChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Light => write!(f, "light"),
            Self::Water => write!(f, "water"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum SensorKind {
    Light,
    Water,
}

impl SensorKind {
    pub fn label(self) -> &'static str {
        match self {
            Self::Light => "Light",
            Self::Water => "Water",
        }
    }
}

/// Immutable per-channel metadata.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct SensorInfo {
    pub kind: SensorKind,
    pub gpio: i32,
    pub adc_channel: u32,
    pub location: &'static str,
}

static SENSOR_INFO: [SensorInfo; SENSOR_COUNT] = [
    SensorInfo {
        kind: SensorKind::Light,
        gpio: pins::LIGHT_ADC_GPIO,
        adc_channel: pins::LIGHT_ADC_CHANNEL,
        location: "roof",
    },
    SensorInfo {
        kind: SensorKind::Water,
        gpio: pins::WATER_ADC_GPIO,
        adc_channel: pins::WATER_ADC_CHANNEL,
        location: "roof",
    },
];

/// Static metadata for `channel`.  Lock-free: the table never changes.
pub fn sensor_info(channel: SensorChannel) -> &'static SensorInfo {
    &SENSOR_INFO[channel.index()]
}

/// One calibrated sample.  Copied by value whenever it crosses a task
/// boundary.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SensorReading {
    pub channel: SensorChannel,
    /// 12-bit ADC value, 0–4095.
    pub raw: u16,
    pub calibrated: f32,
    pub unit: Unit,
    /// Milliseconds since boot.
    pub timestamp_ms: u32,
}

// ═══════════════════════════════════════════════════════════════
//  Sensor source
// ═══════════════════════════════════════════════════════════════

/// State behind the hardware lock.
struct SensorHardware<A> {
    adc: A,
    calibrations: [Calibration; SENSOR_COUNT],
}

/// Serialized access to the ADC and per-channel calibration.
pub struct SensorSource<A: AnalogInput> {
    hw: Mutex<SensorHardware<A>>,
    lock_timeout: Duration,
    clock: Uptime,
}

impl<A: AnalogInput> SensorSource<A> {
    pub fn new(adc: A, calibrations: [Calibration; SENSOR_COUNT], lock_timeout: Duration) -> Self {
        for (info, cal) in SENSOR_INFO.iter().zip(calibrations.iter()) {
            info!(
                "SensorSource: {} on GPIO{}/CH{} ({}), unit={}",
                info.kind.label(),
                info.gpio,
                info.adc_channel,
                info.location,
                cal.unit
            );
        }
        Self {
            hw: Mutex::new(SensorHardware { adc, calibrations }),
            lock_timeout,
            clock: Uptime::new(),
        }
    }

    /// Sample `channel` once and calibrate it.
    ///
    /// The hardware lock covers only the conversion; calibration and
    /// time-stamping happen after it is released.
    pub fn read(&self, channel: SensorChannel) -> Result<SensorReading> {
        let Some(mut hw) = self.hw.try_lock_for(self.lock_timeout) else {
            warn!("SensorSource[{}]: hardware lock timed out", channel);
            return Err(Error::AcquisitionTimeout(Resource::SensorHardware));
        };
        let sampled = hw.adc.sample(channel);
        let calibration = hw.calibrations[channel.index()].clone();
        drop(hw);

        let raw = sampled.map_err(|e| {
            warn!("SensorSource[{}]: {}", channel, e);
            Error::from(e)
        })?;
        if raw > pins::ADC_MAX {
            warn!("SensorSource[{}]: raw {} above 12-bit range", channel, raw);
            return Err(DeviceError::OutOfRange { channel, raw }.into());
        }

        let reading = SensorReading {
            channel,
            raw,
            calibrated: calibration.apply(raw),
            unit: calibration.unit,
            timestamp_ms: self.clock.uptime_ms(),
        };
        debug!(
            "SensorSource[{}]: raw={} calib={:.2} {} t={}ms",
            channel, reading.raw, reading.calibrated, reading.unit, reading.timestamp_ms
        );
        Ok(reading)
    }

    /// Replace the calibration used for `channel` from the next read on.
    pub fn set_calibration(&self, channel: SensorChannel, calibration: Calibration) -> Result<()> {
        let Some(mut hw) = self.hw.try_lock_for(self.lock_timeout) else {
            warn!("SensorSource[{}]: hardware lock timed out (set_calibration)", channel);
            return Err(Error::AcquisitionTimeout(Resource::SensorHardware));
        };
        info!(
            "SensorSource[{}]: calibration -> {:?} ({})",
            channel, calibration.function, calibration.unit
        );
        hw.calibrations[channel.index()] = calibration;
        Ok(())
    }

    /// Static metadata.  Lock-free: the table never changes after boot.
    pub fn info(&self, channel: SensorChannel) -> &'static SensorInfo {
        sensor_info(channel)
    }
}
