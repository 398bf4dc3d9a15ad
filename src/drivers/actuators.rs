//! Indicator LED sink (yellow + white).
//!
//! Both pins and their cached states sit behind one mutex.  Task callers
//! use the bounded operations through `Arc<ActuatorSink>`.  Soft-timer
//! callbacks get a [`LedToggler`] instead, which can only make a zero-wait
//! lock attempt.
//!
//! ## Dual-target design
//!
//! Generic over `embedded_hal::digital::OutputPin`: `esp_idf_hal` pin
//! drivers on the board, [`LedPin`](crate::adapters::hardware::LedPin)
//! simulation pins on the host.

use core::fmt;
use core::time::Duration;
use std::sync::Arc;

use embedded_hal::digital::OutputPin;
use log::{debug, warn};
use parking_lot::Mutex;
use serde::Serialize;

use crate::error::{DeviceError, Error, Resource, Result};
use crate::pins;
use crate::shared::NonBlocking;

pub const LED_COUNT: usize = 2;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[repr(u8)]
pub enum LedChannel {
    Yellow = 0,
    White = 1,
}

impl LedChannel {
    pub const ALL: [LedChannel; LED_COUNT] = [Self::Yellow, Self::White];

    pub const fn index(self) -> usize {
        self as usize
    }
}

impl TryFrom<u8> for LedChannel {
    type Error = Error;

    fn try_from(id: u8) -> Result<Self> {
        match id {
            0 => Ok(Self::Yellow),
            1 => Ok(Self::White),
            other => Err(Error::InvalidChannel(other)),
        }
    }
}

impl fmt::Display for LedChannel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(LED_INFO[self.index()].colour)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct LedInfo {
    pub gpio: i32,
    pub colour: &'static str,
    pub location: &'static str,
}

static LED_INFO: [LedInfo; LED_COUNT] = [
    LedInfo { gpio: pins::LED_YELLOW_GPIO, colour: "yellow", location: "roof" },
    LedInfo { gpio: pins::LED_WHITE_GPIO, colour: "white", location: "garden" },
];

struct Outputs<P> {
    pins: [P; LED_COUNT],
    on: [bool; LED_COUNT],
}

impl<P: OutputPin> Outputs<P> {
    fn write(&mut self, channel: LedChannel, on: bool) -> Result<()> {
        let pin = &mut self.pins[channel.index()];
        let written = if on { pin.set_high() } else { pin.set_low() };
        if written.is_err() {
            let gpio = LED_INFO[channel.index()].gpio;
            warn!("ActuatorSink[{}]: GPIO{} write failed", channel, gpio);
            return Err(DeviceError::GpioWriteFailed { gpio }.into());
        }
        self.on[channel.index()] = on;
        Ok(())
    }
}

pub struct ActuatorSink<P> {
    outputs: Mutex<Outputs<P>>,
    lock_timeout: Duration,
}

impl<P: OutputPin + Send> ActuatorSink<P> {
    /// Takes ownership of the pins (yellow, white) and drives both low.
    pub fn new(yellow: P, white: P, lock_timeout: Duration) -> Result<Self> {
        let mut outputs = Outputs { pins: [yellow, white], on: [false; LED_COUNT] };
        for channel in LedChannel::ALL {
            outputs.write(channel, false)?;
        }
        Ok(Self { outputs: Mutex::new(outputs), lock_timeout })
    }

    fn locked(&self, channel: LedChannel) -> Result<parking_lot::MutexGuard<'_, Outputs<P>>> {
        self.outputs.try_lock_for(self.lock_timeout).ok_or_else(|| {
            warn!("ActuatorSink[{}]: hardware lock timed out", channel);
            Error::AcquisitionTimeout(Resource::ActuatorHardware)
        })
    }

    pub fn on(&self, channel: LedChannel) -> Result<()> {
        self.locked(channel)?.write(channel, true)
    }

    pub fn off(&self, channel: LedChannel) -> Result<()> {
        self.locked(channel)?.write(channel, false)
    }

    /// Invert the output.  Returns the new state.
    pub fn toggle(&self, channel: LedChannel) -> Result<bool> {
        let mut outputs = self.locked(channel)?;
        let next = !outputs.on[channel.index()];
        outputs.write(channel, next)?;
        debug!("ActuatorSink[{}]: -> {}", channel, if next { "on" } else { "off" });
        Ok(next)
    }

    /// Cached state; the pin is not read back.
    pub fn state(&self, channel: LedChannel) -> Result<bool> {
        Ok(self.locked(channel)?.on[channel.index()])
    }

    /// Toggle every LED in one zero-wait lock attempt.
    ///
    /// `AcquisitionTimeout` when the lock is busy right now.  A failed pin
    /// write restores the LEDs already flipped this call, so the pair
    /// never drifts out of phase.
    fn toggle_all_nonblocking(&self, _cx: &NonBlocking) -> Result<[bool; LED_COUNT]> {
        let mut outputs = self
            .outputs
            .try_lock()
            .ok_or(Error::AcquisitionTimeout(Resource::ActuatorHardware))?;
        let before = outputs.on;
        for channel in LedChannel::ALL {
            if let Err(e) = outputs.write(channel, !before[channel.index()]) {
                for flipped in LedChannel::ALL.into_iter().take_while(|c| *c != channel) {
                    // A failed restore is logged by `write` and leaves the
                    // cached state matching the pin.
                    let _ = outputs.write(flipped, before[flipped.index()]);
                }
                return Err(e);
            }
        }
        Ok(outputs.on)
    }

    /// Zero-wait handle for soft-timer callbacks.
    pub fn toggler(self: &Arc<Self>) -> LedToggler<P> {
        LedToggler { sink: Arc::clone(self) }
    }

    pub fn info(&self, channel: LedChannel) -> &'static LedInfo {
        &LED_INFO[channel.index()]
    }
}

/// What a timer callback may do with the LEDs: flip both at once, never
/// waiting for the lock.
pub struct LedToggler<P> {
    sink: Arc<ActuatorSink<P>>,
}

impl<P: OutputPin + Send> LedToggler<P> {
    pub fn toggle_all(&self, cx: &NonBlocking) -> Result<[bool; LED_COUNT]> {
        self.sink.toggle_all_nonblocking(cx)
    }
}
