//! Hardware adapter: bridges the board's peripherals to the core's ports.
//!
//! [`Adc1`] implements [`AnalogInput`] over the oneshot ADC; [`LedPin`] is
//! the concrete `OutputPin` the actuator sink drives.  On non-espidf
//! targets both are simulation stubs whose values can be injected, so the
//! full task graph runs on the host.

use crate::app::ports::AnalogInput;
use crate::error::DeviceError;
use crate::sensors::SensorChannel;

#[cfg(not(target_os = "espidf"))]
use core::sync::atomic::{AtomicBool, AtomicU16, Ordering};

// ── Simulation injection points ───────────────────────────────

#[cfg(not(target_os = "espidf"))]
static SIM_ADC: [AtomicU16; 2] = [AtomicU16::new(0), AtomicU16::new(0)];
#[cfg(not(target_os = "espidf"))]
static SIM_ADC_FAULT: [AtomicBool; 2] = [AtomicBool::new(false), AtomicBool::new(false)];

#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc(channel: SensorChannel, raw: u16) {
    SIM_ADC[channel.index()].store(raw, Ordering::Relaxed);
}

/// Make every conversion on `channel` fail until cleared.
#[cfg(not(target_os = "espidf"))]
pub fn sim_set_adc_fault(channel: SensorChannel, failing: bool) {
    SIM_ADC_FAULT[channel.index()].store(failing, Ordering::Relaxed);
}

// ── ADC1 ──────────────────────────────────────────────────────

/// Oneshot ADC1 unit.  Construct after `hw_init::init_adc()` succeeded.
pub struct Adc1 {
    _private: (),
}

impl Default for Adc1 {
    fn default() -> Self {
        Self::new()
    }
}

impl Adc1 {
    pub fn new() -> Self {
        Self { _private: () }
    }

    #[cfg(target_os = "espidf")]
    fn adc_channel(channel: SensorChannel) -> u32 {
        match channel {
            SensorChannel::Light => crate::pins::LIGHT_ADC_CHANNEL,
            SensorChannel::Water => crate::pins::WATER_ADC_CHANNEL,
        }
    }
}

impl AnalogInput for Adc1 {
    #[cfg(target_os = "espidf")]
    fn sample(&mut self, channel: SensorChannel) -> Result<u16, DeviceError> {
        crate::drivers::hw_init::adc1_read(Self::adc_channel(channel))
            .map_err(|code| DeviceError::AdcReadFailed { channel, code })
    }

    #[cfg(not(target_os = "espidf"))]
    fn sample(&mut self, channel: SensorChannel) -> Result<u16, DeviceError> {
        if SIM_ADC_FAULT[channel.index()].load(Ordering::Relaxed) {
            // ESP_ERR_TIMEOUT
            return Err(DeviceError::AdcReadFailed { channel, code: 0x107 });
        }
        Ok(SIM_ADC[channel.index()].load(Ordering::Relaxed))
    }
}

// ── LED output pins ───────────────────────────────────────────

/// Push-pull GPIO driving one indicator LED.
#[cfg(target_os = "espidf")]
pub type LedPin =
    esp_idf_hal::gpio::PinDriver<'static, esp_idf_hal::gpio::AnyOutputPin, esp_idf_hal::gpio::Output>;

/// Simulated output pin.  Tracks the level in memory only.
#[cfg(not(target_os = "espidf"))]
#[derive(Debug)]
pub struct LedPin {
    gpio: i32,
    high: bool,
}

#[cfg(not(target_os = "espidf"))]
impl LedPin {
    pub fn new(gpio: i32) -> Self {
        Self { gpio, high: false }
    }

    pub fn gpio(&self) -> i32 {
        self.gpio
    }

    pub fn is_set_high(&self) -> bool {
        self.high
    }
}

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::digital::ErrorType for LedPin {
    type Error = core::convert::Infallible;
}

#[cfg(not(target_os = "espidf"))]
impl embedded_hal::digital::OutputPin for LedPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.high = false;
        Ok(())
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.high = true;
        Ok(())
    }
}
