//! One-shot ADC initialisation and raw conversion helpers.
//!
//! Configures ADC1 in oneshot mode for both sensor channels using raw
//! ESP-IDF sys calls.  Called once from `main()` before any task starts;
//! failure here aborts start-up.  LED outputs are driven through
//! `esp_idf_hal` pin drivers and need no set-up here.

#[cfg(target_os = "espidf")]
use esp_idf_svc::sys::*;

// ── Error type ────────────────────────────────────────────────

/// Errors during one-shot peripheral initialization.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HwInitError {
    AdcUnitFailed(i32),
    AdcChannelFailed { channel: u32, rc: i32 },
}

impl core::fmt::Display for HwInitError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::AdcUnitFailed(rc) => write!(f, "ADC1 unit init failed (rc={})", rc),
            Self::AdcChannelFailed { channel, rc } => {
                write!(f, "ADC1 channel {} config failed (rc={})", channel, rc)
            }
        }
    }
}

impl core::error::Error for HwInitError {}

#[cfg(target_os = "espidf")]
use log::info;

use crate::pins;

// ── ADC (oneshot) ─────────────────────────────────────────────

#[cfg(target_os = "espidf")]
static mut ADC1_HANDLE: adc_oneshot_unit_handle_t = core::ptr::null_mut();

/// SAFETY: ADC1_HANDLE is written once by `init_adc()` before any task is
/// spawned; afterwards it is only read.  Conversions are serialised by the
/// `SensorSource` hardware mutex.
#[cfg(target_os = "espidf")]
unsafe fn adc1_handle() -> adc_oneshot_unit_handle_t {
    unsafe { ADC1_HANDLE }
}

#[cfg(target_os = "espidf")]
pub fn init_adc() -> Result<(), HwInitError> {
    let init_cfg = adc_oneshot_unit_init_cfg_t {
        unit_id: adc_unit_t_ADC_UNIT_1,
        ulp_mode: adc_ulp_mode_t_ADC_ULP_MODE_DISABLE,
        ..Default::default()
    };
    // SAFETY: single-threaded boot path; ADC1_HANDLE is only written here.
    let ret = unsafe { adc_oneshot_new_unit(&init_cfg, &raw mut ADC1_HANDLE) };
    if ret != ESP_OK as i32 {
        return Err(HwInitError::AdcUnitFailed(ret));
    }

    let chan_cfg = adc_oneshot_chan_cfg_t {
        atten: adc_atten_t_ADC_ATTEN_DB_12,
        bitwidth: adc_bitwidth_t_ADC_BITWIDTH_12,
    };

    for channel in [pins::LIGHT_ADC_CHANNEL, pins::WATER_ADC_CHANNEL] {
        let ret = unsafe { adc_oneshot_config_channel(adc1_handle(), channel, &chan_cfg) };
        if ret != ESP_OK as i32 {
            return Err(HwInitError::AdcChannelFailed { channel, rc: ret });
        }
    }

    info!(
        "hw_init: ADC1 configured (CH{}=light, CH{}=water, 12-bit, 0-3.3V)",
        pins::LIGHT_ADC_CHANNEL,
        pins::WATER_ADC_CHANNEL
    );
    Ok(())
}

#[cfg(not(target_os = "espidf"))]
pub fn init_adc() -> Result<(), HwInitError> {
    log::info!(
        "hw_init(sim): ADC1 CH{}/CH{} simulated",
        pins::LIGHT_ADC_CHANNEL,
        pins::WATER_ADC_CHANNEL
    );
    Ok(())
}

/// One blocking conversion.  Returns the ESP-IDF error code on failure.
#[cfg(target_os = "espidf")]
pub fn adc1_read(channel: u32) -> Result<u16, i32> {
    let mut raw: i32 = 0;
    // SAFETY: adc1_handle() contract: handle initialised at boot, callers
    // hold the SensorSource hardware lock.
    let ret = unsafe { adc_oneshot_read(adc1_handle(), channel, &mut raw) };
    if ret != ESP_OK as i32 {
        return Err(ret);
    }
    Ok(raw.max(0) as u16)
}
