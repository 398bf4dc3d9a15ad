//! Geekhouse Firmware — Main Entry Point
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │  Adapters: Adc1 (AnalogInput) · LedPin · LogEventSink ·        │
//! │            FreeRtosProbe (SystemProbe)                         │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │  SensorSource · ActuatorSink · ReadingStore · ReadinessSignal  │
//! │  DeliveryQueue · TimerService                                  │
//! │                                                                │
//! │  acquisition(5) → display(4) · aggregation(4)                  │
//! │  timer-svc(3): blink · liveness(2)                             │
//! └───────────────────────────────────────────────────────────────┘
//! ```

use anyhow::{Context, Result};
use esp_idf_hal::gpio::{OutputPin as _, PinDriver};
use esp_idf_hal::peripherals::Peripherals;
use log::info;

use geekhouse::adapters::hardware::Adc1;
use geekhouse::adapters::log_sink::LogEventSink;
use geekhouse::adapters::probe::FreeRtosProbe;
use geekhouse::config::SystemConfig;
use geekhouse::{diagnostics, drivers, system};

fn main() -> Result<()> {
    // ── 1. ESP-IDF bootstrap ──────────────────────────────────
    esp_idf_svc::sys::link_patches();
    esp_idf_logger::init()?;

    info!("╔══════════════════════════════════════╗");
    info!("║  Geekhouse v{}                       ║", env!("CARGO_PKG_VERSION"));
    info!("╚══════════════════════════════════════╝");

    diagnostics::install_panic_handler();

    // ── 2. Peripherals ────────────────────────────────────────
    drivers::hw_init::init_adc().context("ADC init")?;
    let peripherals = Peripherals::take().context("peripherals already taken")?;
    let yellow = PinDriver::output(peripherals.pins.gpio2.downgrade_output())?;
    let white = PinDriver::output(peripherals.pins.gpio3.downgrade_output())?;

    // ── 3. Core ───────────────────────────────────────────────
    // No persisted configuration on this board; the network layer may
    // adjust calibrations at runtime.
    let config = SystemConfig::default();
    let core = system::start(config, Adc1::new(), yellow, white, LogEventSink::new(), |_| {
        FreeRtosProbe::new()
    })?;
    info!("Geekhouse: core up, {} tasks", core.registry.len());

    // The tasks never return; park main for the lifetime of the process.
    for handle in core.threads {
        let _ = handle.join();
    }
    Ok(())
}
