//! Adaptive blink timer.
//!
//! Runs as a soft-timer callback, not a task.  Each tick toggles both LEDs
//! and picks the next blink period from the latest water reading:
//!
//! ```text
//!   water_raw > high  → fast
//!   water_raw < low   → slow
//!   otherwise         → keep the current period
//! ```
//!
//! The controller only holds a [`LedToggler`] and a [`WaterReader`], so
//! both the toggle and the read are zero-wait by construction.  A busy
//! lock skips that part of the tick and the next tick tries again.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::sync::Arc;

use embedded_hal::digital::OutputPin;
use log::{debug, info, warn};

use crate::config::SystemConfig;
use crate::drivers::actuators::LedToggler;
use crate::drivers::soft_timer::{TimerCallback, TimerContext};
use crate::error::Error;
use crate::shared::WaterReader;

/// Two-threshold period selector.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hysteresis {
    pub high: u16,
    pub low: u16,
    pub fast: Duration,
    pub slow: Duration,
}

impl Hysteresis {
    pub fn from_config(cfg: &SystemConfig) -> Self {
        Self {
            high: cfg.water_high_threshold,
            low: cfg.water_low_threshold,
            fast: Duration::from_millis(u64::from(cfg.blink_fast_ms)),
            slow: Duration::from_millis(u64::from(cfg.blink_slow_ms)),
        }
    }

    pub fn next_period(&self, current: Duration, water_raw: u16) -> Duration {
        if water_raw > self.high {
            self.fast
        } else if water_raw < self.low {
            self.slow
        } else {
            current
        }
    }
}

/// Counters shared with whoever wants to observe the timer.
#[derive(Debug, Default)]
pub struct BlinkStats {
    pub ticks: AtomicU32,
    /// Ticks whose toggle found the actuator lock busy.
    pub toggle_skips: AtomicU32,
    /// Ticks whose toggle hit a pin write error (LEDs left as they were).
    pub toggle_failures: AtomicU32,
    pub read_skips: AtomicU32,
    pub period_changes: AtomicU32,
}

pub struct BlinkController<P> {
    leds: LedToggler<P>,
    water: WaterReader,
    hysteresis: Hysteresis,
    stats: Arc<BlinkStats>,
}

impl<P: OutputPin + Send + 'static> BlinkController<P> {
    pub fn new(leds: LedToggler<P>, water: WaterReader, hysteresis: Hysteresis) -> Self {
        Self { leds, water, hysteresis, stats: Arc::new(BlinkStats::default()) }
    }

    pub fn stats(&self) -> Arc<BlinkStats> {
        Arc::clone(&self.stats)
    }

    /// Period the timer should be armed with.
    pub fn initial_period(&self) -> Duration {
        self.hysteresis.slow
    }

    pub fn on_tick(&mut self, cx: &mut TimerContext) {
        self.stats.ticks.fetch_add(1, Ordering::Relaxed);

        match self.leds.toggle_all(cx.non_blocking()) {
            Ok(_) => {}
            Err(Error::AcquisitionTimeout(_)) => {
                self.stats.toggle_skips.fetch_add(1, Ordering::Relaxed);
                debug!("Blink: actuator lock busy, toggle skipped");
            }
            Err(e) => {
                self.stats.toggle_failures.fetch_add(1, Ordering::Relaxed);
                warn!("Blink: toggle failed, LEDs unchanged: {}", e);
            }
        }

        let Some(water_raw) = self.water.try_raw(cx.non_blocking()) else {
            self.stats.read_skips.fetch_add(1, Ordering::Relaxed);
            debug!("Blink: store busy, period unchanged");
            return;
        };

        let current = cx.period();
        let next = self.hysteresis.next_period(current, water_raw);
        if next != current {
            self.stats.period_changes.fetch_add(1, Ordering::Relaxed);
            info!(
                "Blink: water={} -> period {} ms",
                water_raw,
                next.as_millis()
            );
            cx.set_period(next);
        }
    }

    pub fn into_callback(mut self) -> TimerCallback {
        Box::new(move |cx| self.on_tick(cx))
    }
}
