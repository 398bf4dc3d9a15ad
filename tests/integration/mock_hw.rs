//! Mock adapters for integration tests.
//!
//! Every mock is `Clone` over shared state, so a test keeps one handle to
//! steer or inspect while the core owns the other.

use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use embedded_hal::digital::ErrorKind;
use geekhouse::app::events::AppEvent;
use geekhouse::app::ports::{AnalogInput, EventSink, SystemProbe};
use geekhouse::diagnostics::{HeapStats, SystemSample, TaskSample, task_name};
use geekhouse::error::DeviceError;
use geekhouse::sensors::{SensorChannel, SensorReading};
use geekhouse::tasks::aggregation::StatsSummary;

// ── MockAdc ───────────────────────────────────────────────────

#[derive(Debug, Default)]
struct AdcState {
    values: [u16; 2],
    failing: [bool; 2],
    delay: Duration,
}

#[derive(Debug, Clone, Default)]
pub struct MockAdc {
    state: Arc<Mutex<AdcState>>,
    conversions: Arc<AtomicU32>,
}

#[allow(dead_code)]
impl MockAdc {
    pub fn new(light: u16, water: u16) -> Self {
        let adc = Self::default();
        adc.set(SensorChannel::Light, light);
        adc.set(SensorChannel::Water, water);
        adc
    }

    pub fn set(&self, channel: SensorChannel, raw: u16) {
        self.state.lock().unwrap().values[channel.index()] = raw;
    }

    pub fn fail(&self, channel: SensorChannel, failing: bool) {
        self.state.lock().unwrap().failing[channel.index()] = failing;
    }

    /// Every conversion sleeps this long, holding the sensor lock.
    pub fn set_delay(&self, delay: Duration) {
        self.state.lock().unwrap().delay = delay;
    }

    pub fn conversions(&self) -> u32 {
        self.conversions.load(Ordering::Relaxed)
    }
}

impl AnalogInput for MockAdc {
    fn sample(&mut self, channel: SensorChannel) -> Result<u16, DeviceError> {
        let (value, failing, delay) = {
            let s = self.state.lock().unwrap();
            (s.values[channel.index()], s.failing[channel.index()], s.delay)
        };
        if !delay.is_zero() {
            std::thread::sleep(delay);
        }
        self.conversions.fetch_add(1, Ordering::Relaxed);
        if failing {
            return Err(DeviceError::AdcReadFailed { channel, code: -1 });
        }
        Ok(value)
    }
}

// ── MockPin ───────────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct MockPin {
    high: Arc<AtomicBool>,
    writes: Arc<AtomicU32>,
    failing: Arc<AtomicBool>,
}

#[allow(dead_code)]
impl MockPin {
    pub fn is_high(&self) -> bool {
        self.high.load(Ordering::Relaxed)
    }

    pub fn writes(&self) -> u32 {
        self.writes.load(Ordering::Relaxed)
    }

    /// Make every write fail (level unchanged) until cleared.
    pub fn set_failing(&self, failing: bool) {
        self.failing.store(failing, Ordering::Relaxed);
    }

    fn drive(&self, high: bool) -> Result<(), ErrorKind> {
        if self.failing.load(Ordering::Relaxed) {
            return Err(ErrorKind::Other);
        }
        self.high.store(high, Ordering::Relaxed);
        self.writes.fetch_add(1, Ordering::Relaxed);
        Ok(())
    }
}

impl embedded_hal::digital::ErrorType for MockPin {
    type Error = ErrorKind;
}

impl embedded_hal::digital::OutputPin for MockPin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

// ── RecordingSink ─────────────────────────────────────────────

#[derive(Debug, Clone, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<AppEvent>>>,
}

#[allow(dead_code)]
impl RecordingSink {
    pub fn events(&self) -> Vec<AppEvent> {
        self.events.lock().unwrap().clone()
    }

    pub fn readings(&self) -> Vec<SensorReading> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Reading { reading, .. } => Some(reading),
                _ => None,
            })
            .collect()
    }

    pub fn summaries(&self) -> Vec<StatsSummary> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::Summary(s) => Some(s),
                _ => None,
            })
            .collect()
    }

    pub fn stalls(&self) -> Vec<SensorChannel> {
        self.events()
            .into_iter()
            .filter_map(|e| match e {
                AppEvent::ChannelStalled { channel, .. } => Some(channel),
                _ => None,
            })
            .collect()
    }

    pub fn liveness_reports(&self) -> usize {
        self.events().iter().filter(|e| matches!(e, AppEvent::Liveness(_))).count()
    }
}

impl EventSink for RecordingSink {
    fn emit(&mut self, event: &AppEvent) {
        self.events.lock().unwrap().push(event.clone());
    }
}

// ── MockProbe ─────────────────────────────────────────────────

/// Two tasks, one of them nearly out of stack.
pub struct MockProbe;

impl SystemProbe for MockProbe {
    fn sample(&self) -> SystemSample {
        let mut s = SystemSample {
            total_runtime: 1_000,
            heap: HeapStats { free_bytes: 150_000, min_free_bytes: 120_000 },
            ..Default::default()
        };
        s.tasks
            .push(TaskSample {
                name: task_name("acquisition"),
                priority: 5,
                stack_high_water_bytes: 2048,
                runtime: 100,
            })
            .unwrap();
        s.tasks
            .push(TaskSample {
                name: task_name("display"),
                priority: 4,
                stack_high_water_bytes: 256,
                runtime: 50,
            })
            .unwrap();
        s
    }
}

/// Poll `cond` until it holds or `within` elapses.
pub fn eventually(within: Duration, mut cond: impl FnMut() -> bool) -> bool {
    let deadline = std::time::Instant::now() + within;
    while std::time::Instant::now() < deadline {
        if cond() {
            return true;
        }
        std::thread::sleep(Duration::from_millis(5));
    }
    cond()
}
