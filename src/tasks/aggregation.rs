//! Aggregation task: rolling statistics over jointly fresh samples.
//!
//! Each round waits (bounded) until *both* channels have reported since
//! the last round.  A full match folds the store snapshot into the rolling
//! statistics; a timeout records which channel stalled and leaves the
//! statistics alone, so only joint samples count toward the window.
//! Every `window` accepted samples a summary is emitted and the
//! accumulators reset.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::sync::Arc;

use log::{debug, info, warn};
use serde::Serialize;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::config::SystemConfig;
use crate::pins::ADC_MAX;
use crate::sensors::{SENSOR_COUNT, SensorChannel};
use crate::shared::{ReadinessSignal, ReadingStore, ReadyMask, ReadyResult, SharedSnapshot};
use crate::tasks::TaskMeter;

// ═══════════════════════════════════════════════════════════════
//  Rolling statistics
// ═══════════════════════════════════════════════════════════════

/// Min / max / sum / count of raw samples for one channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RollingStatistics {
    min: u16,
    max: u16,
    sum: u32,
    count: u16,
}

impl Default for RollingStatistics {
    fn default() -> Self {
        Self::new()
    }
}

impl RollingStatistics {
    pub const fn new() -> Self {
        Self { min: ADC_MAX, max: 0, sum: 0, count: 0 }
    }

    pub fn push(&mut self, raw: u16) {
        self.min = self.min.min(raw);
        self.max = self.max.max(raw);
        self.sum = self.sum.saturating_add(u32::from(raw));
        self.count = self.count.saturating_add(1);
    }

    pub fn reset(&mut self) {
        *self = Self::new();
    }

    pub fn count(&self) -> u16 {
        self.count
    }

    pub fn summary(&self, channel: SensorChannel) -> Option<ChannelSummary> {
        if self.count == 0 {
            return None;
        }
        Some(ChannelSummary {
            channel,
            min: self.min,
            max: self.max,
            avg: self.sum as f32 / f32::from(self.count),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ChannelSummary {
    pub channel: SensorChannel,
    pub min: u16,
    pub max: u16,
    pub avg: f32,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct StatsSummary {
    /// Samples the summary covers.
    pub window: u16,
    pub light: ChannelSummary,
    pub water: ChannelSummary,
}

// ═══════════════════════════════════════════════════════════════
//  Task
// ═══════════════════════════════════════════════════════════════

#[derive(Debug, Default)]
pub struct AggregationCounters {
    pub accepted: AtomicU32,
    pub summaries: AtomicU32,
    /// Timed-out rounds per missing channel, indexed by `SensorChannel`.
    pub missed: [AtomicU32; SENSOR_COUNT],
    pub store_unavailable: AtomicU32,
}

/// What one round produced.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum RoundOutcome {
    /// Sample folded in; `count` so far in this window.
    Accepted { count: u16 },
    /// Sample folded in and the window closed.
    Summary(StatsSummary),
    /// The wait expired; these channels never reported.
    Missing(ReadyMask),
    /// Both channels reported but the store could not be read.
    StoreUnavailable,
}

pub struct Aggregator<S: EventSink> {
    store: Arc<ReadingStore>,
    readiness: Arc<ReadinessSignal>,
    sink: S,
    window: u16,
    timeout: Duration,
    stats: [RollingStatistics; SENSOR_COUNT],
    counters: Arc<AggregationCounters>,
}

impl<S: EventSink> Aggregator<S> {
    pub fn new(store: Arc<ReadingStore>, sink: S, cfg: &SystemConfig) -> Self {
        let readiness = Arc::clone(store.readiness());
        Self {
            store,
            readiness,
            sink,
            window: cfg.stats_window.max(1),
            timeout: cfg.readiness_timeout(),
            stats: [RollingStatistics::new(); SENSOR_COUNT],
            counters: Arc::new(AggregationCounters::default()),
        }
    }

    pub fn counters(&self) -> Arc<AggregationCounters> {
        Arc::clone(&self.counters)
    }

    /// Samples accepted in the current window.
    pub fn pending(&self) -> u16 {
        self.stats[SensorChannel::Light.index()].count()
    }

    /// One full round: wait, then handle the result.
    pub fn round(&mut self) -> RoundOutcome {
        let ready = self.readiness.wait_all(ReadyMask::BOTH, self.timeout);
        self.handle(ready)
    }

    fn handle(&mut self, ready: ReadyResult) -> RoundOutcome {
        match ready {
            ReadyResult::Ready(_) => match self.store.snapshot() {
                Ok(snap) => self.accept(&snap),
                Err(e) => {
                    self.counters.store_unavailable.fetch_add(1, Ordering::Relaxed);
                    warn!("Aggregation: snapshot unavailable, sample skipped: {}", e);
                    RoundOutcome::StoreUnavailable
                }
            },
            ReadyResult::TimedOut { observed, missing } => {
                let waited_ms = self.timeout.as_millis() as u32;
                for channel in missing.channels() {
                    self.counters.missed[channel.index()].fetch_add(1, Ordering::Relaxed);
                    warn!(
                        "Aggregation: no fresh {} reading within {} ms (seen: {})",
                        channel, waited_ms, observed
                    );
                    self.sink.emit(&AppEvent::ChannelStalled { channel, waited_ms });
                }
                RoundOutcome::Missing(missing)
            }
        }
    }

    fn accept(&mut self, snap: &SharedSnapshot) -> RoundOutcome {
        self.stats[SensorChannel::Light.index()].push(snap.light_raw);
        self.stats[SensorChannel::Water.index()].push(snap.water_raw);
        self.counters.accepted.fetch_add(1, Ordering::Relaxed);

        let count = self.pending();
        debug!(
            "Aggregation: sample {}/{} light={} water={}",
            count, self.window, snap.light_raw, snap.water_raw
        );
        if count < self.window {
            return RoundOutcome::Accepted { count };
        }

        let light = self.stats[SensorChannel::Light.index()].summary(SensorChannel::Light);
        let water = self.stats[SensorChannel::Water.index()].summary(SensorChannel::Water);
        for s in &mut self.stats {
            s.reset();
        }
        match (light, water) {
            (Some(light), Some(water)) => {
                let summary = StatsSummary { window: count, light, water };
                self.counters.summaries.fetch_add(1, Ordering::Relaxed);
                self.sink.emit(&AppEvent::Summary(summary));
                RoundOutcome::Summary(summary)
            }
            // Both accumulators are fed together, so neither is empty here.
            _ => RoundOutcome::Accepted { count: 0 },
        }
    }

    /// Task body; never returns.
    pub fn run(mut self, meter: TaskMeter) {
        info!(
            "Aggregation: started (window={}, wait bound={} ms)",
            self.window,
            self.timeout.as_millis()
        );
        loop {
            let ready = self.readiness.wait_all(ReadyMask::BOTH, self.timeout);
            let _busy = meter.busy();
            self.handle(ready);
        }
    }
}
