//! Acquisition task: the only producer.
//!
//! ```text
//!   Sampling(Light) ──▶ Sampling(Water) ──▶ Idle(period) ──┐
//!         ▲                                                 │
//!         └─────────────────────────────────────────────────┘
//! ```
//!
//! For each channel: read through the sensor source, write the store
//! (which raises the channel's readiness bit), then offer the reading to
//! the delivery queue with a short bound.  A full queue sheds the reading;
//! the producer never waits on its consumers for longer than that bound.
//! A failed read skips that channel only.

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::sync::Arc;

use log::{debug, info, warn};

use crate::app::ports::AnalogInput;
use crate::config::SystemConfig;
use crate::error::Result;
use crate::sensors::{SensorChannel, SensorSource};
use crate::shared::{ReadingQueue, ReadingStore, ReadyMask};
use crate::tasks::TaskMeter;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AcquisitionState {
    Sampling(SensorChannel),
    Idle(Duration),
}

impl AcquisitionState {
    pub fn next(self, period: Duration) -> Self {
        match self {
            Self::Sampling(SensorChannel::Light) => Self::Sampling(SensorChannel::Water),
            Self::Sampling(SensorChannel::Water) => Self::Idle(period),
            Self::Idle(_) => Self::Sampling(SensorChannel::Light),
        }
    }
}

#[derive(Debug, Default)]
pub struct AcquisitionCounters {
    pub cycles: AtomicU32,
    pub samples: AtomicU32,
    pub sample_failures: AtomicU32,
    pub store_failures: AtomicU32,
    pub queue_drops: AtomicU32,
}

pub struct AcquisitionTask<A: AnalogInput> {
    sensors: Arc<SensorSource<A>>,
    store: Arc<ReadingStore>,
    queue: Arc<ReadingQueue>,
    period: Duration,
    enqueue_timeout: Duration,
    state: AcquisitionState,
    counters: Arc<AcquisitionCounters>,
}

impl<A: AnalogInput> AcquisitionTask<A> {
    pub fn new(
        sensors: Arc<SensorSource<A>>,
        store: Arc<ReadingStore>,
        queue: Arc<ReadingQueue>,
        cfg: &SystemConfig,
    ) -> Self {
        Self {
            sensors,
            store,
            queue,
            period: cfg.sample_period(),
            enqueue_timeout: cfg.enqueue_timeout(),
            state: AcquisitionState::Sampling(SensorChannel::Light),
            counters: Arc::new(AcquisitionCounters::default()),
        }
    }

    pub fn counters(&self) -> Arc<AcquisitionCounters> {
        Arc::clone(&self.counters)
    }

    pub fn state(&self) -> AcquisitionState {
        self.state
    }

    /// Read, publish and enqueue one channel.
    fn sample(&self, channel: SensorChannel) -> Result<()> {
        let reading = self.sensors.read(channel).inspect_err(|e| {
            self.counters.sample_failures.fetch_add(1, Ordering::Relaxed);
            warn!("Acquisition[{}]: sample skipped: {}", channel, e);
        })?;
        self.counters.samples.fetch_add(1, Ordering::Relaxed);

        if let Err(e) =
            self.store.update(channel, reading.raw, reading.calibrated, reading.timestamp_ms)
        {
            self.counters.store_failures.fetch_add(1, Ordering::Relaxed);
            warn!("Acquisition[{}]: store update skipped: {}", channel, e);
        }

        if self.queue.send_timeout(reading, self.enqueue_timeout).is_err() {
            let dropped = self.counters.queue_drops.fetch_add(1, Ordering::Relaxed) + 1;
            warn!(
                "Acquisition[{}]: delivery queue full, reading dropped ({} total)",
                channel, dropped
            );
        }
        Ok(())
    }

    /// Run both sampling states and stop at `Idle`.  Returns the channels
    /// that produced a reading.
    pub fn cycle(&mut self) -> ReadyMask {
        if let AcquisitionState::Idle(_) = self.state {
            self.state = self.state.next(self.period);
        }
        let mut sampled = ReadyMask::NONE;
        while let AcquisitionState::Sampling(channel) = self.state {
            if self.sample(channel).is_ok() {
                sampled = sampled.union(ReadyMask::of(channel));
            }
            self.state = self.state.next(self.period);
        }
        let n = self.counters.cycles.fetch_add(1, Ordering::Relaxed) + 1;
        debug!("Acquisition: cycle {} sampled {}", n, sampled);
        sampled
    }

    /// Task body; never returns.
    pub fn run(mut self, meter: TaskMeter) {
        info!(
            "Acquisition: started (period={} ms, enqueue bound={} ms)",
            self.period.as_millis(),
            self.enqueue_timeout.as_millis()
        );
        loop {
            {
                let _busy = meter.busy();
                self.cycle();
            }
            if let AcquisitionState::Idle(period) = self.state {
                std::thread::sleep(period);
            }
        }
    }
}
