//! Shared reading store: the one current snapshot of both channels.
//!
//! A single record behind a single mutex.  The acquisition task is the
//! only writer; the aggregation task, the actuation timer and external
//! collaborators read copies.  Writes happen at record granularity, so a
//! reader never sees a channel's raw value paired with a calibrated value
//! from a different update.
//!
//! [`ReadingStore::update`] sets the channel's readiness bit *after* the
//! lock is released: a waiter released by that bit is guaranteed the
//! write already happened.

use core::time::Duration;
use std::sync::Arc;

use log::warn;
use parking_lot::Mutex;
use serde::Serialize;

use super::NonBlocking;
use super::readiness::{ReadinessSignal, ReadyMask};
use crate::error::{Error, Resource, Result};
use crate::sensors::SensorChannel;

/// Copy of the store's contents.  All zero until the first update.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize)]
pub struct SharedSnapshot {
    pub light_raw: u16,
    pub light_calibrated: f32,
    pub water_raw: u16,
    pub water_calibrated: f32,
    pub last_update_ms: u32,
}

pub struct ReadingStore {
    snapshot: Mutex<SharedSnapshot>,
    readiness: Arc<ReadinessSignal>,
    lock_timeout: Duration,
}

impl ReadingStore {
    pub fn new(readiness: Arc<ReadinessSignal>, lock_timeout: Duration) -> Self {
        Self {
            snapshot: Mutex::new(SharedSnapshot::default()),
            readiness,
            lock_timeout,
        }
    }

    /// Record the latest value for `channel`, then mark it ready.
    pub fn update(
        &self,
        channel: SensorChannel,
        raw: u16,
        calibrated: f32,
        timestamp_ms: u32,
    ) -> Result<()> {
        {
            let Some(mut snap) = self.snapshot.try_lock_for(self.lock_timeout) else {
                warn!("ReadingStore[{}]: lock timed out, update skipped", channel);
                return Err(Error::AcquisitionTimeout(Resource::ReadingStore));
            };
            match channel {
                SensorChannel::Light => {
                    snap.light_raw = raw;
                    snap.light_calibrated = calibrated;
                }
                SensorChannel::Water => {
                    snap.water_raw = raw;
                    snap.water_calibrated = calibrated;
                }
            }
            snap.last_update_ms = timestamp_ms;
        }
        self.readiness.set(ReadyMask::of(channel));
        Ok(())
    }

    /// Copy of the whole record.  Fails with
    /// `AcquisitionTimeout(ReadingStore)` rather than blocking past the
    /// lock bound.
    pub fn snapshot(&self) -> Result<SharedSnapshot> {
        self.snapshot
            .try_lock_for(self.lock_timeout)
            .map(|snap| *snap)
            .ok_or(Error::AcquisitionTimeout(Resource::ReadingStore))
    }

    /// Zero-wait read of the water channel's raw value.  `None` if the
    /// lock is held right now.
    fn try_water_raw(&self, _cx: &NonBlocking) -> Option<u16> {
        self.snapshot.try_lock().map(|snap| snap.water_raw)
    }

    /// Zero-wait handle for soft-timer callbacks.
    pub fn water_reader(self: &Arc<Self>) -> WaterReader {
        WaterReader { store: Arc::clone(self) }
    }

    /// Hold the record lock, as a slow reader would.
    #[cfg(test)]
    pub(crate) fn hold(&self) -> parking_lot::MutexGuard<'_, SharedSnapshot> {
        self.snapshot.lock()
    }

    /// The readiness signal this store publishes to.
    pub fn readiness(&self) -> &Arc<ReadinessSignal> {
        &self.readiness
    }
}

/// What a timer callback may read from the store: the latest water
/// value, without waiting for the lock.
pub struct WaterReader {
    store: Arc<ReadingStore>,
}

impl WaterReader {
    pub fn try_raw(&self, cx: &NonBlocking) -> Option<u16> {
        self.store.try_water_raw(cx)
    }
}
