//! Per-channel freshness flags with AND / OR waits.
//!
//! A typed stand-in for a FreeRTOS event group: one bit per sensor
//! channel behind a mutex, plus a condition variable that every `set`
//! broadcasts on.  A waiter that starts after `set` returns always sees
//! the bit, because both sides go through the same mutex.
//!
//! Bits are consumed only by a *successful* wait.  A timed-out wait leaves
//! whatever it observed in place and reports which requested channels
//! never arrived.

use core::fmt;
use core::time::Duration;
use std::time::Instant;

use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::sensors::SensorChannel;

// ── Mask ──────────────────────────────────────────────────────

/// Set of sensor channels, one bit each.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct ReadyMask(u8);

impl ReadyMask {
    pub const NONE: Self = Self(0);
    pub const LIGHT: Self = Self(1 << SensorChannel::Light as u8);
    pub const WATER: Self = Self(1 << SensorChannel::Water as u8);
    pub const BOTH: Self = Self(Self::LIGHT.0 | Self::WATER.0);

    pub const fn of(channel: SensorChannel) -> Self {
        Self(1 << channel as u8)
    }

    pub const fn bits(self) -> u8 {
        self.0
    }

    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }

    pub const fn contains(self, other: Self) -> bool {
        self.0 & other.0 == other.0
    }

    pub const fn union(self, other: Self) -> Self {
        Self(self.0 | other.0)
    }

    pub const fn intersection(self, other: Self) -> Self {
        Self(self.0 & other.0)
    }

    pub const fn difference(self, other: Self) -> Self {
        Self(self.0 & !other.0)
    }

    /// Channels in this mask, in sampling order.
    pub fn channels(self) -> impl Iterator<Item = SensorChannel> {
        SensorChannel::ALL.into_iter().filter(move |c| self.contains(Self::of(*c)))
    }
}

impl fmt::Display for ReadyMask {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "none");
        }
        let mut first = true;
        for channel in self.channels() {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{channel}")?;
            first = false;
        }
        Ok(())
    }
}

// ── Wait outcome ──────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WaitMode {
    /// Every requested bit must be set.
    All,
    /// At least one requested bit must be set.
    Any,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadyResult {
    /// The condition held; `observed` bits have been cleared.
    Ready(ReadyMask),
    /// The bound elapsed first.  `observed` is what was set among the
    /// requested bits, `missing` the rest.  Nothing was cleared.
    TimedOut { observed: ReadyMask, missing: ReadyMask },
}

impl ReadyResult {
    pub fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }

    pub fn observed(&self) -> ReadyMask {
        match *self {
            Self::Ready(observed) | Self::TimedOut { observed, .. } => observed,
        }
    }

    pub fn into_result(self) -> Result<ReadyMask> {
        match self {
            Self::Ready(observed) => Ok(observed),
            Self::TimedOut { missing, .. } => Err(Error::ReadinessTimeout { missing: missing.bits() }),
        }
    }
}

// ── Signal ────────────────────────────────────────────────────

#[derive(Default)]
pub struct ReadinessSignal {
    bits: Mutex<ReadyMask>,
    changed: Condvar,
}

impl ReadinessSignal {
    pub fn new() -> Self {
        Self::default()
    }

    /// Raise `mask` and wake every waiter.
    pub fn set(&self, mask: ReadyMask) {
        let mut bits = self.bits.lock();
        *bits = bits.union(mask);
        self.changed.notify_all();
    }

    /// Bits currently raised.  Does not consume them.
    pub fn peek(&self) -> ReadyMask {
        *self.bits.lock()
    }

    pub fn wait_all(&self, mask: ReadyMask, timeout: Duration) -> ReadyResult {
        self.wait_ready(mask, WaitMode::All, timeout)
    }

    pub fn wait_any(&self, mask: ReadyMask, timeout: Duration) -> ReadyResult {
        self.wait_ready(mask, WaitMode::Any, timeout)
    }

    /// Block until `mask` is satisfied under `mode` or `timeout` elapses.
    ///
    /// An empty mask is satisfied immediately.
    pub fn wait_ready(&self, mask: ReadyMask, mode: WaitMode, timeout: Duration) -> ReadyResult {
        let deadline = Instant::now().checked_add(timeout);
        let mut bits = self.bits.lock();
        loop {
            let observed = bits.intersection(mask);
            let satisfied = match mode {
                WaitMode::All => observed == mask,
                WaitMode::Any => !observed.is_empty() || mask.is_empty(),
            };
            if satisfied {
                *bits = bits.difference(observed);
                return ReadyResult::Ready(observed);
            }

            let timed_out = match deadline {
                Some(deadline) => self.changed.wait_until(&mut bits, deadline).timed_out(),
                // Timeout too large to represent: wait without a bound.
                None => {
                    self.changed.wait(&mut bits);
                    false
                }
            };
            if timed_out {
                let observed = bits.intersection(mask);
                if mode == WaitMode::All && observed == mask {
                    continue;
                }
                if mode == WaitMode::Any && !observed.is_empty() {
                    continue;
                }
                return ReadyResult::TimedOut { observed, missing: mask.difference(observed) };
            }
        }
    }
}
