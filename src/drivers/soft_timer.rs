//! Software timer service.
//!
//! One service thread runs every periodic callback, the way the FreeRTOS
//! timer daemon does: callbacks share that context, so each must finish
//! quickly and never block.  The only handle a callback gets is a
//! [`TimerContext`], which carries the [`NonBlocking`] capability and lets
//! the callback change its own period in place.
//!
//! Callbacks run with the service's timer table locked.  They must not
//! call back into the [`TimerService`].

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::time::Instant;

use log::{debug, info, warn};
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::shared::NonBlocking;
use crate::tasks::TaskMeter;

/// Upper bound on concurrently armed timers.
pub const MAX_TIMERS: usize = 4;

/// A callback running longer than this delays every other timer.
pub const CALLBACK_BUDGET: Duration = Duration::from_millis(5);

pub type TimerCallback = Box<dyn FnMut(&mut TimerContext) + Send>;

/// What a running callback may touch.
pub struct TimerContext {
    period: Duration,
    non_blocking: NonBlocking,
}

impl TimerContext {
    pub fn period(&self) -> Duration {
        self.period
    }

    /// Reschedule this timer; takes effect from the current tick.
    pub fn set_period(&mut self, period: Duration) {
        self.period = period;
    }

    pub fn non_blocking(&self) -> &NonBlocking {
        &self.non_blocking
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimerId(u32);

struct SoftTimer {
    id: TimerId,
    name: &'static str,
    period: Duration,
    next_due: Instant,
    callback: TimerCallback,
}

pub struct TimerService {
    timers: Mutex<heapless::Vec<SoftTimer, MAX_TIMERS>>,
    changed: Condvar,
    next_id: AtomicU32,
    overruns: AtomicU32,
}

impl Default for TimerService {
    fn default() -> Self {
        Self::new()
    }
}

impl TimerService {
    pub fn new() -> Self {
        Self {
            timers: Mutex::new(heapless::Vec::new()),
            changed: Condvar::new(),
            next_id: AtomicU32::new(0),
            overruns: AtomicU32::new(0),
        }
    }

    /// Arm a periodic timer.  The first expiry is one `period` from now.
    pub fn add(
        &self,
        name: &'static str,
        period: Duration,
        callback: TimerCallback,
    ) -> Result<TimerId> {
        if period.is_zero() {
            return Err(Error::Init("timer period must be non-zero"));
        }
        let id = TimerId(self.next_id.fetch_add(1, Ordering::Relaxed));
        let timer = SoftTimer { id, name, period, next_due: Instant::now() + period, callback };
        let mut timers = self.timers.lock();
        if timers.push(timer).is_err() {
            return Err(Error::Init("timer table full"));
        }
        drop(timers);
        self.changed.notify_all();
        info!("TimerService: '{}' armed ({} ms)", name, period.as_millis());
        Ok(id)
    }

    /// Current period of `id`, if armed.
    pub fn period(&self, id: TimerId) -> Option<Duration> {
        self.timers.lock().iter().find(|t| t.id == id).map(|t| t.period)
    }

    /// Callbacks that exceeded [`CALLBACK_BUDGET`] since start-up.
    pub fn overruns(&self) -> u32 {
        self.overruns.load(Ordering::Relaxed)
    }

    /// Fire every timer whose deadline has passed.  Returns how many ran.
    pub fn fire_due(&self) -> usize {
        let mut timers = self.timers.lock();
        let now = Instant::now();
        let mut fired = 0;
        for timer in timers.iter_mut().filter(|t| t.next_due <= now) {
            self.fire(timer);
            fired += 1;
        }
        fired
    }

    fn fire(&self, timer: &mut SoftTimer) {
        let mut cx = TimerContext {
            period: timer.period,
            non_blocking: NonBlocking::grant(),
        };
        let started = Instant::now();
        (timer.callback)(&mut cx);
        let took = started.elapsed();
        if took > CALLBACK_BUDGET {
            self.overruns.fetch_add(1, Ordering::Relaxed);
            warn!(
                "TimerService: '{}' callback took {} us (budget {} us)",
                timer.name,
                took.as_micros(),
                CALLBACK_BUDGET.as_micros()
            );
        }

        let now = Instant::now();
        if cx.period != timer.period && !cx.period.is_zero() {
            debug!(
                "TimerService: '{}' period {} -> {} ms",
                timer.name,
                timer.period.as_millis(),
                cx.period.as_millis()
            );
            timer.period = cx.period;
            timer.next_due = now + timer.period;
        } else {
            timer.next_due += timer.period;
            // Fell more than a period behind: skip the missed ticks.
            if timer.next_due <= now {
                timer.next_due = now + timer.period;
            }
        }
    }

    /// Service loop; never returns.  Run from the timer-service task.
    pub fn run(&self, meter: &TaskMeter) {
        info!("TimerService: started");
        loop {
            let mut timers = self.timers.lock();
            match timers.iter().map(|t| t.next_due).min() {
                None => self.changed.wait(&mut timers),
                Some(due) if due > Instant::now() => {
                    let _ = self.changed.wait_until(&mut timers, due);
                }
                Some(_) => {
                    drop(timers);
                    let _busy = meter.busy();
                    self.fire_due();
                }
            }
        }
    }
}
