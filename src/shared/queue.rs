//! Bounded FIFO from the acquisition task to the display consumer.
//!
//! Fixed capacity `N`, storage in a `heapless::Deque` so nothing allocates
//! after start-up.  The producer side sheds load: an enqueue that cannot
//! find room within its bound drops the item and bumps [`dropped`].  The
//! consumer side waits without a bound.
//!
//! [`dropped`]: DeliveryQueue::dropped

use core::sync::atomic::{AtomicU32, Ordering};
use core::time::Duration;
use std::time::Instant;

use heapless::Deque;
use parking_lot::{Condvar, Mutex};

use crate::error::{Error, Result};
use crate::sensors::SensorReading;

/// Depth of the sensor-reading delivery queue.
pub const READING_QUEUE_DEPTH: usize = 10;

/// The queue the acquisition task feeds.
pub type ReadingQueue = DeliveryQueue<SensorReading, READING_QUEUE_DEPTH>;

pub struct DeliveryQueue<T, const N: usize> {
    items: Mutex<Deque<T, N>>,
    not_empty: Condvar,
    not_full: Condvar,
    dropped: AtomicU32,
}

impl<T, const N: usize> Default for DeliveryQueue<T, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T, const N: usize> DeliveryQueue<T, N> {
    pub fn new() -> Self {
        Self {
            items: Mutex::new(Deque::new()),
            not_empty: Condvar::new(),
            not_full: Condvar::new(),
            dropped: AtomicU32::new(0),
        }
    }

    /// Enqueue, waiting up to `timeout` for a free slot.  On timeout the
    /// item is dropped, counted, and `QueueFull` returned.
    pub fn send_timeout(&self, item: T, timeout: Duration) -> Result<()> {
        let deadline = Instant::now().checked_add(timeout);
        let mut items = self.items.lock();
        while items.is_full() {
            let timed_out = match deadline {
                Some(deadline) => self.not_full.wait_until(&mut items, deadline).timed_out(),
                None => {
                    self.not_full.wait(&mut items);
                    false
                }
            };
            if timed_out && items.is_full() {
                drop(items);
                self.dropped.fetch_add(1, Ordering::Relaxed);
                return Err(Error::QueueFull);
            }
        }
        // Cannot fail: the loop above exits only with a free slot.
        if items.push_back(item).is_err() {
            self.dropped.fetch_add(1, Ordering::Relaxed);
            return Err(Error::QueueFull);
        }
        self.not_empty.notify_one();
        Ok(())
    }

    /// Enqueue without waiting.
    pub fn try_send(&self, item: T) -> Result<()> {
        self.send_timeout(item, Duration::ZERO)
    }

    /// Dequeue the oldest item, waiting as long as it takes.
    pub fn receive(&self) -> T {
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                self.not_full.notify_one();
                return item;
            }
            self.not_empty.wait(&mut items);
        }
    }

    /// Dequeue the oldest item, or `None` if nothing arrived within
    /// `timeout`.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now().checked_add(timeout);
        let mut items = self.items.lock();
        loop {
            if let Some(item) = items.pop_front() {
                self.not_full.notify_one();
                return Some(item);
            }
            match deadline {
                Some(deadline) => {
                    if self.not_empty.wait_until(&mut items, deadline).timed_out() {
                        let item = items.pop_front();
                        if item.is_some() {
                            self.not_full.notify_one();
                        }
                        return item;
                    }
                }
                None => self.not_empty.wait(&mut items),
            }
        }
    }

    pub fn len(&self) -> usize {
        self.items.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub const fn capacity(&self) -> usize {
        N
    }

    /// Items shed by `send_timeout` since start-up.
    pub fn dropped(&self) -> u32 {
        self.dropped.load(Ordering::Relaxed)
    }
}
