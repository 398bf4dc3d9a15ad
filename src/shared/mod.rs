//! State shared between tasks: the reading store, its readiness signal and
//! the delivery queue.

pub mod queue;
pub mod readiness;
pub mod store;

pub use queue::{DeliveryQueue, READING_QUEUE_DEPTH, ReadingQueue};
pub use readiness::{ReadinessSignal, ReadyMask, ReadyResult, WaitMode};
pub use store::{ReadingStore, SharedSnapshot, WaterReader};

/// Proof that the holder runs in a context that must not block, i.e. a
/// soft-timer callback.
///
/// Only the timer service can mint one.  Operations that take
/// `&NonBlocking` are restricted to zero-wait lock attempts, and they are
/// reachable only through the narrow handles a timer callback is built
/// from ([`WaterReader`], [`LedToggler`](crate::drivers::actuators::LedToggler)),
/// so a callback has no way to reach a bounded or unbounded wait.
#[derive(Debug)]
pub struct NonBlocking {
    _private: (),
}

impl NonBlocking {
    pub(crate) const fn grant() -> Self {
        Self { _private: () }
    }
}
