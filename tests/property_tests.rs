//! Property tests for the core data structures.
//!
//! Runs on host (x86_64) only; proptest is not available for ESP32 targets.
//! On ESP32, these tests are compiled out.

#![cfg(not(target_os = "espidf"))]

use std::time::Duration;

use geekhouse::error::Error;
use geekhouse::sensors::SensorChannel;
use geekhouse::sensors::calibration::{CalibrationFunction, calibrate};
use geekhouse::shared::{DeliveryQueue, ReadinessSignal, ReadyMask, ReadyResult};
use geekhouse::tasks::actuation::Hysteresis;
use proptest::prelude::*;

// ── Calibration ───────────────────────────────────────────────

proptest! {
    #[test]
    fn unit_linear_is_identity(raw in 0u16..=4095) {
        let y = calibrate(raw, CalibrationFunction::Linear { m: 1.0, b: 0.0 });
        prop_assert_eq!(y, f32::from(raw));
        prop_assert_eq!(calibrate(raw, CalibrationFunction::None), f32::from(raw));
    }

    #[test]
    fn linear_is_monotonic_for_positive_slope(
        a in 0u16..=4095,
        b in 0u16..=4095,
        m in 0.001f32..100.0,
        offset in -1000.0f32..1000.0,
    ) {
        let (lo, hi) = if a <= b { (a, b) } else { (b, a) };
        let f = CalibrationFunction::Linear { m, b: offset };
        prop_assert!(calibrate(lo, f) <= calibrate(hi, f));
    }
}

// ── Delivery queue ────────────────────────────────────────────

proptest! {
    #[test]
    fn queue_preserves_fifo_order(items in proptest::collection::vec(any::<u32>(), 0..=8)) {
        let q: DeliveryQueue<u32, 8> = DeliveryQueue::new();
        for &i in &items {
            prop_assert!(q.try_send(i).is_ok());
        }
        let out: Vec<u32> = (0..items.len()).map(|_| q.receive()).collect();
        prop_assert_eq!(out, items);
    }

    #[test]
    fn queue_never_exceeds_capacity(extra in 1usize..6) {
        let q: DeliveryQueue<usize, 4> = DeliveryQueue::new();
        for i in 0..4 + extra {
            let r = q.send_timeout(i, Duration::from_millis(1));
            if i < 4 {
                prop_assert!(r.is_ok());
            } else {
                prop_assert_eq!(r, Err(Error::QueueFull));
            }
            prop_assert!(q.len() <= q.capacity());
        }
        prop_assert_eq!(q.dropped() as usize, extra);
        // The survivors are the first four, in order.
        for i in 0..4 {
            prop_assert_eq!(q.receive(), i);
        }
    }
}

// ── Hysteresis ────────────────────────────────────────────────

fn hysteresis() -> Hysteresis {
    Hysteresis {
        high: 3000,
        low: 2000,
        fast: Duration::from_millis(100),
        slow: Duration::from_millis(500),
    }
}

proptest! {
    #[test]
    fn band_values_never_change_the_fast_period(
        values in proptest::collection::vec(2000u16..=3000, 1..50),
    ) {
        let h = hysteresis();
        let mut period = h.next_period(h.slow, 3500);
        prop_assert_eq!(period, h.fast);
        for v in values {
            let next = h.next_period(period, v);
            prop_assert_eq!(next, period);
            period = next;
        }
    }

    #[test]
    fn period_is_always_fast_or_slow(values in proptest::collection::vec(0u16..=4095, 1..50)) {
        let h = hysteresis();
        let mut period = h.slow;
        for v in values {
            period = h.next_period(period, v);
            prop_assert!(period == h.fast || period == h.slow);
            if v > h.high {
                prop_assert_eq!(period, h.fast);
            }
            if v < h.low {
                prop_assert_eq!(period, h.slow);
            }
        }
    }
}

// ── Readiness ─────────────────────────────────────────────────

proptest! {
    #![proptest_config(ProptestConfig::with_cases(16))]

    #[test]
    fn all_wait_never_succeeds_with_one_channel(light_only in any::<bool>(), wait_ms in 0u64..10) {
        let sig = ReadinessSignal::new();
        let (set, missing) = if light_only {
            (SensorChannel::Light, ReadyMask::WATER)
        } else {
            (SensorChannel::Water, ReadyMask::LIGHT)
        };
        sig.set(ReadyMask::of(set));

        let r = sig.wait_all(ReadyMask::BOTH, Duration::from_millis(wait_ms));
        prop_assert_eq!(r, ReadyResult::TimedOut { observed: ReadyMask::of(set), missing });
        // The bit that was seen is still there for the next wait.
        prop_assert_eq!(sig.peek(), ReadyMask::of(set));
    }
}
