//! Adaptive blink timer driven through the timer service.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use geekhouse::config::SystemConfig;
use geekhouse::drivers::actuators::{ActuatorSink, LedChannel};
use geekhouse::drivers::soft_timer::{TimerId, TimerService};
use geekhouse::sensors::SensorChannel;
use geekhouse::shared::{ReadinessSignal, ReadingStore};
use geekhouse::tasks::actuation::{BlinkController, BlinkStats, Hysteresis};

use super::mock_hw::MockPin;

const FAST: Duration = Duration::from_millis(10);
const SLOW: Duration = Duration::from_millis(30);

struct Rig {
    yellow: MockPin,
    white: MockPin,
    actuators: Arc<ActuatorSink<MockPin>>,
    store: Arc<ReadingStore>,
    timers: TimerService,
    id: TimerId,
    stats: Arc<BlinkStats>,
}

fn rig() -> Rig {
    let cfg = SystemConfig { blink_fast_ms: 10, blink_slow_ms: 30, ..Default::default() };
    let (yellow, white) = (MockPin::default(), MockPin::default());
    let actuators =
        Arc::new(ActuatorSink::new(yellow.clone(), white.clone(), cfg.lock_timeout()).unwrap());
    let store = Arc::new(ReadingStore::new(Arc::new(ReadinessSignal::new()), cfg.lock_timeout()));
    let blink =
        BlinkController::new(actuators.toggler(), store.water_reader(), Hysteresis::from_config(&cfg));
    let stats = blink.stats();
    let timers = TimerService::new();
    let id = timers.add("blink", blink.initial_period(), blink.into_callback()).unwrap();
    Rig { yellow, white, actuators, store, timers, id, stats }
}

impl Rig {
    fn water(&self, raw: u16) {
        self.store.update(SensorChannel::Water, raw, f32::from(raw), 0).unwrap();
    }

    /// Wait out the current period and fire.
    fn tick(&self) {
        let period = self.timers.period(self.id).unwrap();
        std::thread::sleep(period + Duration::from_millis(2));
        assert_eq!(self.timers.fire_due(), 1);
    }
}

#[test]
fn starts_slow_and_toggles_both_leds() {
    let r = rig();
    assert_eq!(r.timers.period(r.id), Some(SLOW));
    assert!(!r.yellow.is_high());

    r.tick();
    assert!(r.yellow.is_high() && r.white.is_high());
    assert_eq!(r.actuators.state(LedChannel::Yellow), Ok(true));

    r.tick();
    assert!(!r.yellow.is_high() && !r.white.is_high());
    assert_eq!(r.stats.ticks.load(Ordering::Relaxed), 2);
}

#[test]
fn high_water_speeds_up_and_band_holds() {
    let r = rig();
    r.water(3500);
    r.tick();
    assert_eq!(r.timers.period(r.id), Some(FAST));

    for raw in [2999, 2500, 2001, 3000] {
        r.water(raw);
        r.tick();
        assert_eq!(r.timers.period(r.id), Some(FAST), "changed inside the band at {raw}");
    }
    assert_eq!(r.stats.period_changes.load(Ordering::Relaxed), 1);

    r.water(1999);
    r.tick();
    assert_eq!(r.timers.period(r.id), Some(SLOW));
    assert_eq!(r.stats.period_changes.load(Ordering::Relaxed), 2);
}

#[test]
fn failed_white_write_keeps_leds_in_phase() {
    let r = rig();
    r.tick();
    assert!(r.yellow.is_high() && r.white.is_high());

    r.white.set_failing(true);
    r.water(3500);
    r.tick();
    assert!(r.yellow.is_high(), "yellow flipped alone");
    assert!(r.white.is_high());
    assert_eq!(r.stats.toggle_failures.load(Ordering::Relaxed), 1);
    assert_eq!(r.stats.toggle_skips.load(Ordering::Relaxed), 0);
    // The period still follows the water level.
    assert_eq!(r.timers.period(r.id), Some(FAST));

    r.white.set_failing(false);
    r.tick();
    assert!(!r.yellow.is_high() && !r.white.is_high());
    assert_eq!(r.actuators.state(LedChannel::White), Ok(false));
}

#[test]
fn service_thread_adapts_period() {
    let r = rig();
    let timers = Arc::new(r.timers);
    {
        let timers = Arc::clone(&timers);
        std::thread::spawn(move || {
            timers.run(&geekhouse::tasks::TaskMeter::detached(geekhouse::tasks::TIMER_SERVICE));
        });
    }
    r.store.update(SensorChannel::Water, 4000, 4000.0, 0).unwrap();
    assert!(super::mock_hw::eventually(Duration::from_secs(2), || {
        timers.period(r.id) == Some(FAST)
    }));
    assert!(super::mock_hw::eventually(Duration::from_secs(2), || r.yellow.writes() > 4));
}
