//! Whole core started through `system::start` on threads, with short
//! periods so every task gets to run.

use std::sync::atomic::Ordering;
use std::time::Duration;

use geekhouse::adapters::probe::SimProbe;
use geekhouse::config::SystemConfig;
use geekhouse::drivers::actuators::LedChannel;
use geekhouse::sensors::SensorChannel;
use geekhouse::system;

use super::mock_hw::{MockAdc, MockPin, MockProbe, RecordingSink, eventually};

fn fast_config() -> SystemConfig {
    SystemConfig {
        sample_period_ms: 10,
        readiness_timeout_ms: 200,
        stats_window: 3,
        blink_fast_ms: 5,
        blink_slow_ms: 20,
        liveness_period_ms: 50,
        ..Default::default()
    }
}

#[test]
fn running_core_feeds_every_consumer() {
    let adc = MockAdc::new(2847, 3500);
    let sink = RecordingSink::default();
    let core = system::start(
        fast_config(),
        adc.clone(),
        MockPin::default(),
        MockPin::default(),
        sink.clone(),
        |_| MockProbe,
    )
    .unwrap();

    let within = Duration::from_secs(3);
    assert!(eventually(within, || sink.summaries().len() >= 2), "no summaries");
    assert!(eventually(within, || sink.liveness_reports() >= 1), "no liveness report");
    assert!(
        eventually(within, || core.timers.period(core.blink_timer)
            == Some(Duration::from_millis(5))),
        "blink period did not adapt to high water"
    );

    let summary = sink.summaries()[0];
    assert_eq!(summary.window, 3);
    assert_eq!(summary.light.max, 2847);
    assert_eq!(summary.water.min, 3500);

    let readings = sink.readings();
    assert!(readings.iter().any(|r| r.channel == SensorChannel::Light && r.raw == 2847));
    assert!(readings.iter().any(|r| r.channel == SensorChannel::Water && r.raw == 3500));

    let snap = core.store.snapshot().unwrap();
    assert_eq!((snap.light_raw, snap.water_raw), (2847, 3500));
    // Six joint samples were folded in; the acquisition cycle that raised
    // the last of them may still be finishing its counters.
    assert!(core.aggregation.accepted.load(Ordering::Relaxed) >= 6);
    assert!(core.acquisition.cycles.load(Ordering::Relaxed) >= 5);
    assert_eq!(core.registry.len(), 5);

    // Collaborator access through the handles.
    core.actuators.on(LedChannel::White).unwrap();
    assert!(core.sensors.read(SensorChannel::Light).is_ok());
}

#[test]
fn sim_probe_reports_the_spawned_tasks() {
    let sink = RecordingSink::default();
    let core = system::start(
        fast_config(),
        MockAdc::new(100, 100),
        MockPin::default(),
        MockPin::default(),
        sink.clone(),
        |registry| SimProbe::new(std::sync::Arc::clone(registry)),
    )
    .unwrap();

    assert!(eventually(Duration::from_secs(3), || sink.liveness_reports() >= 1));
    let report = sink
        .events()
        .into_iter()
        .find_map(|e| match e {
            geekhouse::app::events::AppEvent::Liveness(r) => Some(r),
            _ => None,
        })
        .unwrap();
    let names: Vec<&str> = report.tasks.iter().map(|t| t.name.as_str()).collect();
    assert_eq!(names, ["display", "aggregation", "timer-svc", "acquisition", "liveness"]);
    assert!(report.heap.free_bytes > 0);
    drop(core);
}

#[test]
fn invalid_config_aborts_start() {
    let cfg = SystemConfig { water_low_threshold: 4000, ..Default::default() };
    let result = system::start(
        cfg,
        MockAdc::default(),
        MockPin::default(),
        MockPin::default(),
        RecordingSink::default(),
        |_| MockProbe,
    );
    assert!(result.is_err());
}
