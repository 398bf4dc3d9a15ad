//! Acquisition → store / readiness / queue → aggregation + display,
//! stepped deterministically from the test thread.

use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::{Duration, Instant};

use geekhouse::config::SystemConfig;
use geekhouse::error::{Error, Resource};
use geekhouse::sensors::calibration::{Calibration, CalibrationFunction};
use geekhouse::sensors::{SensorChannel, SensorSource};
use geekhouse::shared::{ReadinessSignal, ReadingQueue, ReadingStore, ReadyMask};
use geekhouse::tasks::acquisition::AcquisitionTask;
use geekhouse::tasks::aggregation::{Aggregator, RoundOutcome};
use geekhouse::tasks::display::DisplayConsumer;

use super::mock_hw::{MockAdc, RecordingSink};

struct Pipeline {
    adc: MockAdc,
    sensors: Arc<SensorSource<MockAdc>>,
    queue: Arc<ReadingQueue>,
    acquisition: AcquisitionTask<MockAdc>,
    aggregator: Aggregator<RecordingSink>,
    display: DisplayConsumer<RecordingSink>,
    sink: RecordingSink,
}

impl Pipeline {
    fn new(adc: MockAdc) -> Self {
        let cfg = SystemConfig { readiness_timeout_ms: 30, enqueue_timeout_ms: 5, ..Default::default() };
        let sensors = Arc::new(SensorSource::new(adc.clone(), Default::default(), cfg.lock_timeout()));
        let store = Arc::new(ReadingStore::new(Arc::new(ReadinessSignal::new()), cfg.lock_timeout()));
        let queue = Arc::new(ReadingQueue::new());
        let sink = RecordingSink::default();
        Self {
            adc,
            acquisition: AcquisitionTask::new(
                Arc::clone(&sensors),
                Arc::clone(&store),
                Arc::clone(&queue),
                &cfg,
            ),
            aggregator: Aggregator::new(store, sink.clone(), &cfg),
            display: DisplayConsumer::new(Arc::clone(&queue), sink.clone()),
            sensors,
            queue,
            sink,
        }
    }

    /// One acquisition cycle, one aggregation round, then drain the queue.
    fn step(&mut self) -> RoundOutcome {
        self.acquisition.cycle();
        let outcome = self.aggregator.round();
        while let Some(reading) = self.queue.receive_timeout(Duration::ZERO) {
            self.display.render(reading);
        }
        outcome
    }
}

#[test]
fn normal_cycle_displays_both_and_summarises_ten() {
    let mut p = Pipeline::new(MockAdc::new(2847, 1534));
    for i in 1..10 {
        assert_eq!(p.step(), RoundOutcome::Accepted { count: i });
    }
    let RoundOutcome::Summary(summary) = p.step() else {
        panic!("tenth joint sample must close the window");
    };

    assert_eq!(summary.window, 10);
    assert_eq!((summary.light.min, summary.light.max), (2847, 2847));
    assert!((summary.light.avg - 2847.0).abs() < 1e-3);
    assert_eq!((summary.water.min, summary.water.max), (1534, 1534));
    assert!((summary.water.avg - 1534.0).abs() < 1e-3);
    assert_eq!(p.sink.summaries().len(), 1);

    let readings = p.sink.readings();
    assert_eq!(readings.len(), 20);
    assert_eq!(readings[0].channel, SensorChannel::Light);
    assert_eq!(readings[0].raw, 2847);
    assert_eq!(readings[1].channel, SensorChannel::Water);
    assert_eq!(readings[1].raw, 1534);
}

#[test]
fn summary_covers_exactly_the_window_values() {
    let mut p = Pipeline::new(MockAdc::new(0, 0));
    let mut last = None;
    for i in 0..10u16 {
        p.adc.set(SensorChannel::Light, 1000 + i * 10);
        p.adc.set(SensorChannel::Water, 2000 - i);
        last = Some(p.step());
    }
    let Some(RoundOutcome::Summary(s)) = last else {
        panic!("expected a summary, got {last:?}");
    };
    assert_eq!((s.light.min, s.light.max), (1000, 1090));
    assert!((s.light.avg - 1045.0).abs() < 1e-3);
    assert_eq!((s.water.min, s.water.max), (1991, 2000));
    assert!((s.water.avg - 1995.5).abs() < 1e-3);

    // The next window starts from scratch.
    p.adc.set(SensorChannel::Light, 5);
    assert_eq!(p.step(), RoundOutcome::Accepted { count: 1 });
}

#[test]
fn stalled_light_channel_never_advances_the_window() {
    let adc = MockAdc::new(2847, 1534);
    adc.fail(SensorChannel::Light, true);
    let mut p = Pipeline::new(adc);

    for _ in 0..5 {
        assert_eq!(p.step(), RoundOutcome::Missing(ReadyMask::LIGHT));
    }
    assert_eq!(p.aggregator.pending(), 0);
    assert_eq!(p.sink.stalls(), vec![SensorChannel::Light; 5]);
    assert!(p.sink.summaries().is_empty());

    let readings = p.sink.readings();
    assert_eq!(readings.len(), 5);
    assert!(readings.iter().all(|r| r.channel == SensorChannel::Water && r.raw == 1534));

    let counters = p.aggregator.counters();
    assert_eq!(counters.missed[SensorChannel::Light.index()].load(Ordering::Relaxed), 5);
    assert_eq!(counters.accepted.load(Ordering::Relaxed), 0);

    // Recovery: the light channel comes back and joint samples count again.
    p.adc.fail(SensorChannel::Light, false);
    assert_eq!(p.step(), RoundOutcome::Accepted { count: 1 });
}

#[test]
fn contended_sensor_lock_times_out_within_bound() {
    let adc = MockAdc::new(1, 1);
    adc.set_delay(Duration::from_millis(400));
    let p = Pipeline::new(adc);
    let holder = {
        let sensors = Arc::clone(&p.sensors);
        std::thread::spawn(move || sensors.read(SensorChannel::Light))
    };
    std::thread::sleep(Duration::from_millis(30));

    let started = Instant::now();
    let result = p.sensors.read(SensorChannel::Water);
    let waited = started.elapsed();

    assert_eq!(result, Err(Error::AcquisitionTimeout(Resource::SensorHardware)));
    assert!(waited >= Duration::from_millis(90), "returned early: {waited:?}");
    assert!(waited < Duration::from_millis(350), "blocked past the bound: {waited:?}");
    assert!(holder.join().unwrap().is_ok());
}

#[test]
fn calibration_change_reaches_displayed_readings() {
    let mut p = Pipeline::new(MockAdc::new(1000, 2000));
    p.sensors
        .set_calibration(
            SensorChannel::Water,
            Calibration::new(CalibrationFunction::Linear { m: 0.05, b: 0.0 }, "%"),
        )
        .unwrap();
    p.step();

    let water = p
        .sink
        .readings()
        .into_iter()
        .find(|r| r.channel == SensorChannel::Water)
        .unwrap();
    assert_eq!(water.raw, 2000);
    assert!((water.calibrated - 100.0).abs() < 1e-3);
    assert_eq!(water.unit.as_str(), "%");
}
