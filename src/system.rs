//! Start-up wiring for the monitor core.
//!
//! [`start`] builds every shared object once, spawns the tasks in
//! dependency order (consumers first, producer last) and arms the blink
//! timer.  Any failure here is fatal and aborts start-up; after it returns
//! nothing in the core fails fatally.
//!
//! The returned [`CoreHandles`] are what external collaborators (network
//! handlers, console) hold on to.

use core::sync::atomic::AtomicU32;
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::Context;
use embedded_hal::digital::OutputPin;
use log::info;

use crate::app::ports::{AnalogInput, EventSink, SystemProbe};
use crate::config::SystemConfig;
use crate::drivers::actuators::ActuatorSink;
use crate::drivers::soft_timer::{TimerId, TimerService};
use crate::sensors::SensorSource;
use crate::shared::{ReadinessSignal, ReadingQueue, ReadingStore};
use crate::tasks::acquisition::{AcquisitionCounters, AcquisitionTask};
use crate::tasks::actuation::{BlinkController, BlinkStats, Hysteresis};
use crate::tasks::aggregation::{AggregationCounters, Aggregator};
use crate::tasks::display::DisplayConsumer;
use crate::tasks::liveness::LivenessMonitor;
use crate::tasks::{self, TaskRegistry, spawn_task};

/// Shared handles to the running core.
pub struct CoreHandles<A: AnalogInput, P> {
    pub sensors: Arc<SensorSource<A>>,
    pub actuators: Arc<ActuatorSink<P>>,
    pub store: Arc<ReadingStore>,
    pub readiness: Arc<ReadinessSignal>,
    pub queue: Arc<ReadingQueue>,
    pub timers: Arc<TimerService>,
    pub registry: Arc<TaskRegistry>,
    pub blink_timer: TimerId,
    pub acquisition: Arc<AcquisitionCounters>,
    pub aggregation: Arc<AggregationCounters>,
    pub blink: Arc<BlinkStats>,
    pub displayed: Arc<AtomicU32>,
    pub threads: Vec<JoinHandle<()>>,
}

/// Validate `cfg`, build the core and start every task.
///
/// `make_probe` receives the task registry so a host probe can report the
/// tasks spawned here.
pub fn start<A, P, S, Pr>(
    cfg: SystemConfig,
    adc: A,
    yellow: P,
    white: P,
    sink: S,
    make_probe: impl FnOnce(&Arc<TaskRegistry>) -> Pr,
) -> anyhow::Result<CoreHandles<A, P>>
where
    A: AnalogInput + 'static,
    P: OutputPin + Send + 'static,
    S: EventSink + Clone + 'static,
    Pr: SystemProbe + 'static,
{
    cfg.validate().context("invalid configuration")?;
    info!("System: starting core ({:?})", cfg);

    let lock_timeout = cfg.lock_timeout();
    let sensors = Arc::new(SensorSource::new(
        adc,
        [cfg.light_calibration.clone(), cfg.water_calibration.clone()],
        lock_timeout,
    ));
    let actuators = Arc::new(
        ActuatorSink::new(yellow, white, lock_timeout).context("LED outputs init failed")?,
    );
    let readiness = Arc::new(ReadinessSignal::new());
    let store = Arc::new(ReadingStore::new(Arc::clone(&readiness), lock_timeout));
    let queue = Arc::new(ReadingQueue::new());
    let timers = Arc::new(TimerService::new());
    let registry = Arc::new(TaskRegistry::new());
    let probe = make_probe(&registry);

    let display = DisplayConsumer::new(Arc::clone(&queue), sink.clone());
    let aggregator = Aggregator::new(Arc::clone(&store), sink.clone(), &cfg);
    let acquisition =
        AcquisitionTask::new(Arc::clone(&sensors), Arc::clone(&store), Arc::clone(&queue), &cfg);
    let liveness = LivenessMonitor::new(probe, sink, &cfg);
    let blink = BlinkController::new(
        actuators.toggler(),
        store.water_reader(),
        Hysteresis::from_config(&cfg),
    );

    let handles_displayed = display.displayed();
    let handles_aggregation = aggregator.counters();
    let handles_acquisition = acquisition.counters();
    let handles_blink = blink.stats();

    let blink_timer = timers
        .add("blink", blink.initial_period(), blink.into_callback())
        .context("blink timer")?;

    let mut threads = Vec::with_capacity(5);
    threads.push(
        spawn_task(&registry, tasks::DISPLAY, move |meter| display.run(meter))
            .context("spawn display")?,
    );
    threads.push(
        spawn_task(&registry, tasks::AGGREGATION, move |meter| aggregator.run(meter))
            .context("spawn aggregation")?,
    );
    let service = Arc::clone(&timers);
    threads.push(
        spawn_task(&registry, tasks::TIMER_SERVICE, move |meter| service.run(&meter))
            .context("spawn timer service")?,
    );
    threads.push(
        spawn_task(&registry, tasks::ACQUISITION, move |meter| acquisition.run(meter))
            .context("spawn acquisition")?,
    );
    threads.push(
        spawn_task(&registry, tasks::LIVENESS, move |meter| liveness.run(meter))
            .context("spawn liveness")?,
    );
    info!("System: {} tasks running", registry.len());

    Ok(CoreHandles {
        sensors,
        actuators,
        store,
        readiness,
        queue,
        timers,
        registry,
        blink_timer,
        acquisition: handles_acquisition,
        aggregation: handles_aggregation,
        blink: handles_blink,
        displayed: handles_displayed,
        threads,
    })
}
