//! Liveness monitor: periodic stack / CPU / heap report.
//!
//! Lowest-priority task.  It only observes: a probe supplies the numbers,
//! the monitor flags stacks under the warning threshold and hands the
//! report to the event sink.

use core::time::Duration;

use log::{info, warn};

use crate::adapters::time::Uptime;
use crate::app::events::AppEvent;
use crate::app::ports::{EventSink, SystemProbe};
use crate::config::SystemConfig;
use crate::diagnostics::LivenessReport;
use crate::tasks::TaskMeter;

pub struct LivenessMonitor<P: SystemProbe, S: EventSink> {
    probe: P,
    sink: S,
    period: Duration,
    stack_warning_bytes: u32,
    clock: Uptime,
}

impl<P: SystemProbe, S: EventSink> LivenessMonitor<P, S> {
    pub fn new(probe: P, sink: S, cfg: &SystemConfig) -> Self {
        Self {
            probe,
            sink,
            period: cfg.liveness_period(),
            stack_warning_bytes: cfg.stack_warning_bytes,
            clock: Uptime::new(),
        }
    }

    /// Take one sample and emit the report.
    pub fn check(&mut self) -> LivenessReport {
        let sample = self.probe.sample();
        let report =
            LivenessReport::from_sample(&sample, self.stack_warning_bytes, self.clock.uptime_secs());
        for task in report.low_stack_tasks() {
            warn!(
                "Liveness: task '{}' stack headroom {} B < {} B",
                task.name, task.stack_high_water_bytes, self.stack_warning_bytes
            );
        }
        self.sink.emit(&AppEvent::Liveness(report.clone()));
        report
    }

    /// Task body; never returns.
    pub fn run(mut self, meter: TaskMeter) {
        info!("Liveness: started (every {} ms)", self.period.as_millis());
        loop {
            std::thread::sleep(self.period);
            let _busy = meter.busy();
            self.check();
        }
    }
}
