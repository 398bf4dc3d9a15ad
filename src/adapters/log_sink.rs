//! Log-based event sink adapter.
//!
//! Implements [`EventSink`] by writing application events to the ESP-IDF
//! logger (UART / USB-CDC in production).  An MQTT publisher would
//! implement the same trait.

use core::fmt::Write as _;

use log::{info, warn};

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::diagnostics::LivenessReport;
use crate::sensors::{SensorInfo, SensorReading};
use crate::tasks::aggregation::{ChannelSummary, StatsSummary};

/// Adapter that logs every [`AppEvent`] to the serial console.
#[derive(Debug, Clone, Copy, Default)]
pub struct LogEventSink;

impl LogEventSink {
    pub fn new() -> Self {
        Self
    }
}

pub fn format_reading(reading: &SensorReading, info: &SensorInfo) -> String {
    format!(
        "{} sensor ({}): raw={}, calibrated={:.2} {}, time={} ms",
        info.kind.label(),
        info.location,
        reading.raw,
        reading.calibrated,
        reading.unit,
        reading.timestamp_ms
    )
}

fn format_channel(label: &str, s: &ChannelSummary) -> String {
    format!("{}: min={}, max={}, avg={:.1}", label, s.min, s.max, s.avg)
}

pub fn format_summary(summary: &StatsSummary) -> [String; 3] {
    [
        format!("===== Sensor Summary (last {} readings) =====", summary.window),
        format_channel("Light", &summary.light),
        format_channel("Water", &summary.water),
    ]
}

pub fn format_liveness(report: &LivenessReport) -> Vec<String> {
    let mut lines = Vec::with_capacity(report.tasks.len() + 3);
    lines.push(format!("===== Liveness @ {}s =====", report.uptime_secs));
    lines.push(format!("{:<16} {:>3} {:>9} {:>6}", "Task", "Pri", "StackHWM", "CPU%"));
    for t in &report.tasks {
        let mut line = format!(
            "{:<16} {:>3} {:>9} {:>5.1}%",
            t.name, t.priority, t.stack_high_water_bytes, t.cpu_percent
        );
        if t.low_stack {
            let _ = write!(line, "  <-- LOW STACK");
        }
        lines.push(line);
    }
    lines.push(format!(
        "Heap: free={} B, min_free={} B",
        report.heap.free_bytes, report.heap.min_free_bytes
    ));
    lines
}

impl EventSink for LogEventSink {
    fn emit(&mut self, event: &AppEvent) {
        match event {
            AppEvent::Reading { reading, info } => {
                info!("{}", format_reading(reading, info));
            }
            AppEvent::Summary(summary) => {
                for line in format_summary(summary) {
                    info!("{}", line);
                }
            }
            AppEvent::ChannelStalled { channel, waited_ms } => {
                warn!("STALL | {} sensor silent for {} ms", channel, waited_ms);
            }
            AppEvent::Liveness(report) => {
                for line in format_liveness(report) {
                    info!("{}", line);
                }
            }
        }
    }
}
