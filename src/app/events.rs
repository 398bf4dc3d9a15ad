//! Outbound application events.
//!
//! The consumer tasks emit these through the
//! [`EventSink`](super::ports::EventSink) port.  Adapters on the other
//! side decide what to do with them: log to serial, publish over MQTT,
//! record them in a test.

use crate::diagnostics::LivenessReport;
use crate::sensors::{SensorChannel, SensorInfo, SensorReading};
use crate::tasks::aggregation::StatsSummary;

/// Structured events emitted by the core's consumer tasks.
#[derive(Debug, Clone)]
pub enum AppEvent {
    /// A reading taken off the delivery queue by the display consumer.
    Reading {
        reading: SensorReading,
        info: SensorInfo,
    },

    /// Rolling statistics over the last complete window.
    Summary(StatsSummary),

    /// A joint readiness wait expired without a fresh reading from
    /// `channel`.
    ChannelStalled {
        channel: SensorChannel,
        waited_ms: u32,
    },

    /// Periodic stack / CPU / heap report.
    Liveness(LivenessReport),
}
