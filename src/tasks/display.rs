//! Display consumer: drains the delivery queue and renders readings.

use core::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use log::info;

use crate::app::events::AppEvent;
use crate::app::ports::EventSink;
use crate::sensors::{SensorReading, sensor_info};
use crate::shared::ReadingQueue;
use crate::tasks::TaskMeter;

pub struct DisplayConsumer<S: EventSink> {
    queue: Arc<ReadingQueue>,
    sink: S,
    displayed: Arc<AtomicU32>,
}

impl<S: EventSink> DisplayConsumer<S> {
    pub fn new(queue: Arc<ReadingQueue>, sink: S) -> Self {
        Self { queue, sink, displayed: Arc::new(AtomicU32::new(0)) }
    }

    /// Readings rendered since start-up.
    pub fn displayed(&self) -> Arc<AtomicU32> {
        Arc::clone(&self.displayed)
    }

    pub fn render(&mut self, reading: SensorReading) {
        let info = *sensor_info(reading.channel);
        self.sink.emit(&AppEvent::Reading { reading, info });
        self.displayed.fetch_add(1, Ordering::Relaxed);
    }

    /// Task body; never returns.  The dequeue has no bound.
    pub fn run(mut self, meter: TaskMeter) {
        info!("Display: started (queue depth {})", self.queue.capacity());
        loop {
            let reading = self.queue.receive();
            let _busy = meter.busy();
            self.render(reading);
        }
    }
}
