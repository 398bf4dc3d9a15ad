//! Long-running tasks of the monitor and the registry that tracks them.
//!
//! Every task is spawned through [`spawn_task`], which records its
//! [`TaskSpec`] in a [`TaskRegistry`] before the thread starts.  The
//! liveness monitor reads the registry to know the task set; on the host
//! each task also reports the time it spends working between suspension
//! points through its [`TaskMeter`], which stands in for the FreeRTOS
//! run-time counters.

pub mod acquisition;
pub mod actuation;
pub mod aggregation;
pub mod display;
pub mod liveness;

use core::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Instant;

use parking_lot::Mutex;

use crate::drivers::task_pin::{self, Core};

// ═══════════════════════════════════════════════════════════════
//  Task table
// ═══════════════════════════════════════════════════════════════

/// Static scheduling parameters of one task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TaskSpec {
    /// Null-terminated, as FreeRTOS wants it.
    pub name: &'static str,
    pub priority: u8,
    pub stack_kb: usize,
    pub core: Core,
}

impl TaskSpec {
    pub fn display_name(&self) -> &'static str {
        self.name.trim_end_matches('\0')
    }

    pub const fn stack_bytes(&self) -> u32 {
        (self.stack_kb * 1024) as u32
    }
}

// Acquisition > Aggregation = Display > timer service > Liveness.
pub const ACQUISITION: TaskSpec =
    TaskSpec { name: "acquisition\0", priority: 5, stack_kb: 4, core: Core::Any };
pub const AGGREGATION: TaskSpec =
    TaskSpec { name: "aggregation\0", priority: 4, stack_kb: 4, core: Core::Any };
pub const DISPLAY: TaskSpec =
    TaskSpec { name: "display\0", priority: 4, stack_kb: 3, core: Core::Any };
pub const TIMER_SERVICE: TaskSpec =
    TaskSpec { name: "timer-svc\0", priority: 3, stack_kb: 3, core: Core::Any };
pub const LIVENESS: TaskSpec =
    TaskSpec { name: "liveness\0", priority: 2, stack_kb: 4, core: Core::Any };

// ═══════════════════════════════════════════════════════════════
//  Registry
// ═══════════════════════════════════════════════════════════════

/// One registered task and its accumulated busy time.
#[derive(Debug)]
pub struct TaskEntry {
    pub spec: TaskSpec,
    busy_us: AtomicU64,
}

impl TaskEntry {
    pub fn busy_us(&self) -> u64 {
        self.busy_us.load(Ordering::Relaxed)
    }
}

/// Handle a task uses to account for its own work.
#[derive(Debug, Clone)]
pub struct TaskMeter {
    entry: Arc<TaskEntry>,
}

impl TaskMeter {
    /// A meter not attached to any registry, for driving a task's loop
    /// body directly.
    pub fn detached(spec: TaskSpec) -> Self {
        Self { entry: Arc::new(TaskEntry { spec, busy_us: AtomicU64::new(0) }) }
    }

    /// Starts timing; the time until the guard drops counts as busy.
    pub fn busy(&self) -> BusyGuard<'_> {
        BusyGuard { entry: &self.entry, started: Instant::now() }
    }

    pub fn spec(&self) -> &TaskSpec {
        &self.entry.spec
    }
}

pub struct BusyGuard<'a> {
    entry: &'a TaskEntry,
    started: Instant,
}

impl Drop for BusyGuard<'_> {
    fn drop(&mut self) {
        let us = self.started.elapsed().as_micros() as u64;
        self.entry.busy_us.fetch_add(us, Ordering::Relaxed);
    }
}

#[derive(Debug, Default)]
pub struct TaskRegistry {
    entries: Mutex<Vec<Arc<TaskEntry>>>,
}

impl TaskRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&self, spec: TaskSpec) -> TaskMeter {
        let entry = Arc::new(TaskEntry { spec, busy_us: AtomicU64::new(0) });
        self.entries.lock().push(Arc::clone(&entry));
        TaskMeter { entry }
    }

    /// Registered tasks in spawn order.
    pub fn entries(&self) -> Vec<Arc<TaskEntry>> {
        self.entries.lock().clone()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Register `spec` and spawn its thread.  The body receives the task's
/// meter.
pub fn spawn_task<F>(
    registry: &TaskRegistry,
    spec: TaskSpec,
    body: F,
) -> std::io::Result<JoinHandle<()>>
where
    F: FnOnce(TaskMeter) + Send + 'static,
{
    let meter = registry.register(spec);
    task_pin::spawn_on_core(spec.core, spec.priority, spec.stack_kb, spec.name, move || {
        body(meter)
    })
}
