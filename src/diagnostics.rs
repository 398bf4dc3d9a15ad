//! Runtime diagnostics: task samples, heap figures and liveness reports.
//!
//! A [`SystemSample`] is what a [`SystemProbe`](crate::app::ports::SystemProbe)
//! returns: raw per-task numbers straight from the scheduler.  The
//! liveness monitor turns it into a [`LivenessReport`] by computing CPU
//! shares and flagging tasks whose stack headroom fell under the warning
//! threshold.

use serde::Serialize;

/// Most tasks a sample or report holds.  FreeRTOS on this board runs
/// about a dozen including IDLE, timer and IPC tasks.
pub const MAX_TASKS: usize = 16;

pub type TaskName = heapless::String<16>;

/// Copy `name` into a fixed buffer, truncating at a char boundary.
pub fn task_name(name: &str) -> TaskName {
    let mut out = TaskName::new();
    for ch in name.chars() {
        if out.push(ch).is_err() {
            break;
        }
    }
    out
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TaskSample {
    pub name: TaskName,
    pub priority: u8,
    /// Minimum free stack ever observed, bytes.
    pub stack_high_water_bytes: u32,
    /// Run-time counter, arbitrary but consistent units.
    pub runtime: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct HeapStats {
    pub free_bytes: u32,
    pub min_free_bytes: u32,
}

impl HeapStats {
    #[cfg(target_os = "espidf")]
    pub fn collect(_uptime_secs: u64) -> Self {
        use esp_idf_svc::sys::*;
        // SAFETY: plain reads of allocator counters.
        let free_bytes = unsafe { esp_get_free_heap_size() };
        let min_free_bytes = unsafe { esp_get_minimum_free_heap_size() };
        Self { free_bytes, min_free_bytes }
    }

    #[cfg(not(target_os = "espidf"))]
    pub fn collect(uptime_secs: u64) -> Self {
        // Synthetic but realistic, so the report path matches hardware.
        // Heap "decays" slightly over time to model fragmentation.
        let base_free: u32 = 307_200; // 300 KB
        let decay = (uptime_secs / 60) as u32 * 512; // lose ~512B/min
        let free_bytes = base_free.saturating_sub(decay);
        let min_free_bytes = (free_bytes as f32 * 0.85) as u32;
        Self { free_bytes, min_free_bytes }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct SystemSample {
    pub tasks: heapless::Vec<TaskSample, MAX_TASKS>,
    /// Sum of all run-time counters including idle time.
    pub total_runtime: u64,
    pub heap: HeapStats,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TaskHealth {
    pub name: TaskName,
    pub priority: u8,
    pub stack_high_water_bytes: u32,
    pub cpu_percent: f32,
    pub low_stack: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LivenessReport {
    pub uptime_secs: u64,
    pub tasks: heapless::Vec<TaskHealth, MAX_TASKS>,
    pub heap: HeapStats,
    pub stack_warning_bytes: u32,
}

impl LivenessReport {
    pub fn from_sample(sample: &SystemSample, stack_warning_bytes: u32, uptime_secs: u64) -> Self {
        let mut tasks = heapless::Vec::new();
        for t in &sample.tasks {
            let cpu_percent = if sample.total_runtime == 0 {
                0.0
            } else {
                (t.runtime as f64 * 100.0 / sample.total_runtime as f64) as f32
            };
            let health = TaskHealth {
                name: t.name.clone(),
                priority: t.priority,
                stack_high_water_bytes: t.stack_high_water_bytes,
                cpu_percent,
                low_stack: t.stack_high_water_bytes < stack_warning_bytes,
            };
            // Both vectors share MAX_TASKS, so this cannot overflow.
            let _ = tasks.push(health);
        }
        Self { uptime_secs, tasks, heap: sample.heap, stack_warning_bytes }
    }

    pub fn low_stack_tasks(&self) -> impl Iterator<Item = &TaskHealth> {
        self.tasks.iter().filter(|t| t.low_stack)
    }
}

// ───────────────────────────────────────────────────────────────
// Panic hook
// ───────────────────────────────────────────────────────────────

/// Install a panic hook that logs the reason and uptime, then defers to
/// the default handler (abort and reset on the device).
///
/// Call once, before any task is spawned.
pub fn install_panic_handler() {
    let default_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let reason = if let Some(msg) = info.payload().downcast_ref::<&str>() {
            *msg
        } else if let Some(msg) = info.payload().downcast_ref::<String>() {
            msg.as_str()
        } else {
            "unknown panic"
        };
        let uptime = crate::adapters::time::Uptime::new().uptime_secs();
        let location = info
            .location()
            .map(|l| (l.file(), l.line()))
            .unwrap_or(("?", 0));
        let thread = std::thread::current();
        log::error!(
            "PANIC in '{}' at {}:{} after {}s: {}",
            thread.name().unwrap_or("?"),
            location.0,
            location.1,
            uptime,
            reason
        );
        default_hook(info);
    }));
}
