//! System probes: scheduler and heap bookkeeping for the liveness monitor.
//!
//! - [`FreeRtosProbe`] (`target_os = "espidf"`) reads every task through
//!   `uxTaskGetSystemState()`.  Needs `CONFIG_FREERTOS_USE_TRACE_FACILITY`
//!   and `CONFIG_FREERTOS_GENERATE_RUN_TIME_STATS` in sdkconfig.
//! - [`SimProbe`] (host) reports the tasks in the [`TaskRegistry`], using
//!   their self-measured busy time as the run-time counter.

use std::sync::Arc;

use crate::adapters::time::Uptime;
use crate::app::ports::SystemProbe;
use crate::diagnostics::{HeapStats, SystemSample, TaskSample, task_name};
use crate::tasks::TaskRegistry;

// ── FreeRTOS ──────────────────────────────────────────────────

#[cfg(target_os = "espidf")]
pub struct FreeRtosProbe {
    clock: Uptime,
}

#[cfg(target_os = "espidf")]
impl Default for FreeRtosProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(target_os = "espidf")]
impl FreeRtosProbe {
    pub fn new() -> Self {
        Self { clock: Uptime::new() }
    }
}

#[cfg(target_os = "espidf")]
impl SystemProbe for FreeRtosProbe {
    fn sample(&self) -> SystemSample {
        use crate::diagnostics::MAX_TASKS;
        use esp_idf_svc::sys::*;

        let mut raw: [TaskStatus_t; MAX_TASKS] = unsafe { core::mem::zeroed() };
        let mut total_runtime: configRUN_TIME_COUNTER_TYPE = 0;
        // SAFETY: `raw` has room for MAX_TASKS entries and we pass that
        // bound; the kernel fills at most that many and returns the count.
        let count = unsafe {
            uxTaskGetSystemState(raw.as_mut_ptr(), MAX_TASKS as UBaseType_t, &mut total_runtime)
        } as usize;

        let mut sample = SystemSample {
            total_runtime: u64::from(total_runtime),
            heap: HeapStats::collect(self.clock.uptime_secs()),
            ..Default::default()
        };
        for status in &raw[..count.min(MAX_TASKS)] {
            // SAFETY: pcTaskName points at the TCB's null-terminated name,
            // valid while the task exists; we copy it out immediately.
            let name = unsafe { core::ffi::CStr::from_ptr(status.pcTaskName) };
            let _ = sample.tasks.push(TaskSample {
                name: task_name(&name.to_string_lossy()),
                priority: status.uxCurrentPriority as u8,
                // Stack words are bytes on ESP-IDF.
                stack_high_water_bytes: u32::from(status.usStackHighWaterMark),
                runtime: u64::from(status.ulRunTimeCounter),
            });
        }
        sample
    }
}

// ── Simulation ────────────────────────────────────────────────

/// Host probe over the task registry.
pub struct SimProbe {
    registry: Arc<TaskRegistry>,
    clock: Uptime,
}

impl SimProbe {
    pub fn new(registry: Arc<TaskRegistry>) -> Self {
        Self { registry, clock: Uptime::new() }
    }
}

impl SystemProbe for SimProbe {
    fn sample(&self) -> SystemSample {
        let mut sample = SystemSample {
            total_runtime: self.clock.uptime_us(),
            heap: HeapStats::collect(self.clock.uptime_secs()),
            ..Default::default()
        };
        for entry in self.registry.entries() {
            let spec = entry.spec;
            let task = TaskSample {
                name: task_name(spec.display_name()),
                priority: spec.priority,
                // Model ~3/8 of each stack as used at peak.
                stack_high_water_bytes: spec.stack_bytes() * 5 / 8,
                runtime: entry.busy_us(),
            };
            if sample.tasks.push(task).is_err() {
                break;
            }
        }
        sample
    }
}
