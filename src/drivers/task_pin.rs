//! Thread spawning with explicit FreeRTOS priority and stack size.
//!
//! Wraps `esp_pthread_set_cfg()` so that `std::thread::spawn` creates a
//! FreeRTOS task with the requested priority, stack size and core
//! affinity.  On non-ESP targets, falls back to a plain named thread.
//!
//! # ESP-IDF Threading Model
//!
//! ESP-IDF implements `std::thread` via pthreads, which are thin wrappers
//! around FreeRTOS tasks. `esp_pthread_set_cfg()` sets thread-local
//! configuration that applies to the *next* `pthread_create()` call from
//! the calling thread, so the config→spawn pair must not be interleaved
//! with other thread creation on the same thread.

use std::io;
use std::thread::JoinHandle;

/// CPU affinity for a spawned task.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Core {
    /// Let the scheduler place the task (`tskNO_AFFINITY`).
    Any,
    /// Core 0 (PRO_CPU).
    Pro,
    /// Core 1 (APP_CPU); absent on single-core parts.
    App,
}

#[cfg(target_os = "espidf")]
impl Core {
    fn affinity(self) -> i32 {
        match self {
            // tskNO_AFFINITY
            Self::Any => 0x7FFF_FFFF,
            Self::Pro => 0,
            Self::App => 1,
        }
    }
}

/// Spawn a thread with explicit priority and stack.
///
/// `name` must be null-terminated (e.g. `"acquisition\0"`).  On ESP-IDF a
/// rejected pthread config is returned as an `io::Error` instead of
/// spawning with defaults.
#[cfg(target_os = "espidf")]
pub fn spawn_on_core(
    core: Core,
    priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    // SAFETY: the config struct lives for the duration of the call and
    // `name` is a 'static null-terminated string.
    unsafe {
        let mut cfg = esp_idf_sys::esp_create_default_pthread_config();
        cfg.pin_to_core = core.affinity();
        cfg.prio = i32::from(priority);
        cfg.stack_size = (stack_kb * 1024) as i32;
        cfg.thread_name = name.as_ptr() as *const _;
        let ret = esp_idf_sys::esp_pthread_set_cfg(&cfg);
        if ret != esp_idf_sys::ESP_OK as i32 {
            return Err(io::Error::other(format!("esp_pthread_set_cfg failed: {ret}")));
        }
    }

    let display_name = name.trim_end_matches('\0');
    log::info!(
        "Spawning '{}' on {:?} (pri={}, stack={}KB)",
        display_name,
        core,
        priority,
        stack_kb
    );

    std::thread::Builder::new().name(display_name.into()).spawn(f)
}

/// Host frames are much larger than the target's; never go below this.
#[cfg(not(target_os = "espidf"))]
const SIM_MIN_STACK_KB: usize = 64;

/// Simulation fallback; ignores core affinity and priority.
#[cfg(not(target_os = "espidf"))]
pub fn spawn_on_core(
    _core: Core,
    _priority: u8,
    stack_kb: usize,
    name: &'static str,
    f: impl FnOnce() + Send + 'static,
) -> io::Result<JoinHandle<()>> {
    let display_name = name.trim_end_matches('\0');
    log::info!("Spawning '{}' (sim, no core pinning, stack={}KB)", display_name, stack_kb);

    std::thread::Builder::new()
        .name(display_name.into())
        .stack_size(stack_kb.max(SIM_MIN_STACK_KB) * 1024)
        .spawn(f)
}
