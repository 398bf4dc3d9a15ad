//! Monotonic uptime clock.
//!
//! - **`target_os = "espidf"`** — wraps `esp_timer_get_time()` from the
//!   ESP-IDF high-resolution timer (microsecond precision, monotonic).
//! - **`not(target_os = "espidf")`** — `std::time::Instant` measured from a
//!   process-wide boot instant, so every `Uptime` agrees on "since boot".

#[cfg(not(target_os = "espidf"))]
static BOOT: std::sync::OnceLock<std::time::Instant> = std::sync::OnceLock::new();

/// Milliseconds/microseconds since boot.
#[derive(Debug, Clone, Copy)]
pub struct Uptime {
    _private: (),
}

impl Default for Uptime {
    fn default() -> Self {
        Self::new()
    }
}

impl Uptime {
    pub fn new() -> Self {
        #[cfg(not(target_os = "espidf"))]
        BOOT.get_or_init(std::time::Instant::now);
        Self { _private: () }
    }

    /// Microseconds since boot (monotonic).
    #[cfg(target_os = "espidf")]
    pub fn uptime_us(&self) -> u64 {
        (unsafe { esp_idf_svc::sys::esp_timer_get_time() }) as u64
    }

    /// Microseconds since boot (monotonic).
    #[cfg(not(target_os = "espidf"))]
    pub fn uptime_us(&self) -> u64 {
        BOOT.get_or_init(std::time::Instant::now).elapsed().as_micros() as u64
    }

    /// Milliseconds since boot.  Wraps after ~49 days, like the tick
    /// counter it mirrors.
    pub fn uptime_ms(&self) -> u32 {
        (self.uptime_us() / 1000) as u32
    }

    pub fn uptime_secs(&self) -> u64 {
        self.uptime_us() / 1_000_000
    }
}
