//! Geekhouse environmental-monitor firmware core.
//!
//! Two analog sensors (light, water) sampled on a fixed schedule, a shared
//! snapshot with per-channel readiness flags, a bounded delivery queue to
//! the console, rolling statistics, an adaptive LED blink timer and a
//! liveness monitor.  All ESP-IDF-specific code is guarded by
//! `#[cfg(target_os = "espidf")]` within each module; the host build runs
//! the same task graph over simulated peripherals.

#![deny(unused_must_use)]

pub mod adapters;
pub mod app;
pub mod config;
pub mod diagnostics;
pub mod drivers;
pub mod error;
pub mod pins;
pub mod sensors;
pub mod shared;
pub mod system;
pub mod tasks;

pub use error::{Error, Result};
