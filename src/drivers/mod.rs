//! Actuator drivers, hardware initialisation, timers and task spawning.

pub mod actuators;
pub mod hw_init;
pub mod soft_timer;
pub mod task_pin;
