//! Adapters: concrete implementations of the hexagonal port traits.
//!
//! | Adapter    | Implements   | Connects to                    |
//! |------------|--------------|--------------------------------|
//! | `hardware` | AnalogInput  | ESP32 ADC1 oneshot             |
//! |            | OutputPin    | LED GPIOs (sim pins on host)   |
//! | `log_sink` | EventSink    | Serial log output              |
//! | `probe`    | SystemProbe  | FreeRTOS task list / registry  |
//! | `time`     | —            | ESP32 system timer             |

pub mod hardware;
pub mod log_sink;
pub mod probe;
pub mod time;
