//! Application boundary: outbound events and the port traits adapters
//! implement.

pub mod events;
pub mod ports;
