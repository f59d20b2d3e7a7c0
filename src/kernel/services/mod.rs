//! Services layer (ports + adapters).
//!
//! - `ports`: contracts/types used across the app (kernel-facing).
//! - `adapters`: OS specific implementations (IO/processes).
//! - `bus`: channel carrying shell output from reader threads to the control thread.

pub mod adapters;
pub mod bus;
pub mod ports;

pub use bus::{terminal_bus, OutputStream, TerminalBusReceiver, TerminalBusSender, TerminalMessage};
