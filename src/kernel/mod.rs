//! Headless file-browsing core (tabs, terminal session, services).

pub mod services;
pub mod tabs;
pub mod terminal;

pub use tabs::{TabEvent, TabManager};
pub use terminal::{LineKind, ShellInput, TerminalError, TerminalLine, TerminalSession, TerminalState};
