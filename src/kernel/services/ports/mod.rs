//! Service ports: traits + data contracts.

pub mod file;
pub mod settings;

pub use file::{validate_name, FileError, FileProvider, Result as FileResult};
pub use settings::{Settings, TerminalSettings};
