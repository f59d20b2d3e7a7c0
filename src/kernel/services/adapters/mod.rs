//! Service adapters: OS specific implementations (filesystem, shell process, settings).

pub mod file;
pub mod paths;
pub mod settings;
pub mod shell;

pub use file::LocalFileProvider;
pub use paths::{ensure_log_dir, get_log_dir, home_dir};
pub use settings::{ensure_settings_file, get_settings_path, load_settings, load_settings_from};
pub use shell::{host_name, open_detached, user_name, ShellIo, ShellLauncher, SystemShell};
