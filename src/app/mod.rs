//! 应用层：工作台与控制台前端

pub mod console;
pub mod workbench;

pub use console::{Console, ConsoleCommand, Flow, ParseError};
pub use workbench::{ClipboardItem, ClipboardMode, NoticeLevel, Workbench, WorkbenchEvent};
