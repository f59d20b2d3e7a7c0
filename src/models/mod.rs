//! 数据模型层

pub mod dir_tree;
pub mod entry;
pub mod history;
pub mod tab;

pub use dir_tree::{DirTreeError, DirectoryTreeCache, LoadState, NodeId, NodeKind, TreeRow};
pub use entry::{format_size, Entry, EntryKind, Location, DRIVES_LABEL};
pub use history::{NavigationError, NavigationHistory};
pub use tab::{Tab, TabId};
