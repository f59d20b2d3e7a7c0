//! 目录列表条目与位置

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Label shown for the drive list pseudo-location.
pub const DRIVES_LABEL: &str = "This PC";

const SIZE_UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Where a tab points: either the drive list or a real directory.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Location {
    Drives,
    Dir(PathBuf),
}

impl Location {
    pub fn dir(path: impl Into<PathBuf>) -> Self {
        Location::Dir(path.into())
    }

    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Location::Drives => None,
            Location::Dir(path) => Some(path),
        }
    }

    pub fn is_drives(&self) -> bool {
        matches!(self, Location::Drives)
    }

    /// Last path segment, the full path for a filesystem root, or the
    /// drive list label. Never empty.
    pub fn display_name(&self) -> String {
        let Location::Dir(path) = self else {
            return DRIVES_LABEL.to_string();
        };

        if let Some(name) = path.file_name().filter(|n| !n.is_empty()) {
            return name.to_string_lossy().into_owned();
        }

        let full = path.to_string_lossy();
        if full.is_empty() {
            DRIVES_LABEL.to_string()
        } else {
            full.into_owned()
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Location::Drives => f.write_str("Drives"),
            Location::Dir(path) => write!(f, "{}", path.display()),
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum EntryKind {
    ParentRef,
    Directory,
    Drive,
    File,
}

impl EntryKind {
    pub fn is_navigable(self) -> bool {
        !matches!(self, EntryKind::File)
    }
}

/// One row of a directory listing. `size` is only non-zero for files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub name: String,
    pub path: PathBuf,
    pub kind: EntryKind,
    pub modified: SystemTime,
    pub size: u64,
}

impl Entry {
    pub fn parent_ref(parent: PathBuf) -> Self {
        Self {
            name: "..".to_string(),
            path: parent,
            kind: EntryKind::ParentRef,
            modified: SystemTime::now(),
            size: 0,
        }
    }

    pub fn directory(name: String, path: PathBuf, modified: SystemTime) -> Self {
        Self {
            name,
            path,
            kind: EntryKind::Directory,
            modified,
            size: 0,
        }
    }

    pub fn drive(root: PathBuf) -> Self {
        Self {
            name: root.to_string_lossy().into_owned(),
            path: root,
            kind: EntryKind::Drive,
            modified: SystemTime::UNIX_EPOCH,
            size: 0,
        }
    }

    pub fn file(name: String, path: PathBuf, modified: SystemTime, size: u64) -> Self {
        Self {
            name,
            path,
            kind: EntryKind::File,
            modified,
            size,
        }
    }

    /// Target location when the entry is opened, `None` for files.
    pub fn location(&self) -> Option<Location> {
        self.kind
            .is_navigable()
            .then(|| Location::Dir(self.path.clone()))
    }
}

/// Human readable size; zero is shown as `Folder` the way the list column does.
pub fn format_size(size: u64) -> String {
    if size == 0 {
        return "Folder".to_string();
    }

    let mut size = size;
    let mut order = 0;
    while size >= 1024 && order < SIZE_UNITS.len() - 1 {
        order += 1;
        size /= 1024;
    }
    format!("{} {}", size, SIZE_UNITS[order])
}

#[cfg(test)]
#[path = "../../tests/unit/models/entry.rs"]
mod tests;
