//! 文件系统 Provider trait
//!
//! 目录列表与文件操作的抽象；核心状态机只通过它访问文件系统

use crate::models::{Entry, Location};
use std::io;
use std::path::{Path, PathBuf};

pub type Result<T> = std::result::Result<T, FileError>;

#[derive(Debug)]
pub enum FileError {
    Io(io::Error),
    NotFound(PathBuf),
    PermissionDenied(PathBuf),
    AlreadyExists(PathBuf),
    NotADirectory(PathBuf),
    InvalidPath(String),
}

impl FileError {
    /// Maps the io kinds callers react to onto dedicated variants.
    pub fn from_io(err: io::Error, path: &Path) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FileError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FileError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => FileError::AlreadyExists(path.to_path_buf()),
            _ => FileError::Io(err),
        }
    }

    pub fn is_access_denied(&self) -> bool {
        matches!(self, FileError::PermissionDenied(_))
    }
}

impl std::fmt::Display for FileError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileError::Io(e) => write!(f, "IO error: {}", e),
            FileError::NotFound(p) => write!(f, "Not found: {}", p.display()),
            FileError::PermissionDenied(p) => write!(f, "Access denied: {}", p.display()),
            FileError::AlreadyExists(p) => write!(f, "Already exists: {}", p.display()),
            FileError::NotADirectory(p) => write!(f, "Not a directory: {}", p.display()),
            FileError::InvalidPath(s) => write!(f, "Invalid path: {}", s),
        }
    }
}

impl std::error::Error for FileError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            FileError::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<io::Error> for FileError {
    fn from(e: io::Error) -> Self {
        FileError::Io(e)
    }
}

/// Rejects names that would escape the parent directory.
pub fn validate_name(name: &str) -> Result<()> {
    let trimmed = name.trim();
    if trimmed.is_empty() || trimmed == "." || trimmed == ".." {
        return Err(FileError::InvalidPath(name.to_string()));
    }
    if trimmed.contains(['/', '\\']) {
        return Err(FileError::InvalidPath(name.to_string()));
    }
    Ok(())
}

pub trait FileProvider: Send + Sync {
    /// Lists `location`. Directories get a leading `..` entry unless they are
    /// a filesystem root; entries that cannot be read are skipped.
    fn list_directory(&self, location: &Location, show_hidden: bool) -> Result<Vec<Entry>>;

    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf>;

    fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf>;

    /// Removes a file, or a directory with everything below it.
    fn delete(&self, path: &Path) -> Result<()>;

    fn move_item(&self, from: &Path, to: &Path) -> Result<()>;

    /// Copies a file, or a directory recursively.
    fn copy(&self, from: &Path, to: &Path) -> Result<()>;

    fn parent(&self, path: &Path) -> Option<PathBuf>;

    fn is_dir(&self, path: &Path) -> bool;

    /// True when `path` is a directory whose contents can be listed.
    fn can_enter(&self, path: &Path) -> bool;

    fn home_dir(&self) -> Option<PathBuf>;
}

#[cfg(test)]
#[path = "../../../../tests/unit/kernel/services/ports/file.rs"]
mod tests;
