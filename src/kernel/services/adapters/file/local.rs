//! 本地文件系统 Provider
//!
//! 实现 FileProvider trait，操作本地文件系统

use crate::kernel::services::adapters::paths;
use crate::kernel::services::ports::file::{validate_name, FileError, FileProvider, Result};
use crate::models::{Entry, Location};
use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

pub struct LocalFileProvider;

impl LocalFileProvider {
    pub fn new() -> Self {
        Self
    }

    fn list_drives(&self) -> Vec<Entry> {
        #[cfg(windows)]
        {
            (b'A'..=b'Z')
                .map(|letter| PathBuf::from(format!("{}:\\", letter as char)))
                .filter(|root| root.exists())
                .map(Entry::drive)
                .collect()
        }

        #[cfg(not(windows))]
        {
            vec![Entry::drive(PathBuf::from("/"))]
        }
    }

    fn list_dir(&self, path: &Path, show_hidden: bool) -> Result<Vec<Entry>> {
        let read = fs::read_dir(path).map_err(|e| FileError::from_io(e, path))?;

        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in read {
            // Unreadable entries are skipped, the rest of the directory still lists.
            let Ok(entry) = entry else {
                continue;
            };
            let entry_path = entry.path();
            let Ok(metadata) = fs::metadata(&entry_path).or_else(|_| entry.metadata()) else {
                continue;
            };

            let name = entry.file_name().to_string_lossy().into_owned();
            if !show_hidden && is_hidden(&name, &metadata) {
                continue;
            }

            let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
            if metadata.is_dir() {
                dirs.push(Entry::directory(name, entry_path, modified));
            } else {
                files.push(Entry::file(name, entry_path, modified, metadata.len()));
            }
        }

        dirs.sort_by_key(|e| e.name.to_lowercase());
        files.sort_by_key(|e| e.name.to_lowercase());

        let mut entries = Vec::with_capacity(dirs.len() + files.len() + 1);
        if let Some(parent) = self.parent(path) {
            entries.push(Entry::parent_ref(parent));
        }
        entries.extend(dirs);
        entries.extend(files);
        Ok(entries)
    }
}

impl Default for LocalFileProvider {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(windows)]
fn is_hidden(_name: &str, metadata: &fs::Metadata) -> bool {
    use std::os::windows::fs::MetadataExt;
    const FILE_ATTRIBUTE_HIDDEN: u32 = 0x2;
    metadata.file_attributes() & FILE_ATTRIBUTE_HIDDEN != 0
}

#[cfg(not(windows))]
fn is_hidden(name: &str, _metadata: &fs::Metadata) -> bool {
    name.starts_with('.')
}

/// Symlinks are recreated as links, never followed, so a link back to an
/// ancestor cannot recurse.
fn copy_recursive(from: &Path, to: &Path) -> Result<()> {
    let meta = fs::symlink_metadata(from).map_err(|e| FileError::from_io(e, from))?;
    if meta.file_type().is_symlink() {
        return copy_symlink(from, to);
    }
    if !meta.is_dir() {
        fs::copy(from, to).map_err(|e| FileError::from_io(e, from))?;
        return Ok(());
    }

    fs::create_dir_all(to).map_err(|e| FileError::from_io(e, to))?;
    for entry in fs::read_dir(from).map_err(|e| FileError::from_io(e, from))? {
        let entry = entry?;
        copy_recursive(&entry.path(), &to.join(entry.file_name()))?;
    }
    Ok(())
}

fn copy_symlink(from: &Path, to: &Path) -> Result<()> {
    let target = fs::read_link(from).map_err(|e| FileError::from_io(e, from))?;

    #[cfg(unix)]
    let result = std::os::unix::fs::symlink(&target, to);

    #[cfg(windows)]
    let result = if from.is_dir() {
        std::os::windows::fs::symlink_dir(&target, to)
    } else {
        std::os::windows::fs::symlink_file(&target, to)
    };

    result.map_err(|e| FileError::from_io(e, to))
}

impl FileProvider for LocalFileProvider {
    fn list_directory(&self, location: &Location, show_hidden: bool) -> Result<Vec<Entry>> {
        match location {
            Location::Drives => Ok(self.list_drives()),
            Location::Dir(path) => {
                if path.exists() && !path.is_dir() {
                    return Err(FileError::NotADirectory(path.clone()));
                }
                self.list_dir(path, show_hidden)
            }
        }
    }

    fn create_directory(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = parent.join(name.trim());
        if path.exists() {
            return Err(FileError::AlreadyExists(path));
        }
        fs::create_dir(&path).map_err(|e| FileError::from_io(e, &path))?;
        Ok(path)
    }

    fn create_file(&self, parent: &Path, name: &str) -> Result<PathBuf> {
        validate_name(name)?;
        let path = parent.join(name.trim());
        fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .map_err(|e| FileError::from_io(e, &path))?;
        Ok(path)
    }

    fn delete(&self, path: &Path) -> Result<()> {
        let meta = fs::symlink_metadata(path).map_err(|e| FileError::from_io(e, path))?;
        let result = if meta.is_dir() {
            fs::remove_dir_all(path)
        } else {
            fs::remove_file(path)
        };
        result.map_err(|e| FileError::from_io(e, path))
    }

    fn move_item(&self, from: &Path, to: &Path) -> Result<()> {
        if fs::symlink_metadata(from).is_err() {
            return Err(FileError::NotFound(from.to_path_buf()));
        }
        if to.exists() {
            return Err(FileError::AlreadyExists(to.to_path_buf()));
        }
        if from.is_dir() && to.starts_with(from) {
            return Err(FileError::InvalidPath(to.display().to_string()));
        }
        fs::rename(from, to).map_err(|e| FileError::from_io(e, from))
    }

    fn copy(&self, from: &Path, to: &Path) -> Result<()> {
        if !from.exists() {
            return Err(FileError::NotFound(from.to_path_buf()));
        }
        if to.exists() {
            return Err(FileError::AlreadyExists(to.to_path_buf()));
        }
        if from.is_dir() && to.starts_with(from) {
            return Err(FileError::InvalidPath(to.display().to_string()));
        }
        copy_recursive(from, to)
    }

    fn parent(&self, path: &Path) -> Option<PathBuf> {
        path.parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map(Path::to_path_buf)
    }

    fn is_dir(&self, path: &Path) -> bool {
        path.is_dir()
    }

    fn can_enter(&self, path: &Path) -> bool {
        fs::read_dir(path).is_ok()
    }

    fn home_dir(&self) -> Option<PathBuf> {
        paths::home_dir()
    }
}

#[cfg(test)]
#[path = "../../../../../tests/unit/kernel/services/adapters/file/local.rs"]
mod tests;
