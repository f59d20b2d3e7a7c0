//! 工作台：文件浏览器的协调层
//!
//! 职责：
//! - 持有标签页、目录树缓存与当前目录列表
//! - 把导航结果同步到列表、目录树和终端
//! - 文件操作（复制/剪切/粘贴、重命名、删除、新建）
//! - 产生 `WorkbenchEvent` 供展示层拉取

use crate::kernel::services::adapters::shell::{open_detached, ShellLauncher};
use crate::kernel::services::ports::{validate_name, FileError, FileProvider, Settings};
use crate::kernel::{TabEvent, TabManager, TerminalSession, TerminalState};
use crate::models::{
    DirectoryTreeCache, Entry, Location, NavigationError, NodeId, TabId,
};
use std::mem;
use std::path::{Path, PathBuf};
use std::sync::mpsc::Receiver;
use std::sync::Arc;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Info,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WorkbenchEvent {
    ActiveTabChanged { id: TabId },
    ListingChanged { location: Location },
    TerminalOutput { lines: usize },
    TerminalCloseRequested,
    Notice { level: NoticeLevel, message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClipboardMode {
    Copy,
    Cut,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClipboardItem {
    pub path: PathBuf,
    pub mode: ClipboardMode,
}

pub struct Workbench {
    fs: Arc<dyn FileProvider>,
    tabs: TabManager,
    tab_events: Receiver<TabEvent>,
    tree: DirectoryTreeCache,
    listing: Vec<Entry>,
    show_hidden: bool,
    clipboard: Option<ClipboardItem>,
    launcher: Option<Box<dyn ShellLauncher>>,
    terminal: Option<TerminalSession>,
    terminal_visible: bool,
    events: Vec<WorkbenchEvent>,
}

impl Workbench {
    pub fn new(
        settings: &Settings,
        fs: Arc<dyn FileProvider>,
        launcher: Box<dyn ShellLauncher>,
    ) -> Self {
        let start = settings
            .start_path
            .as_deref()
            .filter(|p| fs.can_enter(p))
            .map(Location::dir);
        if let (Some(path), None) = (&settings.start_path, &start) {
            tracing::warn!(path = %path.display(), "start path is not accessible, showing drives");
        }

        let mut tabs = match &start {
            Some(location) => TabManager::with_initial("", location.clone()),
            None => TabManager::new(),
        };
        let tab_events = tabs.subscribe();
        let tree = DirectoryTreeCache::new(&*fs);

        let mut workbench = Self {
            fs,
            tabs,
            tab_events,
            tree,
            listing: Vec::new(),
            show_hidden: settings.show_hidden,
            clipboard: None,
            launcher: Some(launcher),
            terminal: None,
            terminal_visible: false,
            events: Vec::new(),
        };

        workbench.reload();
        if start.is_some() {
            workbench.reveal_in_tree();
        }
        if settings.terminal.open_on_start {
            workbench.show_terminal();
        }
        workbench
    }

    pub fn location(&self) -> &Location {
        self.tabs.active_location()
    }

    pub fn listing(&self) -> &[Entry] {
        &self.listing
    }

    pub fn tabs(&self) -> &TabManager {
        &self.tabs
    }

    pub fn tree(&self) -> &DirectoryTreeCache {
        &self.tree
    }

    pub fn show_hidden(&self) -> bool {
        self.show_hidden
    }

    pub fn clipboard(&self) -> Option<&ClipboardItem> {
        self.clipboard.as_ref()
    }

    pub fn terminal(&self) -> Option<&TerminalSession> {
        self.terminal.as_ref()
    }

    pub fn terminal_visible(&self) -> bool {
        self.terminal_visible
    }

    pub fn take_events(&mut self) -> Vec<WorkbenchEvent> {
        mem::take(&mut self.events)
    }

    /// Re-lists the active location. A failed listing leaves an empty list
    /// and raises a notice.
    pub fn reload(&mut self) -> bool {
        let location = self.location().clone();
        match self.fs.list_directory(&location, self.show_hidden) {
            Ok(entries) => {
                self.listing = entries;
                self.events.push(WorkbenchEvent::ListingChanged { location });
                true
            }
            Err(e) => {
                tracing::warn!(%location, error = %e, "list directory failed");
                self.listing.clear();
                let message = if e.is_access_denied() {
                    "Access denied to this directory.".to_string()
                } else {
                    e.to_string()
                };
                self.notice(NoticeLevel::Warning, message);
                false
            }
        }
    }

    // ---- navigation ----

    pub fn navigate_to(&mut self, location: Location) -> bool {
        let result = self.tabs.navigate_to(location, &*self.fs);
        self.finish_navigation(result)
    }

    pub fn navigate_up(&mut self) -> bool {
        let result = self.tabs.navigate_up(&*self.fs);
        self.finish_navigation(result)
    }

    pub fn navigate_home(&mut self) -> bool {
        let result = self.tabs.navigate_home(&*self.fs);
        self.finish_navigation(result)
    }

    pub fn navigate_back(&mut self) -> bool {
        let result = self.tabs.navigate_back().map(|()| true);
        self.finish_navigation(result)
    }

    pub fn navigate_forward(&mut self) -> bool {
        let result = self.tabs.navigate_forward().map(|()| true);
        self.finish_navigation(result)
    }

    /// Opens the listing row at `index`: folders, drives and `..` navigate,
    /// files go to the desktop's default application.
    pub fn open_entry(&mut self, index: usize) -> bool {
        let Some(entry) = self.listing.get(index).cloned() else {
            return false;
        };

        if let Some(location) = entry.location() {
            return self.navigate_to(location);
        }

        match open_detached(&entry.path) {
            Ok(()) => {
                tracing::info!(path = %entry.path.display(), "opened file");
                true
            }
            Err(e) => {
                tracing::warn!(path = %entry.path.display(), error = %e, "open file failed");
                self.notice(NoticeLevel::Error, format!("Error opening file: {}", e));
                false
            }
        }
    }

    fn finish_navigation(&mut self, result: Result<bool, NavigationError>) -> bool {
        match result {
            Ok(true) => {
                self.on_location_changed();
                true
            }
            Ok(false) => false,
            Err(NavigationError::InvalidTarget(location)) => {
                tracing::warn!(%location, "navigation refused");
                self.notice(NoticeLevel::Warning, format!("Cannot open {}", location));
                false
            }
            Err(e) => {
                tracing::debug!(error = %e, "navigation refused");
                false
            }
        }
    }

    fn on_location_changed(&mut self) {
        self.reload();
        self.sync_terminal_directory();
    }

    // ---- tabs ----

    /// Opens a tab on `location`, or on the current location when `None`.
    pub fn new_tab(&mut self, location: Option<Location>) -> TabId {
        let location = location.unwrap_or_else(|| self.location().clone());
        let id = self.tabs.add_tab("", location);
        self.drain_tab_events();
        id
    }

    pub fn close_tab(&mut self, id: TabId) -> bool {
        let closed = self.tabs.close_tab(id);
        self.drain_tab_events();
        closed
    }

    pub fn switch_to_tab(&mut self, id: TabId) -> bool {
        let switched = self.tabs.switch_to_tab(id);
        self.drain_tab_events();
        switched
    }

    pub fn next_tab(&mut self) -> bool {
        let switched = self.tabs.next_tab();
        self.drain_tab_events();
        switched
    }

    pub fn prev_tab(&mut self) -> bool {
        let switched = self.tabs.prev_tab();
        self.drain_tab_events();
        switched
    }

    fn drain_tab_events(&mut self) {
        let mut changed = false;
        while let Ok(TabEvent::ActiveTabChanged { id }) = self.tab_events.try_recv() {
            self.events.push(WorkbenchEvent::ActiveTabChanged { id });
            changed = true;
        }
        if changed {
            self.on_location_changed();
        }
    }

    // ---- hidden files / tree ----

    /// Flips the hidden-files flag and re-lists. Already expanded tree nodes
    /// keep their children until [`rebuild_tree`](Self::rebuild_tree).
    pub fn toggle_hidden(&mut self) -> bool {
        self.show_hidden = !self.show_hidden;
        tracing::info!(show_hidden = self.show_hidden, "hidden files toggled");
        self.reload();
        self.show_hidden
    }

    pub fn rebuild_tree(&mut self) {
        self.tree.rebuild(&*self.fs);
    }

    pub fn expand_tree_node(&mut self, id: NodeId) -> bool {
        match self.tree.expand(id, &*self.fs, self.show_hidden) {
            Ok(_) => true,
            Err(e) => {
                self.notice(NoticeLevel::Warning, e.to_string());
                false
            }
        }
    }

    pub fn collapse_tree_node(&mut self, id: NodeId) {
        self.tree.collapse(id);
    }

    /// Selects a tree node and navigates the active tab to it.
    pub fn select_tree_node(&mut self, id: NodeId) -> bool {
        match self.tree.select(id, &*self.fs, self.show_hidden) {
            Some(location) => self.navigate_to(location),
            None => false,
        }
    }

    /// Expands the tree down to the active directory.
    pub fn reveal_in_tree(&mut self) -> Option<NodeId> {
        let path = self.location().as_path()?.to_path_buf();
        self.tree.reveal(&path, &*self.fs, self.show_hidden)
    }

    // ---- file operations ----

    pub fn copy_item(&mut self, path: &Path) {
        self.set_clipboard(path, ClipboardMode::Copy);
    }

    pub fn cut_item(&mut self, path: &Path) {
        self.set_clipboard(path, ClipboardMode::Cut);
    }

    fn set_clipboard(&mut self, path: &Path, mode: ClipboardMode) {
        self.clipboard = Some(ClipboardItem {
            path: path.to_path_buf(),
            mode,
        });
    }

    /// Copies or moves the clipboard item into the active directory under its
    /// own name. Returns the new path.
    pub fn paste(&mut self) -> Option<PathBuf> {
        let item = self.clipboard.clone()?;
        let dir = self.current_dir("paste")?;
        let Some(name) = item.path.file_name() else {
            self.notice(
                NoticeLevel::Warning,
                format!("Cannot paste {}", item.path.display()),
            );
            return None;
        };
        let target = dir.join(name);

        let result = match item.mode {
            ClipboardMode::Copy => self.fs.copy(&item.path, &target),
            ClipboardMode::Cut => self.fs.move_item(&item.path, &target),
        };
        if let Err(e) = result {
            self.file_error("Error pasting item", &e);
            return None;
        }

        if item.mode == ClipboardMode::Cut {
            self.clipboard = None;
        }
        tracing::info!(from = %item.path.display(), to = %target.display(), mode = ?item.mode, "pasted");
        self.reload();
        Some(target)
    }

    /// Renames `path` inside its own directory.
    pub fn rename_item(&mut self, path: &Path, new_name: &str) -> Option<PathBuf> {
        if let Err(e) = validate_name(new_name) {
            self.file_error("Error renaming item", &e);
            return None;
        }
        let Some(parent) = self.fs.parent(path) else {
            let e = FileError::InvalidPath(path.display().to_string());
            self.file_error("Error renaming item", &e);
            return None;
        };

        let target = parent.join(new_name.trim());
        if let Err(e) = self.fs.move_item(path, &target) {
            self.file_error("Error renaming item", &e);
            return None;
        }
        self.reload();
        Some(target)
    }

    pub fn delete_item(&mut self, path: &Path) -> bool {
        if let Err(e) = self.fs.delete(path) {
            self.file_error("Error deleting item", &e);
            return false;
        }
        if self
            .clipboard
            .as_ref()
            .is_some_and(|item| item.path.starts_with(path))
        {
            self.clipboard = None;
        }
        tracing::info!(path = %path.display(), "deleted");
        self.reload();
        true
    }

    pub fn create_folder(&mut self, name: &str) -> Option<PathBuf> {
        let dir = self.current_dir("create a folder")?;
        match self.fs.create_directory(&dir, name) {
            Ok(path) => {
                self.reload();
                Some(path)
            }
            Err(e) => {
                self.file_error("Error creating folder", &e);
                None
            }
        }
    }

    pub fn create_text_file(&mut self, name: &str) -> Option<PathBuf> {
        let dir = self.current_dir("create a file")?;
        match self.fs.create_file(&dir, name) {
            Ok(path) => {
                self.reload();
                Some(path)
            }
            Err(e) => {
                self.file_error("Error creating file", &e);
                None
            }
        }
    }

    fn current_dir(&mut self, action: &str) -> Option<PathBuf> {
        match self.location().as_path() {
            Some(path) => Some(path.to_path_buf()),
            None => {
                self.notice(
                    NoticeLevel::Warning,
                    format!("Cannot {} in the drive list", action),
                );
                None
            }
        }
    }

    fn file_error(&mut self, context: &str, err: &FileError) {
        tracing::warn!(error = %err, "{}", context);
        self.notice(NoticeLevel::Error, format!("{}: {}", context, err));
    }

    // ---- terminal ----

    /// Shows the terminal, starting the shell in the active directory on
    /// first use.
    pub fn show_terminal(&mut self) -> bool {
        if self.terminal.is_none() {
            let Some(launcher) = self.launcher.take() else {
                self.notice(NoticeLevel::Warning, "Terminal is no longer available");
                return false;
            };
            self.terminal = Some(TerminalSession::new(launcher));
        }

        let cwd = self.location().as_path().map(Path::to_path_buf);
        let Some(terminal) = self.terminal.as_mut() else {
            return false;
        };

        if terminal.state() == TerminalState::Uninitialized {
            if let Err(e) = terminal.initialize(cwd.as_deref()) {
                self.notice(NoticeLevel::Error, e.to_string());
                return false;
            }
        }

        self.terminal_visible = true;
        self.sync_terminal_directory();
        true
    }

    pub fn hide_terminal(&mut self) {
        self.terminal_visible = false;
    }

    /// Close button on the terminal panel: hides it, the shell keeps running.
    pub fn request_terminal_close(&mut self) {
        self.events.push(WorkbenchEvent::TerminalCloseRequested);
        self.hide_terminal();
    }

    pub fn submit_command(&mut self, text: &str) -> bool {
        let Some(terminal) = self.terminal.as_mut() else {
            self.notice(NoticeLevel::Warning, "Terminal is not running");
            return false;
        };
        match terminal.submit_command(text) {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "terminal command failed");
                false
            }
        }
    }

    /// Moves pending shell output into the terminal buffer.
    pub fn pump_terminal(&mut self) -> usize {
        let lines = self.terminal.as_mut().map_or(0, TerminalSession::pump);
        if lines > 0 {
            self.events.push(WorkbenchEvent::TerminalOutput { lines });
        }
        lines
    }

    /// Tears down the terminal; the shell process is killed.
    pub fn unload(&mut self) {
        if let Some(mut terminal) = self.terminal.take() {
            terminal.shutdown();
        }
        self.terminal_visible = false;
        tracing::info!("workbench unloaded");
    }

    fn sync_terminal_directory(&mut self) {
        if !self.terminal_visible {
            return;
        }
        let Some(path) = self.location().as_path().map(Path::to_path_buf) else {
            return;
        };
        let Some(terminal) = self.terminal.as_mut().filter(|t| t.is_running()) else {
            return;
        };
        if terminal.working_directory() == Some(path.as_path()) {
            return;
        }
        if let Err(e) = terminal.set_working_directory(&path) {
            tracing::warn!(path = %path.display(), error = %e, "terminal cd failed");
        }
    }

    fn notice(&mut self, level: NoticeLevel, message: impl Into<String>) {
        self.events.push(WorkbenchEvent::Notice {
            level,
            message: message.into(),
        });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/app/workbench.rs"]
mod tests;
