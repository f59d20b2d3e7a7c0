//! 标签页管理
//!
//! 标签页有序保存，至少保留一个；活动标签切换时同步通知订阅者

use crate::kernel::services::ports::FileProvider;
use crate::models::{Location, NavigationError, Tab, TabId, DRIVES_LABEL};
use std::sync::mpsc::{self, Receiver, Sender};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TabEvent {
    ActiveTabChanged { id: TabId },
}

pub struct TabManager {
    tabs: Vec<Tab>,
    active: usize,
    next_id: u64,
    subscribers: Vec<Sender<TabEvent>>,
}

impl TabManager {
    /// Starts with a single tab on the drive list.
    pub fn new() -> Self {
        Self::with_initial(DRIVES_LABEL, Location::Drives)
    }

    pub fn with_initial(name: &str, location: Location) -> Self {
        let mut tab = Tab::new(TabId::new(1), name, location);
        tab.set_active(true);
        Self {
            tabs: vec![tab],
            active: 0,
            next_id: 2,
            subscribers: Vec::new(),
        }
    }

    /// Registers a listener; events are sent right after the change that
    /// caused them.
    pub fn subscribe(&mut self) -> Receiver<TabEvent> {
        let (tx, rx) = mpsc::channel();
        self.subscribers.push(tx);
        rx
    }

    pub fn tabs(&self) -> &[Tab] {
        &self.tabs
    }

    pub fn len(&self) -> usize {
        self.tabs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tabs.is_empty()
    }

    pub fn tab(&self, id: TabId) -> Option<&Tab> {
        self.tabs.iter().find(|t| t.id() == id)
    }

    pub fn active_tab(&self) -> &Tab {
        &self.tabs[self.active]
    }

    pub fn active_id(&self) -> TabId {
        self.active_tab().id()
    }

    pub fn active_index(&self) -> usize {
        self.active
    }

    pub fn active_location(&self) -> &Location {
        self.active_tab().location()
    }

    /// Appends a tab and makes it active.
    pub fn add_tab(&mut self, name: &str, location: Location) -> TabId {
        let id = TabId::new(self.next_id);
        self.next_id = self.next_id.saturating_add(1);
        self.tabs.push(Tab::new(id, name, location));

        let index = self.tabs.len() - 1;
        self.activate(index);
        tracing::debug!(%id, "tab added");
        id
    }

    /// Removes `id` unless it is the last tab. When the active tab goes, the
    /// tab that slides into its index becomes active (or the new last tab).
    pub fn close_tab(&mut self, id: TabId) -> bool {
        if self.tabs.len() <= 1 {
            return false;
        }
        let Some(index) = self.index_of(id) else {
            return false;
        };

        self.tabs.remove(index);

        if index == self.active {
            let next = index.min(self.tabs.len() - 1);
            self.active = next;
            self.tabs[next].set_active(true);
            self.notify(self.tabs[next].id());
        } else if self.active > index {
            self.active -= 1;
        }
        tracing::debug!(%id, "tab closed");
        true
    }

    pub fn switch_to_tab(&mut self, id: TabId) -> bool {
        match self.index_of(id) {
            Some(index) => self.activate(index),
            None => false,
        }
    }

    pub fn next_tab(&mut self) -> bool {
        let len = self.tabs.len();
        if len <= 1 {
            return false;
        }
        self.activate((self.active + 1) % len)
    }

    pub fn prev_tab(&mut self) -> bool {
        let len = self.tabs.len();
        if len <= 1 {
            return false;
        }
        let index = if self.active == 0 {
            len - 1
        } else {
            self.active - 1
        };
        self.activate(index)
    }

    /// Points the active tab at `location` without checking it and without
    /// raising an event.
    pub fn update_active_path(&mut self, location: Location) -> bool {
        self.active_tab_mut().set_location(location)
    }

    pub fn navigate_to(
        &mut self,
        location: Location,
        fs: &dyn FileProvider,
    ) -> Result<bool, NavigationError> {
        self.active_tab_mut().navigate_to(location, fs)
    }

    pub fn navigate_up(&mut self, fs: &dyn FileProvider) -> Result<bool, NavigationError> {
        self.active_tab_mut().navigate_up(fs)
    }

    pub fn navigate_home(&mut self, fs: &dyn FileProvider) -> Result<bool, NavigationError> {
        self.active_tab_mut().navigate_home(fs)
    }

    pub fn navigate_back(&mut self) -> Result<(), NavigationError> {
        self.active_tab_mut().navigate_back()
    }

    pub fn navigate_forward(&mut self) -> Result<(), NavigationError> {
        self.active_tab_mut().navigate_forward()
    }

    pub fn can_navigate_back(&self) -> bool {
        self.active_tab().history().can_navigate_back()
    }

    pub fn can_navigate_forward(&self) -> bool {
        self.active_tab().history().can_navigate_forward()
    }

    pub fn clear_history(&mut self) {
        self.active_tab_mut().clear_history();
    }

    fn active_tab_mut(&mut self) -> &mut Tab {
        &mut self.tabs[self.active]
    }

    fn index_of(&self, id: TabId) -> Option<usize> {
        self.tabs.iter().position(|t| t.id() == id)
    }

    fn activate(&mut self, index: usize) -> bool {
        if index == self.active || index >= self.tabs.len() {
            return false;
        }
        self.tabs[self.active].set_active(false);
        self.tabs[index].set_active(true);
        self.active = index;
        self.notify(self.tabs[index].id());
        true
    }

    fn notify(&mut self, id: TabId) {
        let event = TabEvent::ActiveTabChanged { id };
        self.subscribers.retain(|tx| tx.send(event).is_ok());
    }
}

impl Default for TabManager {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/kernel/tabs.rs"]
mod tests;
