//! 导航历史：每个标签页独立的后退/前进栈

use super::Location;
use crate::kernel::services::ports::FileProvider;
use std::fmt;
use std::mem;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    InvalidTarget(Location),
    NoParent,
    HistoryEmpty,
}

impl fmt::Display for NavigationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NavigationError::InvalidTarget(location) => {
                write!(f, "cannot open {}", location)
            }
            NavigationError::NoParent => write!(f, "already at the top level"),
            NavigationError::HistoryEmpty => write!(f, "no more history"),
        }
    }
}

impl std::error::Error for NavigationError {}

#[derive(Debug, Clone)]
pub struct NavigationHistory {
    back: Vec<Location>,
    forward: Vec<Location>,
    current: Location,
}

impl NavigationHistory {
    pub fn new(start: Location) -> Self {
        Self {
            back: Vec::new(),
            forward: Vec::new(),
            current: start,
        }
    }

    pub fn current(&self) -> &Location {
        &self.current
    }

    /// Moves to `target` after checking it can be entered. Returns
    /// `Ok(false)` when already there.
    pub fn navigate_to(
        &mut self,
        target: Location,
        fs: &dyn FileProvider,
    ) -> Result<bool, NavigationError> {
        let valid = match &target {
            Location::Drives => true,
            Location::Dir(path) => fs.can_enter(path),
        };
        if !valid {
            return Err(NavigationError::InvalidTarget(target));
        }
        Ok(self.record(target))
    }

    /// Pushes `target` without touching the filesystem. Any forward history
    /// is dropped.
    pub fn record(&mut self, target: Location) -> bool {
        if target == self.current {
            return false;
        }
        let previous = mem::replace(&mut self.current, target);
        self.back.push(previous);
        self.forward.clear();
        true
    }

    pub fn navigate_up(&mut self, fs: &dyn FileProvider) -> Result<bool, NavigationError> {
        let parent = match &self.current {
            Location::Drives => None,
            Location::Dir(path) => fs.parent(path),
        };
        let parent = parent.ok_or(NavigationError::NoParent)?;
        self.navigate_to(Location::Dir(parent), fs)
    }

    pub fn navigate_home(&mut self, fs: &dyn FileProvider) -> Result<bool, NavigationError> {
        let Some(home) = fs.home_dir() else {
            return Err(NavigationError::InvalidTarget(Location::Drives));
        };
        self.navigate_to(Location::Dir(home), fs)
    }

    pub fn navigate_back(&mut self) -> Result<(), NavigationError> {
        let previous = self.back.pop().ok_or(NavigationError::HistoryEmpty)?;
        let current = mem::replace(&mut self.current, previous);
        self.forward.push(current);
        Ok(())
    }

    pub fn navigate_forward(&mut self) -> Result<(), NavigationError> {
        let next = self.forward.pop().ok_or(NavigationError::HistoryEmpty)?;
        let current = mem::replace(&mut self.current, next);
        self.back.push(current);
        Ok(())
    }

    pub fn can_navigate_back(&self) -> bool {
        !self.back.is_empty()
    }

    pub fn can_navigate_forward(&self) -> bool {
        !self.forward.is_empty()
    }

    pub fn clear_history(&mut self) {
        self.back.clear();
        self.forward.clear();
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/history.rs"]
mod tests;
