use super::history::{NavigationError, NavigationHistory};
use super::Location;
use crate::kernel::services::ports::FileProvider;
use std::fmt;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TabId(u64);

impl TabId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub fn raw(self) -> u64 {
        self.0
    }
}

impl fmt::Display for TabId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "tab-{}", self.0)
    }
}

/// A navigation context. The current location lives in its history.
#[derive(Debug, Clone)]
pub struct Tab {
    id: TabId,
    history: NavigationHistory,
    display_name: String,
    is_active: bool,
}

impl Tab {
    pub fn new(id: TabId, name: impl Into<String>, location: Location) -> Self {
        let name = name.into();
        let display_name = if name.trim().is_empty() {
            location.display_name()
        } else {
            name
        };
        Self {
            id,
            history: NavigationHistory::new(location),
            display_name,
            is_active: false,
        }
    }

    pub fn id(&self) -> TabId {
        self.id
    }

    pub fn location(&self) -> &Location {
        self.history.current()
    }

    pub fn display_name(&self) -> &str {
        &self.display_name
    }

    pub fn is_active(&self) -> bool {
        self.is_active
    }

    pub fn history(&self) -> &NavigationHistory {
        &self.history
    }

    pub(crate) fn set_active(&mut self, active: bool) {
        self.is_active = active;
    }

    pub(crate) fn set_location(&mut self, location: Location) -> bool {
        let changed = self.history.record(location);
        if changed {
            self.refresh_name();
        }
        changed
    }

    pub(crate) fn navigate_to(
        &mut self,
        location: Location,
        fs: &dyn FileProvider,
    ) -> Result<bool, NavigationError> {
        let changed = self.history.navigate_to(location, fs)?;
        if changed {
            self.refresh_name();
        }
        Ok(changed)
    }

    pub(crate) fn navigate_up(&mut self, fs: &dyn FileProvider) -> Result<bool, NavigationError> {
        let changed = self.history.navigate_up(fs)?;
        if changed {
            self.refresh_name();
        }
        Ok(changed)
    }

    pub(crate) fn navigate_home(
        &mut self,
        fs: &dyn FileProvider,
    ) -> Result<bool, NavigationError> {
        let changed = self.history.navigate_home(fs)?;
        if changed {
            self.refresh_name();
        }
        Ok(changed)
    }

    pub(crate) fn navigate_back(&mut self) -> Result<(), NavigationError> {
        self.history.navigate_back()?;
        self.refresh_name();
        Ok(())
    }

    pub(crate) fn navigate_forward(&mut self) -> Result<(), NavigationError> {
        self.history.navigate_forward()?;
        self.refresh_name();
        Ok(())
    }

    pub(crate) fn clear_history(&mut self) {
        self.history.clear_history();
    }

    fn refresh_name(&mut self) {
        self.display_name = self.history.current().display_name();
    }
}

impl fmt::Display for Tab {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.display_name)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/models/tab.rs"]
mod tests;
