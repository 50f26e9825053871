//! Tab Manager
//!
//! Owns every open tab together with its engine view. The active tab is an
//! id into the same collection, never a second owner.

use parking_lot::RwLock;
use std::sync::Arc;

use crate::engine::{EngineProfile, EngineView, ViewFactory};
use crate::error::TabError;
use crate::tab::Tab;
use crate::Result;

/// Outcome of an engine URL change for a live tab
#[derive(Debug, Clone)]
pub struct UrlChange {
    /// The tab after the update
    pub tab: Tab,
    /// Whether the tab is the focused one (address bar follows it)
    pub is_active: bool,
}

struct TabEntry {
    tab: Tab,
    view: Arc<dyn EngineView>,
}

#[derive(Default)]
struct TabSet {
    /// Tab strip order
    entries: Vec<TabEntry>,
    active_id: Option<String>,
}

impl TabSet {
    fn position(&self, tab_id: &str) -> Option<usize> {
        self.entries.iter().position(|entry| entry.tab.id == tab_id)
    }

    fn get_mut(&mut self, tab_id: &str) -> Option<&mut TabEntry> {
        self.entries.iter_mut().find(|entry| entry.tab.id == tab_id)
    }

    fn active(&self) -> Option<&TabEntry> {
        let id = self.active_id.as_deref()?;
        self.entries.iter().find(|entry| entry.tab.id == id)
    }
}

pub struct TabManager {
    state: Arc<RwLock<TabSet>>,
    factory: Arc<dyn ViewFactory>,
}

impl TabManager {
    pub fn new(factory: Arc<dyn ViewFactory>) -> Self {
        Self {
            state: Arc::new(RwLock::new(TabSet::default())),
            factory,
        }
    }

    /// Apply profile-wide engine settings
    pub fn apply_profile(&self, profile: &EngineProfile) {
        tracing::debug!(user_agent = %profile.user_agent, "Applying engine profile");
        self.factory.apply_profile(profile);
    }

    /// Create a new tab loading `url` and make it the active one
    pub fn create_tab(&self, url: String) -> Result<Tab> {
        let tab = Tab::new(url)?;
        let view = self.factory.create_view(&tab.id);

        // Registered before loading so events raised by the load find the tab
        {
            let mut state = self.state.write();
            state.entries.push(TabEntry {
                tab: tab.clone(),
                view: Arc::clone(&view),
            });
            state.active_id = Some(tab.id.clone());
        }

        view.load(&tab.url);

        tracing::info!(tab_id = %tab.id, url = %tab.url, "Created new tab");

        Ok(tab)
    }

    /// Engine-originated window requests always become tabs.
    ///
    /// The opener may already be closed; the request is still honoured since
    /// it came from a live engine.
    pub fn on_new_window_requested(&self, opener_id: &str) -> Result<Tab> {
        tracing::debug!(opener = %opener_id, "Redirecting new window request to a tab");
        self.create_tab("about:blank".to_string())
    }

    /// Close a tab.
    ///
    /// Returns `false` without doing anything when the tab is the last one
    /// or unknown. Closing the active tab focuses its neighbour.
    pub fn close_tab(&self, tab_id: &str) -> bool {
        let removed = {
            let mut state = self.state.write();

            if state.entries.len() <= 1 {
                tracing::debug!(tab_id = %tab_id, "Refusing to close the last tab");
                return false;
            }

            let Some(index) = state.position(tab_id) else {
                tracing::debug!(tab_id = %tab_id, "Ignoring close for unknown tab");
                return false;
            };

            let removed = state.entries.remove(index);

            if state.active_id.as_deref() == Some(tab_id) {
                let next = index.min(state.entries.len() - 1);
                let next_id = state.entries[next].tab.id.clone();
                state.active_id = Some(next_id);
            }

            removed
        };

        removed.view.close();

        tracing::info!(tab_id = %tab_id, "Closed tab");

        true
    }

    /// Activate a tab (set as current)
    pub fn activate_tab(&self, tab_id: &str) -> Result<Tab> {
        let mut state = self.state.write();
        let tab = state
            .get_mut(tab_id)
            .map(|entry| entry.tab.clone())
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))?;
        state.active_id = Some(tab.id.clone());

        tracing::debug!(tab_id = %tab_id, "Activated tab");

        Ok(tab)
    }

    /// Dispatch `url` to the active tab's view.
    ///
    /// Returns the tab navigated, or `None` when no tab is active.
    pub fn navigate_active(&self, url: &str) -> Option<Tab> {
        let (tab, view) = {
            let state = self.state.read();
            let entry = state.active()?;
            (entry.tab.clone(), Arc::clone(&entry.view))
        };

        tracing::debug!(tab_id = %tab.id, url = %url, "Navigating active tab");
        view.load(url);

        Some(tab)
    }

    /// Engine reported a URL change. `None` for tabs already closed.
    pub fn on_url_changed(&self, tab_id: &str, url: &str) -> Option<UrlChange> {
        let mut state = self.state.write();
        let is_active = state.active_id.as_deref() == Some(tab_id);
        let Some(entry) = state.get_mut(tab_id) else {
            tracing::trace!(tab_id = %tab_id, "Ignoring URL change for closed tab");
            return None;
        };

        entry.tab.set_url(url.to_string());

        Some(UrlChange {
            tab: entry.tab.clone(),
            is_active,
        })
    }

    /// Engine finished loading a page. `None` for tabs already closed.
    pub fn on_load_finished(&self, tab_id: &str, title: &str) -> Option<Tab> {
        let mut state = self.state.write();
        let Some(entry) = state.get_mut(tab_id) else {
            tracing::trace!(tab_id = %tab_id, "Ignoring load finished for closed tab");
            return None;
        };

        entry.tab.set_title(title);
        Some(entry.tab.clone())
    }

    /// Get a tab by ID
    pub fn get_tab(&self, tab_id: &str) -> Result<Tab> {
        self.state
            .read()
            .entries
            .iter()
            .find(|entry| entry.tab.id == tab_id)
            .map(|entry| entry.tab.clone())
            .ok_or_else(|| TabError::NotFound(tab_id.to_string()))
    }

    /// Tabs in strip order
    pub fn tabs(&self) -> Vec<Tab> {
        self.state
            .read()
            .entries
            .iter()
            .map(|entry| entry.tab.clone())
            .collect()
    }

    pub fn active_tab(&self) -> Option<Tab> {
        self.state.read().active().map(|entry| entry.tab.clone())
    }

    pub fn active_tab_id(&self) -> Option<String> {
        self.state.read().active_id.clone()
    }

    pub fn position(&self, tab_id: &str) -> Option<usize> {
        self.state.read().position(tab_id)
    }

    pub fn count(&self) -> usize {
        self.state.read().entries.len()
    }
}

impl Clone for TabManager {
    fn clone(&self) -> Self {
        Self {
            state: Arc::clone(&self.state),
            factory: Arc::clone(&self.factory),
        }
    }
}
