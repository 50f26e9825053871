//! Rendering engine seam
//!
//! The engine renders pages and performs all network I/O on its own threads.
//! It reports back through `EngineEvent`s delivered on the dispatch loop; the
//! traits here are the calls flowing the other way.

use serde::{Deserialize, Serialize};

/// Profile-wide engine settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EngineProfile {
    /// HTTP `User-Agent` sent with every request
    pub user_agent: String,
    /// Family used for the standard, serif, sans-serif and fixed fonts
    pub font_family: String,
}

/// One engine view, hosted by exactly one tab
pub trait EngineView {
    /// Start loading `url`
    fn load(&self, url: &str);

    /// Release the view. Network activity may outlive this call; events it
    /// still emits carry a tab id the manager no longer knows.
    fn close(&self) {}
}

/// Creates engine views for new tabs
pub trait ViewFactory {
    fn create_view(&self, tab_id: &str) -> std::sync::Arc<dyn EngineView>;

    /// Apply profile-wide settings. Affects requests made after the call.
    fn apply_profile(&self, profile: &EngineProfile);
}
