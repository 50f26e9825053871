//! Tab data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::TabError;
use crate::Result;

/// Tab strip titles are cut to this many characters
pub const MAX_TITLE_CHARS: usize = 15;

/// Title shown until the engine reports the page title
pub const LOADING_TITLE: &str = "Loading...";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Tab {
    /// Unique identifier
    pub id: String,
    /// Current URL
    pub url: String,
    /// Page title, truncated for the tab strip
    pub title: String,
    /// When the tab was created
    pub created_at: DateTime<Utc>,
    /// Last modification time
    pub updated_at: DateTime<Utc>,
}

impl Tab {
    pub fn new(url: String) -> Result<Self> {
        if url.trim().is_empty() {
            return Err(TabError::InvalidUrl("URL cannot be empty".to_string()));
        }

        let now = Utc::now();

        Ok(Self {
            id: Uuid::new_v4().to_string(),
            url,
            title: LOADING_TITLE.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    /// Update page title
    pub fn set_title(&mut self, title: &str) {
        self.title = truncate_title(title);
        self.updated_at = Utc::now();
    }

    /// Record the URL the engine reports
    pub fn set_url(&mut self, url: String) {
        self.url = url;
        self.updated_at = Utc::now();
    }

    /// Get display title (with fallback to URL)
    pub fn display_title(&self) -> &str {
        if self.title.is_empty() {
            &self.url
        } else {
            &self.title
        }
    }
}

/// Cut `title` to its first `MAX_TITLE_CHARS` characters.
pub fn truncate_title(title: &str) -> String {
    title.trim().chars().take(MAX_TITLE_CHARS).collect()
}
