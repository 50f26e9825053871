//! Configuration edit session
//!
//! Pairs the file content at open time with the buffer being edited, so that
//! closing can tell whether anything would be lost.

use hythonium_storage::TextFile;

use crate::config::{default_config_text, Config};
use crate::Result;

/// How an edit session ended
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CloseOutcome {
    /// Nothing changed; no prompt was shown
    Unchanged,
    /// The user chose to save; holds the configuration now in effect
    Saved(Config),
    /// The user declined or dismissed the prompt
    Discarded,
}

pub struct EditSession {
    store: TextFile,
    before: String,
    buffer: String,
}

impl EditSession {
    /// Snapshot the configuration resource. A missing file opens the
    /// default template.
    pub fn open(store: TextFile) -> Result<Self> {
        let content = store
            .read_to_string()?
            .unwrap_or_else(default_config_text);

        tracing::debug!(path = %store.path().display(), "Opened config editor");

        Ok(Self {
            store,
            before: content.clone(),
            buffer: content,
        })
    }

    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn set_buffer(&mut self, text: impl Into<String>) {
        self.buffer = text.into();
    }

    /// Whether the buffer differs from the last saved content, ignoring
    /// surrounding whitespace
    pub fn is_modified(&self) -> bool {
        self.buffer.trim() != self.before.trim()
    }

    /// Write the buffer and return the configuration it resolves to
    pub fn save(&mut self) -> Result<Config> {
        self.store.write_string(&self.buffer)?;
        self.before = self.buffer.clone();

        tracing::info!(path = %self.store.path().display(), "Saved config");

        Ok(Config::from_text(&self.buffer))
    }

    /// End the session.
    ///
    /// With unsaved changes `confirm_save` is asked exactly once; only a
    /// `true` answer saves. When that save fails the error is returned and
    /// the buffer is kept, so the session can be saved or closed again.
    pub fn close<F>(&mut self, confirm_save: F) -> Result<CloseOutcome>
    where
        F: FnOnce() -> bool,
    {
        if !self.is_modified() {
            return Ok(CloseOutcome::Unchanged);
        }

        if confirm_save() {
            Ok(CloseOutcome::Saved(self.save()?))
        } else {
            tracing::debug!("Discarded config edits");
            Ok(CloseOutcome::Discarded)
        }
    }
}
