//! History management
//!
//! History is an ordered log of visited URLs, deduplicated against the whole
//! log, persisted in full to a flat text resource after every mutation.

use parking_lot::RwLock;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use hythonium_storage::TextFile;

use crate::error::NavigationError;
use crate::Result;

pub struct HistoryManager {
    /// Visit order, oldest first
    entries: Arc<RwLock<Vec<String>>>,
    /// Backing resource
    store: TextFile,
    /// Cleared when the stored log could not be read; a log that was never
    /// loaded is never overwritten
    persist: Arc<AtomicBool>,
}

impl HistoryManager {
    /// Empty history backed by `store`; nothing is read.
    pub fn new(store: TextFile) -> Self {
        Self {
            entries: Arc::new(RwLock::new(Vec::new())),
            store,
            persist: Arc::new(AtomicBool::new(true)),
        }
    }

    /// Load history from `store`.
    ///
    /// Read failures are logged and yield an empty history: browsing goes on
    /// without the persisted log for this session, and the file is left as
    /// it was.
    pub fn load(store: TextFile) -> Self {
        let manager = Self::new(store);
        if let Err(e) = manager.reload() {
            tracing::warn!(
                path = %manager.store.path().display(),
                error = %e,
                "Failed to load history, not persisting this session"
            );
        }
        manager
    }

    /// Replace the in-memory history with the stored one.
    ///
    /// On failure the in-memory history is kept and persisting is switched
    /// off until a later reload succeeds.
    pub fn reload(&self) -> Result<()> {
        let lines = match self.store.read_lines() {
            Ok(lines) => lines,
            Err(e) => {
                self.persist.store(false, Ordering::Relaxed);
                return Err(e.into());
            }
        };

        let mut entries: Vec<String> = Vec::with_capacity(lines.len());
        for line in lines {
            if !entries.contains(&line) {
                entries.push(line);
            }
        }

        tracing::debug!(count = entries.len(), "Loaded history");
        *self.entries.write() = entries;
        self.persist.store(true, Ordering::Relaxed);

        Ok(())
    }

    /// Write the whole history back to storage. A no-op while persisting
    /// is off.
    pub fn save(&self) -> Result<()> {
        if !self.is_persistent() {
            tracing::trace!("History not persisted this session");
            return Ok(());
        }
        let entries = self.entries.read().clone();
        self.store.write_lines(&entries)?;
        Ok(())
    }

    /// Whether mutations are written back to the store
    pub fn is_persistent(&self) -> bool {
        self.persist.load(Ordering::Relaxed)
    }

    /// Record a visit to a URL.
    ///
    /// Returns `Ok(true)` when the URL was appended. URLs already present
    /// anywhere in history, blank URLs and `about:blank` are skipped. The
    /// entry stays in memory even when persisting it fails.
    pub fn record_visit(&self, url: &str) -> Result<bool> {
        let url = url.trim();
        if url.is_empty() || url == "about:blank" {
            return Ok(false);
        }

        {
            let mut entries = self.entries.write();
            if entries.iter().any(|entry| entry == url) {
                return Ok(false);
            }
            entries.push(url.to_string());
        }

        tracing::debug!(url = %url, "Recorded history entry");

        self.save()?;
        Ok(true)
    }

    /// Delete the entry at `index`, returning its URL.
    pub fn delete(&self, index: usize) -> Result<String> {
        let removed = {
            let mut entries = self.entries.write();
            if index >= entries.len() {
                return Err(NavigationError::HistoryIndex {
                    index,
                    len: entries.len(),
                });
            }
            entries.remove(index)
        };

        tracing::debug!(url = %removed, "Deleted history entry");

        self.save()?;
        Ok(removed)
    }

    /// Clear all history
    pub fn clear_all(&self) -> Result<()> {
        self.entries.write().clear();
        tracing::info!("Cleared history");
        self.save()
    }

    /// Entries in visit order
    pub fn entries(&self) -> Vec<String> {
        self.entries.read().clone()
    }

    pub fn get(&self, index: usize) -> Option<String> {
        self.entries.read().get(index).cloned()
    }

    pub fn contains(&self, url: &str) -> bool {
        self.entries.read().iter().any(|entry| entry == url)
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.read().is_empty()
    }

    /// Case-insensitive substring search, most recent first
    pub fn search(&self, query: &str, limit: usize) -> Vec<String> {
        let query = query.trim().to_lowercase();
        self.entries
            .read()
            .iter()
            .rev()
            .filter(|entry| entry.to_lowercase().contains(&query))
            .take(limit)
            .cloned()
            .collect()
    }
}

impl Clone for HistoryManager {
    fn clone(&self) -> Self {
        Self {
            entries: Arc::clone(&self.entries),
            store: self.store.clone(),
            persist: Arc::clone(&self.persist),
        }
    }
}
