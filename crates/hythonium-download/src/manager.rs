//! Download manager

use parking_lot::RwLock;
use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::download::{DownloadState, DownloadTask, FinishState, FinishedDownload};
use crate::error::DownloadError;
use crate::path::{file_name_from_url, sanitize_file_name, unique_destination};
use crate::Result;

/// Engine handle for one pending transfer
pub trait DownloadItem {
    /// Begin transferring to `path`
    fn accept(&self, path: &Path);

    /// Refuse the transfer
    fn cancel(&self);
}

/// A download-request event from the engine
pub struct DownloadRequest {
    /// Engine-assigned id, repeated on progress and finish events
    pub id: String,
    pub url: String,
    pub suggested_name: Option<String>,
    pub item: Box<dyn DownloadItem>,
}

impl std::fmt::Debug for DownloadRequest {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadRequest")
            .field("id", &self.id)
            .field("url", &self.url)
            .field("suggested_name", &self.suggested_name)
            .finish_non_exhaustive()
    }
}

/// Where and under which fallback name downloads are saved
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DownloadSettings {
    pub download_dir: PathBuf,
    /// Used when neither the URL nor the engine provides a name
    pub default_file_name: String,
}

pub struct DownloadManager {
    /// Downloads that have not reached a terminal state
    downloads: Arc<RwLock<HashMap<String, DownloadTask>>>,
}

impl DownloadManager {
    pub fn new() -> Self {
        Self {
            downloads: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Handle a download request from the engine.
    ///
    /// Never fails: when the download folder cannot be prepared the item is
    /// cancelled and the task comes back in `Failed` state for the caller to
    /// report.
    pub fn on_download_requested(
        &self,
        request: DownloadRequest,
        settings: &DownloadSettings,
    ) -> DownloadTask {
        let DownloadRequest {
            id,
            url,
            suggested_name,
            item,
        } = request;

        let file_name = resolve_file_name(&url, suggested_name.as_deref(), settings);
        let mut task = DownloadTask::new(id, url, suggested_name, file_name);

        if let Err(e) = prepare_folder(&settings.download_dir) {
            tracing::warn!(download_id = %task.id, error = %e, "Rejecting download");
            task.file_path = settings.download_dir.join(&task.file_name);
            task.state = DownloadState::Failed;
            task.finished_at = Some(chrono::Utc::now());
            item.cancel();
            return task;
        }

        // Paths handed to in-flight downloads count as taken even before the
        // engine has created the file.
        task.file_path = {
            let downloads = self.downloads.read();
            unique_destination(&settings.download_dir, &task.file_name, |candidate| {
                downloads.values().any(|d| d.file_path == candidate)
            })
        };
        task.file_name = task
            .file_path
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .unwrap_or_else(|| task.file_name.clone());
        task.state = DownloadState::InProgress;

        self.downloads
            .write()
            .insert(task.id.clone(), task.clone());

        tracing::info!(
            download_id = %task.id,
            url = %task.url,
            path = %task.file_path.display(),
            "Accepted download"
        );

        item.accept(&task.file_path);

        task
    }

    /// Update download progress. `None` for unknown downloads.
    ///
    /// A total of zero means the size is unknown.
    pub fn on_progress(&self, id: &str, received: u64, total: Option<u64>) -> Option<DownloadTask> {
        let mut downloads = self.downloads.write();
        let download = downloads.get_mut(id)?;

        download.received_bytes = received;
        download.total_bytes = total.filter(|t| *t > 0);
        download.state = DownloadState::InProgress;

        Some(download.clone())
    }

    /// Record the terminal state and forget the download.
    ///
    /// A failed download keeps whatever partial file the engine wrote.
    pub fn on_finished(&self, id: &str, finish: FinishState) -> Option<FinishedDownload> {
        let mut task = self.downloads.write().remove(id)?;

        task.finished_at = Some(chrono::Utc::now());
        task.state = match finish {
            FinishState::Completed => DownloadState::Completed,
            FinishState::Interrupted | FinishState::Cancelled => DownloadState::Failed,
        };

        let size_bytes = match task.state {
            DownloadState::Completed => fs::metadata(&task.file_path)
                .map(|meta| meta.len())
                .unwrap_or(task.received_bytes),
            _ => task.received_bytes,
        };

        if task.state == DownloadState::Completed {
            tracing::info!(
                download_id = %id,
                path = %task.file_path.display(),
                size_bytes,
                "Completed download"
            );
        } else {
            tracing::warn!(download_id = %id, finish = ?finish, "Download failed");
        }

        Some(FinishedDownload { task, size_bytes })
    }

    /// Get a download by ID
    pub fn get_download(&self, id: &str) -> Result<DownloadTask> {
        self.downloads
            .read()
            .get(id)
            .cloned()
            .ok_or_else(|| DownloadError::NotFound(id.to_string()))
    }

    /// Downloads in flight, oldest first
    pub fn list_downloads(&self) -> Vec<DownloadTask> {
        let mut downloads: Vec<DownloadTask> = self.downloads.read().values().cloned().collect();
        downloads.sort_by(|a, b| a.created_at.cmp(&b.created_at));
        downloads
    }

    pub fn active_count(&self) -> usize {
        self.downloads.read().len()
    }
}

impl Default for DownloadManager {
    fn default() -> Self {
        Self::new()
    }
}

impl Clone for DownloadManager {
    fn clone(&self) -> Self {
        Self {
            downloads: Arc::clone(&self.downloads),
        }
    }
}

fn resolve_file_name(url: &str, suggested: Option<&str>, settings: &DownloadSettings) -> String {
    file_name_from_url(url)
        .or_else(|| suggested.and_then(sanitize_file_name))
        .or_else(|| sanitize_file_name(&settings.default_file_name))
        .unwrap_or_else(|| "download_file".to_string())
}

fn prepare_folder(dir: &Path) -> Result<()> {
    fs::create_dir_all(dir).map_err(|source| DownloadError::Folder {
        path: dir.to_path_buf(),
        source,
    })
}
