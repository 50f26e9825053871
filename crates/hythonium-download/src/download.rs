//! Download data structure

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DownloadState {
    /// Requested, destination not yet accepted
    Pending,
    /// Accepted, engine transferring
    InProgress,
    /// Download completed successfully
    Completed,
    /// Download failed; whatever was written stays on disk
    Failed,
}

impl DownloadState {
    /// Lower-case label, same as the serialized form
    pub fn as_str(&self) -> &'static str {
        match self {
            DownloadState::Pending => "pending",
            DownloadState::InProgress => "in-progress",
            DownloadState::Completed => "completed",
            DownloadState::Failed => "failed",
        }
    }
}

/// Terminal state as reported by the engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FinishState {
    Completed,
    Interrupted,
    Cancelled,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadTask {
    /// Engine-assigned identifier
    pub id: String,
    pub url: String,
    /// Name the engine proposed, if any
    pub suggested_name: Option<String>,
    /// Name the file was saved under (after collision resolution)
    pub file_name: String,
    pub file_path: PathBuf,
    pub received_bytes: u64,
    /// `None` while the server has not announced a size
    pub total_bytes: Option<u64>,
    pub state: DownloadState,
    pub created_at: DateTime<Utc>,
    pub finished_at: Option<DateTime<Utc>>,
}

impl DownloadTask {
    pub fn new(id: String, url: String, suggested_name: Option<String>, file_name: String) -> Self {
        Self {
            id,
            url,
            suggested_name,
            file_name,
            file_path: PathBuf::new(),
            received_bytes: 0,
            total_bytes: None,
            state: DownloadState::Pending,
            created_at: Utc::now(),
            finished_at: None,
        }
    }

    /// Status line for the shell's status area
    pub fn status_text(&self) -> String {
        match self.total_bytes {
            Some(total) => format!(
                "Downloading: {}/{}",
                format_kb(self.received_bytes),
                format_kb(total)
            ),
            None => format!("Receiving: {}", format_kb(self.received_bytes)),
        }
    }
}

/// A download that reached its terminal state
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FinishedDownload {
    pub task: DownloadTask,
    /// Size on disk for completed downloads, bytes received otherwise
    pub size_bytes: u64,
}

impl FinishedDownload {
    pub fn succeeded(&self) -> bool {
        self.task.state == DownloadState::Completed
    }
}

/// `1536` → `"1.5KB"`
pub fn format_kb(bytes: u64) -> String {
    format!("{:.1}KB", bytes as f64 / 1024.0)
}
