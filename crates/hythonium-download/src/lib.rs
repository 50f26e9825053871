//! Hythonium Download Coordinator
//!
//! - Picks a file name from the remote URL (or a configured default)
//! - Places it in the download folder without overwriting anything
//! - Tracks progress and reports the terminal outcome
//!
//! The engine performs the transfer itself; this crate only decides where
//! the bytes go and keeps the books.

mod download;
mod error;
mod manager;
mod path;

pub use download::{format_kb, DownloadState, DownloadTask, FinishState, FinishedDownload};
pub use error::DownloadError;
pub use manager::{DownloadItem, DownloadManager, DownloadRequest, DownloadSettings};
pub use path::{file_name_from_url, sanitize_file_name, split_extension, unique_destination};

pub type Result<T> = std::result::Result<T, DownloadError>;
