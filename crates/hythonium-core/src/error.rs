//! Core error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Storage error: {0}")]
    Storage(#[from] hythonium_storage::StorageError),

    #[error("Tab error: {0}")]
    Tab(#[from] hythonium_tabs::TabError),

    #[error("Navigation error: {0}")]
    Navigation(#[from] hythonium_navigation::NavigationError),

    #[error("Download error: {0}")]
    Download(#[from] hythonium_download::DownloadError),
}
