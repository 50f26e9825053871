//! Navigation error types

use thiserror::Error;

#[derive(Error, Debug)]
pub enum NavigationError {
    #[error("History index out of range: {index} (len {len})")]
    HistoryIndex { index: usize, len: usize },

    #[error("Storage error: {0}")]
    Storage(#[from] hythonium_storage::StorageError),
}
