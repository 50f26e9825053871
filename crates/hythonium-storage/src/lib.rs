//! Hythonium Storage Layer
//!
//! Plain-text persistence for browser state. Every resource is read and
//! rewritten in full with a scoped open-write-close; there is exactly one
//! writer (the dispatch thread), so no file locking is involved.

mod error;
mod paths;
mod text_file;

pub use error::StorageError;
pub use paths::{exe_dir, resource_path};
pub use text_file::TextFile;

pub type Result<T> = std::result::Result<T, StorageError>;
