//! Hythonium Navigation
//!
//! - Address bar input resolution:
//!   1. Known scheme prefix → navigate as typed
//!   2. Bare domain with a known TLD → navigate over `http://`
//!   3. Anything else → search with the configured engine
//! - Browsing history: ordered, deduplicated, persisted one URL per line

mod error;
mod history;
mod input;

pub use error::NavigationError;
pub use history::HistoryManager;
pub use input::{resolve_input, InputKind, InputResolution, InputResolver};

pub type Result<T> = std::result::Result<T, NavigationError>;
