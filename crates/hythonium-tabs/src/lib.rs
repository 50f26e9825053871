//! Hythonium Tab Management
//!
//! Owns the set of open tabs and the engine view each one hosts. The set is
//! never empty while the shell runs: closing the last tab is a no-op.

mod engine;
mod error;
mod manager;
mod tab;

pub use engine::{EngineProfile, EngineView, ViewFactory};
pub use error::TabError;
pub use manager::{TabManager, UrlChange};
pub use tab::{truncate_title, Tab, LOADING_TITLE, MAX_TITLE_CHARS};

pub type Result<T> = std::result::Result<T, TabError>;
