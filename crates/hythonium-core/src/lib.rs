//! Hythonium Core
//!
//! Coordination layer between user input, the embedded rendering engine,
//! browsing history and downloads. The engine and the UI toolkit are reached
//! only through the `ViewFactory`/`EngineView`/`DownloadItem` and `ShellUi`
//! traits.

mod browser;
mod config;
mod editor;
mod error;
mod events;
mod ui;

pub use browser::{Browser, BrowserPaths, HISTORY_FILE_NAME};
pub use config::{
    default_config_text, load_mapping, parse_mapping, resolve, Config, ConfigKey, ConfigMap,
    CONFIG_FILE_NAME, DEFAULT_FONT_FAMILY,
};
pub use editor::{CloseOutcome, EditSession};
pub use error::CoreError;
pub use events::EngineEvent;
pub use ui::ShellUi;

// Re-export core components
pub use hythonium_download::{
    format_kb, DownloadError, DownloadItem, DownloadManager, DownloadRequest, DownloadSettings,
    DownloadState, DownloadTask, FinishState, FinishedDownload,
};
pub use hythonium_navigation::{
    resolve_input, HistoryManager, InputKind, InputResolution, InputResolver, NavigationError,
};
pub use hythonium_storage::{exe_dir, StorageError, TextFile};
pub use hythonium_tabs::{EngineProfile, EngineView, Tab, TabError, TabManager, ViewFactory};

pub type Result<T> = std::result::Result<T, CoreError>;

/// Initialize logging
///
/// Logs go to stderr so they never interleave with console output.
pub fn init_logging() {
    use tracing_subscriber::{fmt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();
}
