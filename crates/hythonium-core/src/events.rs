//! Events delivered by the engine on the dispatch loop

use hythonium_download::{DownloadRequest, FinishState};

/// For a given tab or download, events arrive in the order the engine raised
/// them.
#[derive(Debug)]
pub enum EngineEvent {
    UrlChanged {
        tab_id: String,
        url: String,
    },
    LoadFinished {
        tab_id: String,
        title: String,
    },
    /// A page asked for a new top-level window
    NewWindowRequested {
        opener_id: String,
    },
    DownloadRequested(DownloadRequest),
    DownloadProgress {
        download_id: String,
        received: u64,
        /// `None` or zero when the size is unknown
        total: Option<u64>,
    },
    DownloadFinished {
        download_id: String,
        state: FinishState,
    },
}
