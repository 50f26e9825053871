//! Headless engine
//!
//! Stands in for an embedded renderer. Every load is reported back as a URL
//! change followed by a finished load, and downloads are served only for
//! `file:` URLs by copying the local file.

use anyhow::{bail, Context};
use parking_lot::RwLock;
use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use tokio::sync::mpsc::UnboundedSender;
use url::Url;

use hythonium_core::{
    DownloadItem, DownloadRequest, EngineEvent, EngineProfile, EngineView, FinishState,
    ViewFactory,
};

pub type EventSender = UnboundedSender<EngineEvent>;

pub struct HeadlessEngine {
    events: EventSender,
    profile: Arc<RwLock<Option<EngineProfile>>>,
    next_download: AtomicU64,
}

impl HeadlessEngine {
    pub fn new(events: EventSender) -> Self {
        Self {
            events,
            profile: Arc::new(RwLock::new(None)),
            next_download: AtomicU64::new(1),
        }
    }

    /// Profile applied last, if any
    pub fn profile(&self) -> Option<EngineProfile> {
        self.profile.read().clone()
    }

    /// Raise a download request as if a page had triggered one
    pub fn request_download(&self, url: &str) {
        let id = self.next_download.fetch_add(1, Ordering::Relaxed).to_string();

        let request = DownloadRequest {
            id: id.clone(),
            url: url.to_string(),
            suggested_name: None,
            item: Box::new(HeadlessDownload {
                id,
                url: url.to_string(),
                events: self.events.clone(),
            }),
        };

        send(&self.events, EngineEvent::DownloadRequested(request));
    }

    /// Raise a new-window request as if `opener_id`'s page had asked for one
    pub fn request_new_window(&self, opener_id: &str) {
        send(
            &self.events,
            EngineEvent::NewWindowRequested {
                opener_id: opener_id.to_string(),
            },
        );
    }
}

impl ViewFactory for HeadlessEngine {
    fn create_view(&self, tab_id: &str) -> Arc<dyn EngineView> {
        Arc::new(HeadlessView {
            tab_id: tab_id.to_string(),
            events: self.events.clone(),
        })
    }

    fn apply_profile(&self, profile: &EngineProfile) {
        tracing::info!(
            user_agent = %profile.user_agent,
            font_family = %profile.font_family,
            "Engine profile applied"
        );
        *self.profile.write() = Some(profile.clone());
    }
}

struct HeadlessView {
    tab_id: String,
    events: EventSender,
}

impl EngineView for HeadlessView {
    fn load(&self, url: &str) {
        tracing::debug!(tab_id = %self.tab_id, url = %url, "Loading");

        send(
            &self.events,
            EngineEvent::UrlChanged {
                tab_id: self.tab_id.clone(),
                url: url.to_string(),
            },
        );
        send(
            &self.events,
            EngineEvent::LoadFinished {
                tab_id: self.tab_id.clone(),
                title: page_title(url),
            },
        );
    }

    fn close(&self) {
        tracing::debug!(tab_id = %self.tab_id, "View released");
    }
}

struct HeadlessDownload {
    id: String,
    url: String,
    events: EventSender,
}

impl DownloadItem for HeadlessDownload {
    fn accept(&self, path: &Path) {
        let state = match copy_local(&self.url, path) {
            Ok(bytes) => {
                send(
                    &self.events,
                    EngineEvent::DownloadProgress {
                        download_id: self.id.clone(),
                        received: bytes,
                        total: Some(bytes),
                    },
                );
                FinishState::Completed
            }
            Err(e) => {
                tracing::warn!(
                    download_id = %self.id,
                    url = %self.url,
                    error = %e,
                    "Download not served"
                );
                FinishState::Interrupted
            }
        };

        send(
            &self.events,
            EngineEvent::DownloadFinished {
                download_id: self.id.clone(),
                state,
            },
        );
    }

    fn cancel(&self) {
        tracing::debug!(download_id = %self.id, "Download cancelled");
    }
}

/// Title a headless page reports: its host without `www.`, or the URL itself
pub fn page_title(url: &str) -> String {
    Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .host_str()
                .map(|host| host.trim_start_matches("www.").to_string())
        })
        .unwrap_or_else(|| url.to_string())
}

fn copy_local(url: &str, dest: &Path) -> anyhow::Result<u64> {
    let parsed = Url::parse(url).with_context(|| format!("invalid download URL {}", url))?;
    if parsed.scheme() != "file" {
        bail!("the headless engine only serves file: URLs");
    }

    let Ok(source) = parsed.to_file_path() else {
        bail!("{} does not name a local file", url);
    };

    std::fs::copy(&source, dest)
        .with_context(|| format!("copying {} to {}", source.display(), dest.display()))
}

fn send(events: &EventSender, event: EngineEvent) {
    if events.send(event).is_err() {
        tracing::debug!("Dispatch loop gone, dropping engine event");
    }
}
