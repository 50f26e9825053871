//! Main browser state container
//!
//! Owns the live configuration and every manager, turns user actions into
//! engine calls and engine events into UI updates.

use parking_lot::RwLock;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use hythonium_download::{format_kb, DownloadManager, DownloadState, DownloadTask};
use hythonium_navigation::{HistoryManager, InputResolver};
use hythonium_storage::TextFile;
use hythonium_tabs::{Tab, TabManager, ViewFactory};

use crate::config::{Config, CONFIG_FILE_NAME};
use crate::editor::{CloseOutcome, EditSession};
use crate::events::EngineEvent;
use crate::ui::ShellUi;
use crate::Result;

pub const HISTORY_FILE_NAME: &str = "history.txt";

const DOWNLOAD_FAILED_TITLE: &str = "Warning";
const DOWNLOAD_FAILED_MESSAGE: &str = "File download failed.";

/// Locations of the persisted resources
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BrowserPaths {
    pub config_file: PathBuf,
    pub history_file: PathBuf,
}

impl BrowserPaths {
    /// Resources beside the running executable
    pub fn beside_executable() -> Self {
        Self::in_dir(&hythonium_storage::exe_dir())
    }

    pub fn in_dir(dir: &Path) -> Self {
        Self {
            config_file: dir.join(CONFIG_FILE_NAME),
            history_file: dir.join(HISTORY_FILE_NAME),
        }
    }
}

/// Main browser instance
pub struct Browser {
    /// Live configuration, swapped whole on reload
    config: Arc<RwLock<Arc<Config>>>,
    config_file: TextFile,
    tab_manager: TabManager,
    history_manager: HistoryManager,
    download_manager: DownloadManager,
    ui: Arc<dyn ShellUi>,
}

impl Browser {
    /// Load configuration and history from `paths`. Neither can fail: a bad
    /// config falls back to defaults and unreadable history starts empty.
    pub fn new(paths: &BrowserPaths, factory: Arc<dyn ViewFactory>, ui: Arc<dyn ShellUi>) -> Self {
        let config = Config::load_from(&paths.config_file);
        let history_manager = HistoryManager::load(TextFile::open(&paths.history_file));

        Self {
            config: Arc::new(RwLock::new(Arc::new(config))),
            config_file: TextFile::open(&paths.config_file),
            tab_manager: TabManager::new(factory),
            history_manager,
            download_manager: DownloadManager::new(),
            ui,
        }
    }

    /// Apply the engine profile and open the homepage
    pub fn initialize(&self) -> Result<Tab> {
        let config = self.config();
        self.tab_manager.apply_profile(&config.engine_profile());

        let tab = self.open_tab(config.homepage.clone())?;

        tracing::info!(
            homepage = %config.homepage,
            history_entries = self.history_manager.len(),
            "Browser initialized"
        );

        Ok(tab)
    }

    // === Tab operations ===

    pub fn tab_manager(&self) -> &TabManager {
        &self.tab_manager
    }

    /// Open the configured new-tab page
    pub fn new_tab(&self) -> Result<Tab> {
        let url = self.config().new_tab.clone();
        self.open_tab(url)
    }

    pub fn open_tab(&self, url: String) -> Result<Tab> {
        let tab = self.tab_manager.create_tab(url)?;
        self.ui.tab_opened(&tab.id, &tab.title);
        self.ui.set_address_bar(&tab.url);
        Ok(tab)
    }

    /// Close a tab. The last tab stays open.
    pub fn close_tab(&self, tab_id: &str) -> bool {
        let was_active = self.tab_manager.active_tab_id().as_deref() == Some(tab_id);
        if !self.tab_manager.close_tab(tab_id) {
            return false;
        }

        self.ui.tab_closed(tab_id);
        if was_active {
            if let Some(active) = self.tab_manager.active_tab() {
                self.ui.set_address_bar(&active.url);
            }
        }

        true
    }

    pub fn activate_tab(&self, tab_id: &str) -> Result<Tab> {
        let tab = self.tab_manager.activate_tab(tab_id)?;
        self.ui.set_address_bar(&tab.url);
        Ok(tab)
    }

    // === Navigation operations ===

    /// Address bar submit.
    ///
    /// Blank input is ignored. Returns the tab that was navigated.
    pub fn submit_address(&self, input: &str) -> Option<Tab> {
        let resolver = InputResolver::with_search_engine(self.config().search_engine.clone());
        let resolution = resolver.resolve(input)?;

        tracing::debug!(
            kind = ?resolution.kind(),
            url = %resolution.url(),
            "Resolved address bar input"
        );

        self.tab_manager.navigate_active(resolution.url())
    }

    // === History operations ===

    pub fn history_manager(&self) -> &HistoryManager {
        &self.history_manager
    }

    pub fn history(&self) -> Vec<String> {
        self.history_manager.entries()
    }

    /// Load a history entry in the active tab
    pub fn open_history_entry(&self, index: usize) -> Option<Tab> {
        let url = self.history_manager.get(index)?;
        self.tab_manager.navigate_active(&url)
    }

    pub fn delete_history_entry(&self, index: usize) -> Result<String> {
        Ok(self.history_manager.delete(index)?)
    }

    pub fn clear_history(&self) -> Result<()> {
        Ok(self.history_manager.clear_all()?)
    }

    // === Download operations ===

    pub fn download_manager(&self) -> &DownloadManager {
        &self.download_manager
    }

    pub fn download(&self, id: &str) -> Result<DownloadTask> {
        Ok(self.download_manager.get_download(id)?)
    }

    // === Engine events ===

    /// Apply one engine event. Events for closed tabs or finished downloads
    /// are dropped.
    pub fn dispatch(&self, event: EngineEvent) {
        match event {
            EngineEvent::UrlChanged { tab_id, url } => self.on_url_changed(&tab_id, &url),
            EngineEvent::LoadFinished { tab_id, title } => {
                if let Some(tab) = self.tab_manager.on_load_finished(&tab_id, &title) {
                    self.ui.set_tab_title(&tab.id, &tab.title);
                }
            }
            EngineEvent::NewWindowRequested { opener_id } => {
                match self.tab_manager.on_new_window_requested(&opener_id) {
                    Ok(tab) => {
                        self.ui.tab_opened(&tab.id, &tab.title);
                        self.ui.set_address_bar(&tab.url);
                    }
                    Err(e) => {
                        tracing::warn!(opener = %opener_id, error = %e, "New window request failed")
                    }
                }
            }
            EngineEvent::DownloadRequested(request) => {
                let settings = self.config().download_settings();
                let task = self.download_manager.on_download_requested(request, &settings);
                if task.state == DownloadState::Failed {
                    self.ui.notify_warning(DOWNLOAD_FAILED_TITLE, DOWNLOAD_FAILED_MESSAGE);
                } else {
                    self.ui.show_status(&task.status_text());
                }
            }
            EngineEvent::DownloadProgress {
                download_id,
                received,
                total,
            } => {
                let progress = self.download_manager.on_progress(&download_id, received, total);
                if let Some(task) = progress {
                    self.ui.show_status(&task.status_text());
                }
            }
            EngineEvent::DownloadFinished { download_id, state } => {
                let Some(finished) = self.download_manager.on_finished(&download_id, state) else {
                    return;
                };
                if finished.succeeded() {
                    self.ui.notify_info(
                        "Download Complete",
                        &format!(
                            "File saved to folder:\n{}\n\nSize: {}",
                            finished.task.file_path.display(),
                            format_kb(finished.size_bytes)
                        ),
                    );
                } else {
                    self.ui.notify_warning(DOWNLOAD_FAILED_TITLE, DOWNLOAD_FAILED_MESSAGE);
                }
            }
        }
    }

    fn on_url_changed(&self, tab_id: &str, url: &str) {
        let Some(change) = self.tab_manager.on_url_changed(tab_id, url) else {
            return;
        };

        if change.is_active {
            self.ui.set_address_bar(url);
        }
        self.ui.set_tab_title(&change.tab.id, &change.tab.title);

        if let Err(e) = self.history_manager.record_visit(url) {
            tracing::warn!(url = %url, error = %e, "Failed to persist history");
        }
    }

    // === Config ===

    /// Configuration in effect right now
    pub fn config(&self) -> Arc<Config> {
        Arc::clone(&self.config.read())
    }

    /// Re-read the configuration resource and put it in effect
    pub fn reload_config(&self) -> Arc<Config> {
        self.apply_config(Config::load_from(self.config_file.path()))
    }

    pub fn open_config_editor(&self) -> Result<EditSession> {
        EditSession::open(self.config_file.clone())
    }

    /// Save the edit buffer and put the result in effect
    pub fn save_config_edit(&self, session: &mut EditSession) -> Result<Arc<Config>> {
        let config = session.save()?;
        Ok(self.apply_config(config))
    }

    /// Close the editor, asking to save unsaved changes. On error the
    /// session still holds the edits.
    pub fn close_config_editor(&self, session: &mut EditSession) -> Result<CloseOutcome> {
        let outcome = session.close(|| {
            self.ui.confirm(
                "Unsaved changes",
                "The configuration has been modified. Save before closing?",
            )
        })?;

        if let CloseOutcome::Saved(config) = &outcome {
            self.apply_config(config.clone());
        }

        Ok(outcome)
    }

    /// Replace the live configuration in one step. Open tabs keep their
    /// pages; later navigations and downloads see the new values.
    fn apply_config(&self, config: Config) -> Arc<Config> {
        let config = Arc::new(config);
        *self.config.write() = Arc::clone(&config);
        self.tab_manager.apply_profile(&config.engine_profile());

        tracing::info!(
            search_engine = %config.search_engine,
            download_folder = %config.download_folder.display(),
            "Configuration applied"
        );

        config
    }
}

impl Clone for Browser {
    fn clone(&self) -> Self {
        Self {
            config: Arc::clone(&self.config),
            config_file: self.config_file.clone(),
            tab_manager: self.tab_manager.clone(),
            history_manager: self.history_manager.clone(),
            download_manager: self.download_manager.clone(),
            ui: Arc::clone(&self.ui),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hythonium_download::{DownloadItem, DownloadRequest, FinishState};
    use hythonium_tabs::{EngineProfile, EngineView};
    use parking_lot::Mutex;
    use tempfile::{tempdir, TempDir};

    #[derive(Default)]
    struct Log {
        entries: Mutex<Vec<String>>,
        confirm_answer: Mutex<bool>,
    }

    impl Log {
        fn push(&self, entry: String) {
            self.entries.lock().push(entry);
        }

        fn entries(&self) -> Vec<String> {
            self.entries.lock().clone()
        }

        fn last(&self) -> String {
            self.entries.lock().last().cloned().unwrap_or_default()
        }

        fn count(&self, prefix: &str) -> usize {
            self.entries
                .lock()
                .iter()
                .filter(|e| e.starts_with(prefix))
                .count()
        }
    }

    struct FakeView {
        tab_id: String,
        log: Arc<Log>,
    }

    impl EngineView for FakeView {
        fn load(&self, url: &str) {
            self.log.push(format!("load {} {}", self.tab_id, url));
        }
    }

    struct FakeFactory {
        log: Arc<Log>,
    }

    impl ViewFactory for FakeFactory {
        fn create_view(&self, tab_id: &str) -> Arc<dyn EngineView> {
            Arc::new(FakeView {
                tab_id: tab_id.to_string(),
                log: Arc::clone(&self.log),
            })
        }

        fn apply_profile(&self, profile: &EngineProfile) {
            self.log.push(format!("profile {}", profile.user_agent));
        }
    }

    struct FakeUi {
        log: Arc<Log>,
    }

    impl ShellUi for FakeUi {
        fn set_address_bar(&self, text: &str) {
            self.log.push(format!("address {}", text));
        }

        fn tab_opened(&self, tab_id: &str, _title: &str) {
            self.log.push(format!("opened {}", tab_id));
        }

        fn tab_closed(&self, tab_id: &str) {
            self.log.push(format!("closed {}", tab_id));
        }

        fn set_tab_title(&self, tab_id: &str, title: &str) {
            self.log.push(format!("title {} {}", tab_id, title));
        }

        fn show_status(&self, text: &str) {
            self.log.push(format!("status {}", text));
        }

        fn notify_info(&self, title: &str, _message: &str) {
            self.log.push(format!("info {}", title));
        }

        fn notify_warning(&self, title: &str, message: &str) {
            self.log.push(format!("warning {} {}", title, message));
        }

        fn confirm(&self, _title: &str, _question: &str) -> bool {
            self.log.push("confirm".to_string());
            *self.log.confirm_answer.lock()
        }
    }

    struct NoopItem;

    impl DownloadItem for NoopItem {
        fn accept(&self, _path: &Path) {}
        fn cancel(&self) {}
    }

    fn browser_with_config(config: &str) -> (Browser, Arc<Log>, TempDir) {
        let temp = tempdir().unwrap();
        let paths = BrowserPaths::in_dir(temp.path());
        std::fs::write(&paths.config_file, config).unwrap();

        let log = Arc::new(Log::default());
        let browser = Browser::new(
            &paths,
            Arc::new(FakeFactory {
                log: Arc::clone(&log),
            }),
            Arc::new(FakeUi {
                log: Arc::clone(&log),
            }),
        );
        (browser, log, temp)
    }

    fn browser() -> (Browser, Arc<Log>, TempDir) {
        browser_with_config(
            "homepage = \"https://home.com\"\n\
             new_tab = \"https://new.com\"\n\
             search_engine = \"https://s.com/?q=\"\n\
             user_agent = \"UA/1\"\n",
        )
    }

    #[test]
    fn test_browser_initialization() {
        let (browser, log, _temp) = browser();
        let tab = browser.initialize().unwrap();

        assert_eq!(tab.url, "https://home.com");
        assert_eq!(browser.tab_manager().count(), 1);
        assert_eq!(log.entries()[0], "profile UA/1");
        assert!(log.entries().contains(&format!("load {} https://home.com", tab.id)));
    }

    #[test]
    fn test_submit_address_resolves_input() {
        let (browser, log, _temp) = browser();
        let tab = browser.initialize().unwrap();

        browser.submit_address("example.com");
        assert_eq!(log.last(), format!("load {} http://example.com", tab.id));

        browser.submit_address("hello world");
        assert_eq!(log.last(), format!("load {} https://s.com/?q=hello world", tab.id));

        let before = log.entries().len();
        assert!(browser.submit_address("   ").is_none());
        assert_eq!(log.entries().len(), before);
    }

    #[test]
    fn test_url_change_updates_chrome_and_history() {
        let (browser, log, temp) = browser();
        let first = browser.initialize().unwrap();
        let second = browser.new_tab().unwrap();

        browser.dispatch(EngineEvent::UrlChanged {
            tab_id: second.id.clone(),
            url: "https://new.com/".to_string(),
        });
        assert!(log.entries().contains(&"address https://new.com/".to_string()));

        // Background tab: no address bar update
        browser.dispatch(EngineEvent::UrlChanged {
            tab_id: first.id.clone(),
            url: "https://home.com/".to_string(),
        });
        assert!(!log.entries().contains(&"address https://home.com/".to_string()));

        // Same URL twice is recorded once
        browser.dispatch(EngineEvent::UrlChanged {
            tab_id: first.id,
            url: "https://home.com/".to_string(),
        });
        assert_eq!(browser.history(), vec!["https://new.com/", "https://home.com/"]);

        let persisted = std::fs::read_to_string(temp.path().join(HISTORY_FILE_NAME)).unwrap();
        assert_eq!(persisted, "https://new.com/\nhttps://home.com/\n");
    }

    #[test]
    fn test_events_for_closed_tab_are_dropped() {
        let (browser, log, _temp) = browser();
        let first = browser.initialize().unwrap();
        browser.new_tab().unwrap();
        assert!(browser.close_tab(&first.id));

        let before = log.entries().len();
        browser.dispatch(EngineEvent::UrlChanged {
            tab_id: first.id.clone(),
            url: "https://late.com".to_string(),
        });
        browser.dispatch(EngineEvent::LoadFinished {
            tab_id: first.id,
            title: "Late".to_string(),
        });

        assert_eq!(log.entries().len(), before);
        assert!(browser.history().is_empty());
    }

    #[test]
    fn test_last_tab_survives_close() {
        let (browser, log, _temp) = browser();
        let tab = browser.initialize().unwrap();

        assert!(!browser.close_tab(&tab.id));
        assert_eq!(browser.tab_manager().count(), 1);
        assert_eq!(log.count("closed"), 0);
    }

    #[test]
    fn test_close_active_moves_address_bar() {
        let (browser, log, _temp) = browser();
        let first = browser.initialize().unwrap();
        let second = browser.new_tab().unwrap();

        assert!(browser.close_tab(&second.id));
        assert_eq!(log.last(), format!("address {}", first.url));
    }

    #[test]
    fn test_new_window_request_opens_tab() {
        let (browser, log, _temp) = browser();
        let opener = browser.initialize().unwrap();

        browser.dispatch(EngineEvent::NewWindowRequested {
            opener_id: opener.id,
        });

        assert_eq!(browser.tab_manager().count(), 2);
        assert_eq!(log.count("opened"), 2);
    }

    #[test]
    fn test_load_finished_sets_truncated_title() {
        let (browser, log, _temp) = browser();
        let tab = browser.initialize().unwrap();

        browser.dispatch(EngineEvent::LoadFinished {
            tab_id: tab.id.clone(),
            title: "Welcome to the home page".to_string(),
        });
        assert_eq!(log.last(), format!("title {} Welcome to the ", tab.id));
    }

    #[test]
    fn test_download_lifecycle_reports_to_ui() {
        let temp_dl = tempdir().unwrap();
        let (browser, log, _temp) = browser_with_config(&format!(
            "download_folder = {}\n",
            toml::Value::String(temp_dl.path().to_string_lossy().to_string())
        ));
        browser.initialize().unwrap();

        browser.dispatch(EngineEvent::DownloadRequested(DownloadRequest {
            id: "7".to_string(),
            url: "https://x.com/a.bin".to_string(),
            suggested_name: None,
            item: Box::new(NoopItem),
        }));
        assert_eq!(browser.download("7").unwrap().file_path, temp_dl.path().join("a.bin"));

        browser.dispatch(EngineEvent::DownloadProgress {
            download_id: "7".to_string(),
            received: 1024,
            total: None,
        });
        assert_eq!(log.last(), "status Receiving: 1.0KB");

        browser.dispatch(EngineEvent::DownloadFinished {
            download_id: "7".to_string(),
            state: FinishState::Interrupted,
        });
        assert_eq!(log.last(), "warning Warning File download failed.");

        // Late events for the finished download are ignored
        let before = log.entries().len();
        browser.dispatch(EngineEvent::DownloadFinished {
            download_id: "7".to_string(),
            state: FinishState::Completed,
        });
        assert_eq!(log.entries().len(), before);
    }

    #[test]
    fn test_history_panel_operations() {
        let (browser, log, _temp) = browser();
        let tab = browser.initialize().unwrap();
        for url in ["https://a.com/", "https://b.com/"] {
            browser.dispatch(EngineEvent::UrlChanged {
                tab_id: tab.id.clone(),
                url: url.to_string(),
            });
        }

        browser.open_history_entry(0).unwrap();
        assert_eq!(log.last(), format!("load {} https://a.com/", tab.id));
        assert!(browser.open_history_entry(9).is_none());

        assert_eq!(browser.delete_history_entry(0).unwrap(), "https://a.com/");
        assert_eq!(browser.history(), vec!["https://b.com/"]);

        browser.clear_history().unwrap();
        assert!(browser.history().is_empty());
    }

    #[test]
    fn test_config_edit_applies_atomically() {
        let (browser, log, _temp) = browser();
        let tab = browser.initialize().unwrap();

        let mut session = browser.open_config_editor().unwrap();
        session.set_buffer("search_engine = \"https://other.com/?q=\"\nuser_agent = \"UA/2\"\n");
        let config = browser.save_config_edit(&mut session).unwrap();

        assert_eq!(config.search_engine, "https://other.com/?q=");
        // Everything not in the new file is back to its default
        assert_eq!(browser.config().homepage, Config::default().homepage);
        assert_eq!(log.count("profile UA/2"), 1);

        // Open tabs are untouched; the next search uses the new engine
        assert_eq!(browser.tab_manager().get_tab(&tab.id).unwrap().url, "https://home.com");
        browser.submit_address("rust");
        assert_eq!(log.last(), format!("load {} https://other.com/?q=rust", tab.id));

        assert_eq!(
            browser.close_config_editor(&mut session).unwrap(),
            CloseOutcome::Unchanged
        );
        assert_eq!(log.count("confirm"), 0);
    }

    #[test]
    fn test_close_editor_with_changes_prompts_once() {
        let (browser, log, _temp) = browser();
        browser.initialize().unwrap();

        let mut session = browser.open_config_editor().unwrap();
        session.set_buffer("new_tab = \"about:blank\"\n");
        *log.confirm_answer.lock() = false;

        assert_eq!(
            browser.close_config_editor(&mut session).unwrap(),
            CloseOutcome::Discarded
        );
        assert_eq!(log.count("confirm"), 1);
        assert_eq!(browser.config().new_tab, "https://new.com");

        let mut session = browser.open_config_editor().unwrap();
        session.set_buffer("new_tab = \"about:blank\"\n");
        *log.confirm_answer.lock() = true;

        assert!(matches!(
            browser.close_config_editor(&mut session).unwrap(),
            CloseOutcome::Saved(_)
        ));
        assert_eq!(log.count("confirm"), 2);
        assert_eq!(browser.config().new_tab, "about:blank");
    }

    #[test]
    fn test_failed_save_on_close_keeps_session_and_config() {
        let (browser, log, temp) = browser();
        browser.initialize().unwrap();
        std::fs::create_dir(temp.path().join("config.toml.tmp")).unwrap();

        let mut session = browser.open_config_editor().unwrap();
        session.set_buffer("new_tab = \"about:blank\"\n");
        *log.confirm_answer.lock() = true;

        assert!(browser.close_config_editor(&mut session).is_err());
        assert_eq!(session.buffer(), "new_tab = \"about:blank\"\n");
        assert_eq!(browser.config().new_tab, "https://new.com");

        std::fs::remove_dir(temp.path().join("config.toml.tmp")).unwrap();
        assert!(matches!(
            browser.close_config_editor(&mut session).unwrap(),
            CloseOutcome::Saved(_)
        ));
        assert_eq!(browser.config().new_tab, "about:blank");
    }

    #[test]
    fn test_reload_config_reads_file() {
        let (browser, _log, temp) = browser();
        std::fs::write(
            temp.path().join(CONFIG_FILE_NAME),
            "homepage = \"https://reloaded.com\"\n",
        )
        .unwrap();

        let config = browser.reload_config();
        assert_eq!(config.homepage, "https://reloaded.com");
        assert_eq!(browser.config().homepage, "https://reloaded.com");
    }
}
