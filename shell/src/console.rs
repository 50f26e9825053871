//! Line console
//!
//! Prints window chrome updates to stdout and turns input lines into browser
//! calls.

use parking_lot::Mutex;
use std::collections::VecDeque;
use std::sync::Arc;

use hythonium_core::{Browser, CloseOutcome, EditSession, ShellUi};

use crate::engine::HeadlessEngine;

const HELP: &str = "\
Commands:
  go <text>          open an address or search in the current tab
  new                open a new tab
  close [n]          close tab n (default: current)
  tab <n>            switch to tab n
  tabs               list tabs
  history            list history
  history open <n>   open history entry n in the current tab
  history rm <n>     delete history entry n
  history clear      delete all history
  download <url>     download a file (file: URLs only)
  downloads          list downloads in progress
  popup              let the current page request a new window
  config show        print the configuration in effect
  config reload      re-read config.toml
  config edit        edit config.toml (:w save, :q close, :wq save and close)
  help               show this text
  quit               exit";

pub fn print_help() {
    println!("{}", HELP);
}

/// A parsed console line. Positions are zero-based.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Go(String),
    New,
    Close(Option<usize>),
    Tab(usize),
    Tabs,
    History,
    HistoryOpen(usize),
    HistoryRemove(usize),
    HistoryClear,
    Download(String),
    Downloads,
    Popup,
    ConfigShow,
    ConfigReload,
    ConfigEdit,
    Help,
    Quit,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("Unknown command: {0} (type `help` for a list)")]
    Unknown(String),

    #[error("Usage: {0}")]
    Usage(&'static str),

    #[error("Not a valid position: {0}")]
    InvalidIndex(String),
}

/// Parse one input line. Blank lines are `None`.
pub fn parse_command(line: &str) -> Result<Option<Command>, CommandError> {
    let line = line.trim();
    if line.is_empty() {
        return Ok(None);
    }

    let (word, rest) = match line.split_once(char::is_whitespace) {
        Some((word, rest)) => (word, rest.trim()),
        None => (line, ""),
    };

    let command = match (word, rest) {
        ("go", "") => return Err(CommandError::Usage("go <address or search terms>")),
        ("go", text) => Command::Go(text.to_string()),
        ("new", _) => Command::New,
        ("close", "") => Command::Close(None),
        ("close", n) => Command::Close(Some(parse_position(n)?)),
        ("tab", "") => return Err(CommandError::Usage("tab <n>")),
        ("tab", n) => Command::Tab(parse_position(n)?),
        ("tabs", _) => Command::Tabs,
        ("history", rest) => parse_history(rest)?,
        ("download", "") => return Err(CommandError::Usage("download <url>")),
        ("download", url) => Command::Download(url.to_string()),
        ("downloads", _) => Command::Downloads,
        ("popup", _) => Command::Popup,
        ("config", "show") => Command::ConfigShow,
        ("config", "reload") => Command::ConfigReload,
        ("config", "edit") => Command::ConfigEdit,
        ("config", _) => return Err(CommandError::Usage("config show|reload|edit")),
        ("help", _) => Command::Help,
        ("quit" | "exit", _) => Command::Quit,
        (other, _) => return Err(CommandError::Unknown(other.to_string())),
    };

    Ok(Some(command))
}

fn parse_history(rest: &str) -> Result<Command, CommandError> {
    const USAGE: &str = "history [open <n>|rm <n>|clear]";

    let mut parts = rest.split_whitespace();
    let command = match (parts.next(), parts.next()) {
        (None, _) => Command::History,
        (Some("clear"), None) => Command::HistoryClear,
        (Some("open"), Some(n)) => Command::HistoryOpen(parse_position(n)?),
        (Some("rm"), Some(n)) => Command::HistoryRemove(parse_position(n)?),
        _ => return Err(CommandError::Usage(USAGE)),
    };

    if parts.next().is_some() {
        return Err(CommandError::Usage(USAGE));
    }

    Ok(command)
}

/// One-based position as typed, zero-based as returned
fn parse_position(text: &str) -> Result<usize, CommandError> {
    match text.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(CommandError::InvalidIndex(text.to_string())),
    }
}

fn short_id(id: &str) -> &str {
    id.get(..8).unwrap_or(id)
}

/// `ShellUi` on stdout.
///
/// Questions cannot block on stdin while the dispatch loop owns it, so the
/// console collects the answer first and queues it before the call that asks.
#[derive(Default)]
pub struct ConsoleUi {
    answers: Mutex<VecDeque<bool>>,
}

impl ConsoleUi {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn queue_answer(&self, answer: bool) {
        self.answers.lock().push_back(answer);
    }
}

impl ShellUi for ConsoleUi {
    fn set_address_bar(&self, text: &str) {
        println!("[address] {}", text);
    }

    fn tab_opened(&self, tab_id: &str, title: &str) {
        println!("[tab {}] opened: {}", short_id(tab_id), title);
    }

    fn tab_closed(&self, tab_id: &str) {
        println!("[tab {}] closed", short_id(tab_id));
    }

    fn set_tab_title(&self, tab_id: &str, title: &str) {
        println!("[tab {}] {}", short_id(tab_id), title);
    }

    fn show_status(&self, text: &str) {
        println!("[status] {}", text);
    }

    fn notify_info(&self, title: &str, message: &str) {
        println!("== {} ==\n{}", title, message);
    }

    fn notify_warning(&self, title: &str, message: &str) {
        println!("!! {}: {}", title, message);
    }

    fn confirm(&self, title: &str, question: &str) -> bool {
        match self.answers.lock().pop_front() {
            Some(answer) => answer,
            None => {
                println!("{}: {} (no answer, assuming no)", title, question);
                false
            }
        }
    }
}

/// Whether the dispatch loop keeps running
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

struct ConfigEditor {
    session: EditSession,
    /// Lines typed since the last `:w`; replace the buffer when non-empty
    typed: Vec<String>,
    awaiting_answer: bool,
}

impl ConfigEditor {
    fn commit_typed(&mut self) {
        if self.typed.is_empty() {
            return;
        }
        let mut text = self.typed.join("\n");
        text.push('\n');
        self.session.set_buffer(text);
        self.typed.clear();
    }
}

pub struct Console {
    browser: Browser,
    engine: Arc<HeadlessEngine>,
    ui: Arc<ConsoleUi>,
    editor: Option<ConfigEditor>,
}

impl Console {
    pub fn new(browser: Browser, engine: Arc<HeadlessEngine>, ui: Arc<ConsoleUi>) -> Self {
        Self {
            browser,
            engine,
            ui,
            editor: None,
        }
    }

    pub fn handle_line(&mut self, line: &str) -> Flow {
        if let Some(editor) = self.editor.take() {
            self.editor = self.handle_editor_line(editor, line);
            return Flow::Continue;
        }

        match parse_command(line) {
            Ok(Some(command)) => self.execute(command),
            Ok(None) => Flow::Continue,
            Err(e) => {
                println!("{}", e);
                Flow::Continue
            }
        }
    }

    fn execute(&mut self, command: Command) -> Flow {
        let result = match command {
            Command::Go(text) => {
                if self.browser.submit_address(&text).is_none() {
                    println!("No tab to navigate");
                }
                Ok(())
            }
            Command::New => self.browser.new_tab().map(|_| ()),
            Command::Close(position) => {
                self.close_tab(position);
                Ok(())
            }
            Command::Tab(position) => match self.tab_id_at(Some(position)) {
                Some(id) => self.browser.activate_tab(&id).map(|_| ()),
                None => {
                    println!("No tab {}", position + 1);
                    Ok(())
                }
            },
            Command::Tabs => {
                self.print_tabs();
                Ok(())
            }
            Command::History => {
                let entries = self.browser.history();
                if entries.is_empty() {
                    println!("History is empty");
                }
                for (i, url) in entries.iter().enumerate() {
                    println!("{:>4}  {}", i + 1, url);
                }
                Ok(())
            }
            Command::HistoryOpen(index) => {
                if self.browser.open_history_entry(index).is_none() {
                    println!("No history entry {}", index + 1);
                }
                Ok(())
            }
            Command::HistoryRemove(index) => self
                .browser
                .delete_history_entry(index)
                .map(|url| println!("Deleted {}", url)),
            Command::HistoryClear => self
                .browser
                .clear_history()
                .map(|_| println!("History cleared")),
            Command::Download(url) => {
                self.engine.request_download(&url);
                Ok(())
            }
            Command::Downloads => {
                let downloads = self.browser.download_manager().list_downloads();
                if downloads.is_empty() {
                    println!("No downloads in progress");
                }
                for task in downloads {
                    println!(
                        "{}  {:<11}  {}  {}",
                        task.id,
                        task.state.as_str(),
                        task.file_name,
                        task.status_text()
                    );
                }
                Ok(())
            }
            Command::Popup => {
                match self.browser.tab_manager().active_tab_id() {
                    Some(opener) => self.engine.request_new_window(&opener),
                    None => println!("No active tab"),
                }
                Ok(())
            }
            Command::ConfigShow => {
                self.print_config();
                Ok(())
            }
            Command::ConfigReload => {
                self.browser.reload_config();
                println!("Configuration reloaded");
                Ok(())
            }
            Command::ConfigEdit => self.browser.open_config_editor().map(|session| {
                println!("{}", session.buffer().trim_end());
                println!(
                    "-- Type the new config.toml, then :w to save, :q to close, :wq for both --"
                );
                self.editor = Some(ConfigEditor {
                    session,
                    typed: Vec::new(),
                    awaiting_answer: false,
                });
            }),
            Command::Help => {
                print_help();
                Ok(())
            }
            Command::Quit => return Flow::Quit,
        };

        if let Err(e) = result {
            tracing::warn!(error = %e, "Command failed");
            println!("Error: {}", e);
        }

        Flow::Continue
    }

    /// Feed one line to the open editor. Returns the editor while it stays open.
    fn handle_editor_line(
        &mut self,
        mut editor: ConfigEditor,
        line: &str,
    ) -> Option<ConfigEditor> {
        if editor.awaiting_answer {
            let answer = matches!(line.trim().to_ascii_lowercase().as_str(), "y" | "yes");
            self.ui.queue_answer(answer);
            editor.awaiting_answer = false;
            return self.close_editor(editor);
        }

        match line.trim() {
            ":w" | ":wq" => {
                editor.commit_typed();
                match self.browser.save_config_edit(&mut editor.session) {
                    Ok(_) => println!("Configuration saved"),
                    Err(e) => {
                        println!("Error: {}", e);
                        return Some(editor);
                    }
                }
                if line.trim() == ":wq" {
                    return self.close_editor(editor);
                }
                Some(editor)
            }
            ":q" => {
                editor.commit_typed();
                if editor.session.is_modified() {
                    println!(
                        "The configuration has been modified. Save before closing? [y/N]"
                    );
                    editor.awaiting_answer = true;
                    return Some(editor);
                }
                self.close_editor(editor)
            }
            _ => {
                editor.typed.push(line.to_string());
                Some(editor)
            }
        }
    }

    /// Close the editor. A failed save keeps it open with the edits.
    fn close_editor(&self, mut editor: ConfigEditor) -> Option<ConfigEditor> {
        match self.browser.close_config_editor(&mut editor.session) {
            Ok(CloseOutcome::Saved(_)) => println!("Configuration saved"),
            Ok(CloseOutcome::Discarded) => println!("Changes discarded"),
            Ok(CloseOutcome::Unchanged) => {}
            Err(e) => {
                tracing::warn!(error = %e, "Saving config on close failed");
                println!("Error: {}", e);
                println!("-- Still editing; :w to retry, :q to close --");
                return Some(editor);
            }
        }
        None
    }

    fn close_tab(&self, position: Option<usize>) {
        let Some(id) = self.tab_id_at(position) else {
            println!("No such tab");
            return;
        };

        if !self.browser.close_tab(&id) {
            println!("The last tab cannot be closed");
        }
    }

    /// Id of the tab at `position`, or of the active tab
    fn tab_id_at(&self, position: Option<usize>) -> Option<String> {
        match position {
            Some(index) => self
                .browser
                .tab_manager()
                .tabs()
                .get(index)
                .map(|tab| tab.id.clone()),
            None => self.browser.tab_manager().active_tab_id(),
        }
    }

    fn print_tabs(&self) {
        let tabs = self.browser.tab_manager();
        let active = tabs.active_tab_id();
        for (i, tab) in tabs.tabs().iter().enumerate() {
            let marker = if active.as_deref() == Some(tab.id.as_str()) {
                '*'
            } else {
                ' '
            };
            println!("{}{:>3}  {:<15}  {}", marker, i + 1, tab.display_title(), tab.url);
        }
    }

    fn print_config(&self) {
        let config = self.browser.config();
        match toml::to_string_pretty(&*config) {
            Ok(text) => print!("{}", text),
            Err(e) => println!("Error: {}", e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use hythonium_core::BrowserPaths;
    use tempfile::tempdir;
    use tokio::sync::mpsc::unbounded_channel;

    #[test]
    fn test_parse_navigation_commands() {
        assert_eq!(
            parse_command("go  hello world ").unwrap(),
            Some(Command::Go("hello world".to_string()))
        );
        assert_eq!(parse_command("new").unwrap(), Some(Command::New));
        assert_eq!(parse_command("close").unwrap(), Some(Command::Close(None)));
        assert_eq!(parse_command("close 2").unwrap(), Some(Command::Close(Some(1))));
        assert_eq!(parse_command("tab 1").unwrap(), Some(Command::Tab(0)));
        assert_eq!(parse_command("   ").unwrap(), None);
    }

    #[test]
    fn test_parse_history_commands() {
        assert_eq!(parse_command("history").unwrap(), Some(Command::History));
        assert_eq!(parse_command("history open 3").unwrap(), Some(Command::HistoryOpen(2)));
        assert_eq!(parse_command("history rm 1").unwrap(), Some(Command::HistoryRemove(0)));
        assert_eq!(parse_command("history clear").unwrap(), Some(Command::HistoryClear));
        assert_eq!(
            parse_command("history open"),
            Err(CommandError::Usage("history [open <n>|rm <n>|clear]"))
        );
    }

    #[test]
    fn test_parse_errors() {
        assert_eq!(parse_command("go"), Err(CommandError::Usage("go <address or search terms>")));
        assert_eq!(parse_command("tab 0"), Err(CommandError::InvalidIndex("0".to_string())));
        assert_eq!(parse_command("tab x"), Err(CommandError::InvalidIndex("x".to_string())));
        assert_eq!(parse_command("fly"), Err(CommandError::Unknown("fly".to_string())));
    }

    #[test]
    fn test_parse_config_commands() {
        assert_eq!(parse_command("config show").unwrap(), Some(Command::ConfigShow));
        assert_eq!(parse_command("config reload").unwrap(), Some(Command::ConfigReload));
        assert_eq!(parse_command("config edit").unwrap(), Some(Command::ConfigEdit));
        assert!(parse_command("config").is_err());
    }

    #[test]
    fn test_queued_answers_are_used_in_order() {
        let ui = ConsoleUi::new();
        ui.queue_answer(true);
        ui.queue_answer(false);

        assert!(ui.confirm("t", "q"));
        assert!(!ui.confirm("t", "q"));
        // Nothing queued reads as a dismissed prompt
        assert!(!ui.confirm("t", "q"));
    }

    #[test]
    fn test_short_id() {
        assert_eq!(short_id("0123456789abcdef"), "01234567");
        assert_eq!(short_id("abc"), "abc");
    }

    #[test]
    fn test_editor_stays_open_when_save_on_close_fails() {
        let temp = tempdir().unwrap();
        let paths = BrowserPaths::in_dir(temp.path());
        std::fs::write(&paths.config_file, "new_tab = \"https://new.com\"\n").unwrap();
        std::fs::create_dir(temp.path().join("config.toml.tmp")).unwrap();

        let (tx, _rx) = unbounded_channel();
        let engine = Arc::new(HeadlessEngine::new(tx));
        let ui = Arc::new(ConsoleUi::new());
        let browser = Browser::new(&paths, engine.clone(), ui.clone());
        let mut console = Console::new(browser.clone(), engine, ui);

        for line in ["config edit", "new_tab = \"about:blank\"", ":q", "y"] {
            assert_eq!(console.handle_line(line), Flow::Continue);
        }
        let editor = console.editor.as_ref().unwrap();
        assert_eq!(editor.session.buffer(), "new_tab = \"about:blank\"\n");
        assert_eq!(browser.config().new_tab, "https://new.com");

        std::fs::remove_dir(temp.path().join("config.toml.tmp")).unwrap();
        for line in [":q", "y"] {
            console.handle_line(line);
        }
        assert!(console.editor.is_none());
        assert_eq!(browser.config().new_tab, "about:blank");
    }
}
