//! Hythonium Browser - headless shell
//!
//! Runs the browser session on a single dispatch loop: engine events and
//! console lines are applied one at a time, in arrival order.

mod console;
mod engine;

use anyhow::Result;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;

use hythonium_core::{Browser, BrowserPaths};

use console::{Console, ConsoleUi, Flow};
use engine::HeadlessEngine;

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    hythonium_core::init_logging();

    let paths = BrowserPaths::beside_executable();
    tracing::info!(
        config = %paths.config_file.display(),
        history = %paths.history_file.display(),
        "Starting Hythonium"
    );

    let (events_tx, mut events_rx) = mpsc::unbounded_channel();
    let engine = Arc::new(HeadlessEngine::new(events_tx));
    let ui = Arc::new(ConsoleUi::new());

    let browser = Browser::new(&paths, engine.clone(), ui.clone());
    browser.initialize()?;

    let mut console = Console::new(browser.clone(), engine, ui);
    console::print_help();

    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            // Drain engine events before reading the next command
            biased;

            Some(event) = events_rx.recv() => browser.dispatch(event),
            line = lines.next_line() => match line? {
                Some(line) => {
                    if console.handle_line(&line) == Flow::Quit {
                        break;
                    }
                }
                None => break,
            },
        }
    }

    tracing::info!("Hythonium shut down");

    Ok(())
}
