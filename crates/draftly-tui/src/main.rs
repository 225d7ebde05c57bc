use std::fs::{self, File};
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use draftly_core::Config;
use tracing_subscriber::EnvFilter;

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser)]
#[command(name = "draftly")]
#[command(about = "Terminal rich-text editor with an AI writing assistant")]
struct Cli {
    /// Base URL of a running draftly-server
    #[arg(short, long)]
    server: Option<String>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    let config = Config::load()?;
    let server_url = cli.server.unwrap_or_else(|| config.server_url().to_string());
    tracing::info!(%server_url, "starting draftly");

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let result = run(&mut terminal, App::new(&server_url)?).await;
    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, mut app: App) -> Result<()> {
    let mut events = EventHandler::new();

    while !app.should_quit {
        terminal.draw(|frame| ui::render(&mut app, frame))?;

        let Some(event) = events.next().await else {
            break;
        };
        handler::handle_event(&mut app, event).await?;
    }
    Ok(())
}

/// Logs go to a file; the terminal belongs to the ui.
fn init_logging() -> Result<()> {
    let dir = dirs::cache_dir()
        .context("could not determine cache directory")?
        .join("draftly");
    fs::create_dir_all(&dir)?;
    let file = File::create(dir.join("draftly.log"))?;

    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();
    Ok(())
}
