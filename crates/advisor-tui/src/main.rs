use std::sync::Arc;

use advisor_core::{Config, RelayClient};
use anyhow::Result;
use clap::Parser;

mod app;
mod handler;
mod logging;
mod markdown;
mod tui;
mod ui;

use app::App;
use tui::EventHandler;

#[derive(Parser, Debug)]
#[command(name = "advisor")]
#[command(about = "Chat with a real estate market advisor from the terminal")]
struct Cli {
    /// Base URL of the relay server
    #[arg(long, env = "ADVISOR_RELAY_URL")]
    relay_url: Option<String>,

    /// Remember the given relay URL in the config file
    #[arg(long, requires = "relay_url")]
    save: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let log_path = logging::init();

    let mut config = Config::load().unwrap_or_else(|e| {
        tracing::warn!(error = %e, "could not read config, using defaults");
        Config::new()
    });
    if let Some(url) = cli.relay_url {
        config.relay_url = Some(url);
        if cli.save {
            config.save()?;
        }
    }

    let relay_url = config.relay_url().to_string();
    tracing::info!(relay = %relay_url, log = ?log_path, "starting advisor");

    let relay = Arc::new(RelayClient::new(&relay_url));
    let mut app = App::new(relay, &relay_url);

    tui::install_panic_hook();
    let mut terminal = tui::init()?;
    let mut events = EventHandler::new();

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    result
}

async fn run(terminal: &mut tui::Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event).await?,
            None => break,
        }
    }
    Ok(())
}
