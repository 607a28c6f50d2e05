use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;
use yieldseeker_core::config::app_config_dir;
use yieldseeker_core::{
    ApiStyle, AuthSignals, AuthStore, ChatBackend, ChatClient, ChatController, Config, Guard,
    SessionStore,
};

mod app;
mod handler;
mod tui;
mod ui;

use app::App;
use tui::{EventHandler, Tui};

#[derive(Parser)]
#[command(name = "yieldseeker")]
#[command(about = "Chat with the Yield Seeker agent from your terminal")]
struct Cli {
    /// Agent API base URL (overrides YIELDSEEKER_API_URL and the config file)
    #[arg(long)]
    api_url: Option<String>,
    /// Use the older `/chat` endpoints
    #[arg(long)]
    legacy_api: bool,
    /// Write logs here instead of the config directory
    #[arg(long)]
    log_file: Option<PathBuf>,
    /// Start the chat without the welcome messages
    #[arg(long)]
    no_welcome: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load().unwrap_or_else(|e| {
        eprintln!("Ignoring unreadable config: {}", e);
        Config::default()
    });
    init_logging(&config, cli.log_file.as_deref())?;

    let base_url = config.api_url(cli.api_url.as_deref());
    let style = if cli.legacy_api {
        ApiStyle::Legacy
    } else {
        config.api_style()
    };
    // Constructed once here and handed down
    let client = ChatClient::with_style(&base_url, style);
    tracing::info!(
        base_url = client.base_url(),
        style = style.as_str(),
        "Yield Seeker starting v{}",
        env!("CARGO_PKG_VERSION")
    );
    let backend: Arc<dyn ChatBackend> = Arc::new(client);
    let session_store = match SessionStore::new() {
        Ok(store) => Some(store),
        Err(e) => {
            tracing::warn!(error = %e, "wallet session will not be persisted");
            None
        }
    };
    let initial = load_session(session_store.as_ref());
    let auth = Arc::new(AuthStore::new(initial));
    let guard = Guard::new(config.required_chain_id());

    let mut events = EventHandler::new();
    events.forward_auth_changes(auth.watch(guard));

    let chat = ChatController::new(backend, config.show_welcome() && !cli.no_welcome);
    let mut app = App::new(guard, auth, session_store, chat, events.sender());
    app.apply_guard();

    tui::install_panic_hook();
    let mut terminal = tui::init()?;

    let result = run(&mut terminal, &mut app, &mut events).await;

    tui::restore()?;
    tracing::info!("Yield Seeker exiting");
    result
}

async fn run(terminal: &mut Tui, app: &mut App, events: &mut EventHandler) -> Result<()> {
    while !app.should_quit {
        terminal.draw(|frame| ui::render(app, frame))?;

        match events.next().await {
            Some(event) => handler::handle_event(app, event)?,
            None => break,
        }
    }
    Ok(())
}

fn load_session(store: Option<&SessionStore>) -> AuthSignals {
    let Some(store) = store else {
        return AuthSignals::default();
    };
    match store.load() {
        Ok(signals) => signals,
        Err(e) => {
            tracing::warn!(error = %e, path = %store.path().display(), "discarding unreadable wallet session");
            AuthSignals::default()
        }
    }
}

/// Logs go to a file: stderr belongs to the terminal UI.
fn init_logging(config: &Config, log_file: Option<&Path>) -> Result<()> {
    let path = match log_file {
        Some(path) => path.to_path_buf(),
        None => app_config_dir()?.join("yieldseeker.log"),
    };
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(&path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new(config.log_filter())),
        )
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}
