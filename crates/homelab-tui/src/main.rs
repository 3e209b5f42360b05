//! homelab-hub - a keyboard-driven terminal dashboard for homelab services.
//!
//! Shows the services listed in a `services.json` catalog as a grid of
//! cards, grouped into tabs and searchable across all tabs. Every catalog
//! request goes through the offline cache gatekeeper, so the last good
//! catalog is still shown when the server is unreachable.

mod app;
mod ui;

use std::io;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyModifiers},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{backend::CrosstermBackend, Terminal};
use tracing::{info, warn};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use homelab_core::catalog;
use homelab_core::config::Config;
use homelab_core::gatekeeper::{DiskCacheStorage, Gatekeeper};
use homelab_core::net::{Fetch, HttpClient};

use app::{App, AppState};
use ui::grid::columns_for_width;
use ui::input::handle_input;
use ui::render::{grid_area, render};

// ============================================================================
// Constants
// ============================================================================

/// Timeout for polling terminal events (in milliseconds)
const EVENT_POLL_TIMEOUT_MS: u64 = 100;

const LOG_FILE: &str = "homelab-hub.log";

/// Cache generations live under this directory inside the cache dir.
const GENERATIONS_DIR: &str = "generations";

/// Initialize file logging. The TUI owns the terminal, so nothing goes to
/// stderr. Use RUST_LOG to control the level (e.g., RUST_LOG=debug).
fn init_tracing(log_dir: &Path) -> Result<WorkerGuard> {
    std::fs::create_dir_all(log_dir)?;
    let file_appender = tracing_appender::rolling::never(log_dir, LOG_FILE);
    let (writer, guard) = tracing_appender::non_blocking(file_appender);

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));

    tracing_subscriber::registry()
        .with(fmt::layer().with_writer(writer).with_ansi(false))
        .with(filter)
        .init();

    Ok(guard)
}

/// Build the gatekeeper-wrapped fetcher and run its install/activate cycle.
///
/// A failed install leaves the gatekeeper redundant: requests then go
/// straight to the network and nothing is cached.
async fn build_fetcher(config: &Config, cache_dir: &Path) -> Result<Arc<dyn Fetch>> {
    let network = HttpClient::new()?;
    let storage = DiskCacheStorage::new(cache_dir.join(GENERATIONS_DIR))?;
    let mut gatekeeper = Gatekeeper::new(
        config.cache.clone(),
        config.services_url()?,
        network,
        storage,
    );

    if let Err(e) = gatekeeper.register().await {
        warn!(error = %e, generation = gatekeeper.generation(), "Cache gatekeeper not active");
    }
    info!(state = ?gatekeeper.state(), "Cache gatekeeper ready");

    Ok(Arc::new(gatekeeper))
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load .env file if present (silently ignore if not found)
    let _ = dotenvy::dotenv();

    let loaded = Config::load();
    let config = match &loaded {
        Ok(config) => config.clone(),
        Err(_) => Config::default(),
    };
    let cache_dir = config.cache_dir()?;

    let _guard = init_tracing(&cache_dir)?;
    info!("homelab-hub starting");
    if let Err(e) = loaded {
        warn!(error = %e, "Failed to load config, using defaults");
    }

    let fetcher = build_fetcher(&config, &cache_dir).await?;

    // Check for CLI commands
    let args: Vec<String> = std::env::args().collect();
    if args.len() > 1 && args[1] == "--dump-services" {
        return dump_services(&config, fetcher.as_ref()).await;
    }

    // Setup terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    // Create app and start the first load
    let mut app = App::new(config, fetcher)?;
    app.tick_local();
    app.load_services();

    // Main loop
    let result = run_app(&mut terminal, &mut app).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )?;
    terminal.show_cursor()?;

    if let Err(e) = result {
        eprintln!("Error: {}", e);
    }

    info!("homelab-hub shutting down");
    Ok(())
}

/// Load the catalog through the gatekeeper and print it to stdout as JSON
async fn dump_services(config: &Config, fetcher: &dyn Fetch) -> Result<()> {
    let url = config.services_url()?;
    eprintln!("Loading {}...", url);

    let loaded = catalog::load_services(fetcher, &url, &config.cache.cache_bust_param).await?;
    if let Some(cached_at) = loaded.cached_at {
        eprintln!(
            "Server unreachable, using catalog cached {}",
            homelab_core::gatekeeper::age_display(cached_at)
        );
    }

    let json = serde_json::to_string_pretty(&loaded.services)?;
    println!("{}", json);

    eprintln!("Done! {} services.", loaded.services.len());
    Ok(())
}

async fn run_app(
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
    app: &mut App,
) -> Result<()> {
    loop {
        // Draw UI
        terminal.draw(|f| {
            app.grid_columns = columns_for_width(grid_area(f.area()).width);
            render(f, app);
        })?;

        // Poll for events with timeout to allow background updates
        if event::poll(Duration::from_millis(EVENT_POLL_TIMEOUT_MS))? {
            if let Event::Key(key) = event::read()? {
                // Ctrl+C to quit
                if key.code == KeyCode::Char('c') && key.modifiers.contains(KeyModifiers::CONTROL) {
                    return Ok(());
                }

                // Handle input
                if handle_input(app, key).await? {
                    return Ok(());
                }
            }
        }

        // Check for completed background loads
        app.check_background_tasks();

        // Refresh greeting and clock on minute boundaries
        app.tick_local();

        // Check if we should quit
        if matches!(app.state, AppState::Quitting) {
            return Ok(());
        }
    }
}
