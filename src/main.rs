//! daily-byte: a rotating "daily byte" panel for the terminal.
//!
//! ## Architecture overview
//!
//! ```text
//! ┌───────────┐ join_all ┌──────────┐  write  ┌──────────┐
//! │ source/*  │ ───────► │ poll.rs  │ ──────► │ cache.rs │
//! │ (5 feeds) │          │ (refresh)│         │ (TTL)    │
//! └───────────┘          └──────────┘         └──────────┘
//!                              ▲                    │ read
//!                              │ on miss            ▼
//!                        ┌──────────────────────────────┐  snapshot()  ┌────────┐
//!                        │ service.rs (+ rotation.rs)   │ ───────────► │ app/ui │
//!                        └──────────────────────────────┘              └────────┘
//! ```
//!
//! * **`source/`**: the `ContentSource` trait, content types, bundled
//!   fallback data and one adapter per category.
//! * **`poll`**: fetches all sources concurrently into a `ContentSet`.
//! * **`cache`** / **`store`**: TTL cache over a small key-value store.
//! * **`rotation`**: per-category display index, advanced on a timer.
//! * **`service`**: the facade combining the above, with `start`/`stop`.
//! * **`app`**, **`ui`**, **`input`**: the terminal front end.
//! * **`main`**: wires everything together: config, logging, terminal, and
//!   the event loop.

mod app;
mod cache;
mod clock;
mod config;
mod diagnostics;
mod input;
mod lock;
mod poll;
mod rotation;
mod service;
mod source;
mod store;
mod ui;

use std::io;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;
use crossterm::{
    event::{self, Event},
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::EnvFilter;

use app::App;
use cache::CacheStore;
use clock::SystemClock;
use config::Config;
use diagnostics::{Diagnostics, TracingDiagnostics};
use poll::Orchestrator;
use service::ContentService;
use store::{FileStore, KeyValueStore, MemoryStore};

#[derive(Debug, Parser)]
#[command(name = "daily-byte", version, about)]
struct Cli {
    /// Path to a TOML config file.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Resolve content once, print it as JSON and exit.
    #[arg(long)]
    print: bool,

    /// Keep the content cache in memory only.
    #[arg(long)]
    no_persist: bool,

    /// Discard cached content and fetch everything again.
    #[arg(long)]
    refresh: bool,

    /// Increase log verbosity (-v, -vv, -vvv).
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

// ---------------------------------------------------------------------------
// Terminal guard
// ---------------------------------------------------------------------------

/// Manages terminal raw-mode and alternate-screen lifetime via [`Drop`].
struct TerminalGuard {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
}

impl TerminalGuard {
    fn new() -> Result<Self> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(Self { terminal })
    }
}

impl Drop for TerminalGuard {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Install a panic hook that restores the terminal before printing the
/// panic message.
fn install_panic_hook() {
    let original_hook = std::panic::take_hook();
    std::panic::set_hook(Box::new(move |info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(info);
    }));
}

// ---------------------------------------------------------------------------
// Setup
// ---------------------------------------------------------------------------

fn env_filter(verbose: u8) -> EnvFilter {
    EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    })
}

/// Logs go to stderr in `--print` mode and to a file otherwise, so they
/// never draw over the terminal UI.
fn init_logging(cli: &Cli, log_dir: &Path) -> Result<Option<WorkerGuard>> {
    let filter = env_filter(cli.verbose);
    if cli.print {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
        return Ok(None);
    }

    std::fs::create_dir_all(log_dir)
        .with_context(|| format!("creating log directory {}", log_dir.display()))?;
    let appender = tracing_appender::rolling::never(log_dir, "daily-byte.log");
    let (writer, guard) = tracing_appender::non_blocking(appender);
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_ansi(false)
        .with_writer(writer)
        .init();
    Ok(Some(guard))
}

fn build_service(config: &Config, refresh: bool) -> Result<ContentService> {
    let diagnostics: Arc<dyn Diagnostics> = Arc::new(TracingDiagnostics);
    let backing: Box<dyn KeyValueStore> = if config.persist {
        Box::new(FileStore::new(config.cache_dir()))
    } else {
        Box::new(MemoryStore::default())
    };
    let cache = CacheStore::new(
        backing,
        Arc::new(SystemClock),
        Arc::clone(&diagnostics),
        config.cache_ttl(),
        config.items_per_category,
    );
    if refresh {
        cache.clear();
    }
    let sources = source::default_sources(config).context("building HTTP client")?;
    let orchestrator = Orchestrator::new(sources, config.items_per_category, diagnostics);

    Ok(ContentService::new(
        cache,
        orchestrator,
        config.items_per_category,
        config.rotation_interval(),
        config.refresh_check_interval(),
    ))
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if cli.no_persist {
        config.persist = false;
    }
    let _log_guard = init_logging(&cli, &config.cache_dir())?;
    tracing::info!(?config, "starting daily-byte");

    let service = Arc::new(build_service(&config, cli.refresh)?);

    if cli.print {
        let content = service.get_content().await;
        println!("{}", serde_json::to_string_pretty(&content)?);
        return Ok(());
    }

    service.start();
    install_panic_hook();
    let mut guard = TerminalGuard::new()?;
    let mut app = App::new(Arc::clone(&service));

    // -- main event loop -----------------------------------------------------
    // Runs at ~10 fps.  Rotation and refresh happen on the service's own
    // tasks; each frame just picks up the latest snapshot.
    let tick_rate = Duration::from_millis(100);

    loop {
        app.refresh();
        guard.terminal.draw(|f| ui::draw(&app, f))?;

        if event::poll(tick_rate)? {
            if let Event::Key(key) = event::read()? {
                input::handle_key_event(&mut app, key);
            }
        }

        if app.quit {
            break;
        }
    }

    service.stop();
    // `guard` is dropped here, restoring the terminal.
    Ok(())
}
