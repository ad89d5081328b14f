//! Triage TUI Entry Point
//!
//! Launches the terminal client for asking questions against the indexed
//! document store.
//!
//! Usage:
//!   triage-tui [OPTIONS]
//!
//! Options:
//!   --config <FILE>        Config file (default: ~/.config/triage/triage.toml)
//!   --base-url <URL>       Backend base URL
//!   --topk <N>             Starting retrieval breadth (2-6)
//!   --timeout-secs <SECS>  Request timeout
//!   --audit-log <FILE>     Record each exchange as a JSON line
//!   --log-file <FILE>      Write logs to a file

use std::fs::OpenOptions;
use std::io;
use std::panic;
use std::path::PathBuf;
use std::sync::Mutex;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use triage_conductor::{default_config_path, load_config_from_path, ConfigOverrides, TriageConfig};
use triage_tui::{App, ConductorClient};

/// Terminal client for grounded answers from your documents
#[derive(Parser, Debug)]
#[command(name = "triage-tui")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Path to configuration file
    #[arg(short, long, env = "TRIAGE_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Backend base URL (e.g. http://localhost:8000)
    #[arg(long, value_name = "URL")]
    base_url: Option<String>,

    /// Starting retrieval breadth
    #[arg(long, value_name = "N")]
    topk: Option<u32>,

    /// Request timeout in seconds
    #[arg(long, value_name = "SECS")]
    timeout_secs: Option<u64>,

    /// Record each exchange to this JSONL file
    #[arg(long, value_name = "FILE")]
    audit_log: Option<PathBuf>,

    /// Write logs to this file (the terminal is busy with the UI)
    #[arg(long, env = "TRIAGE_LOG_FILE", value_name = "FILE")]
    log_file: Option<PathBuf>,
}

impl Cli {
    fn overrides(&self) -> ConfigOverrides {
        let mut overrides = ConfigOverrides::new();
        if let Some(ref url) = self.base_url {
            overrides = overrides.with_base_url(url.clone());
        }
        if let Some(top_k) = self.topk {
            overrides = overrides.with_top_k(top_k);
        }
        if let Some(secs) = self.timeout_secs {
            overrides = overrides.with_timeout_secs(secs);
        }
        if let Some(ref path) = self.audit_log {
            overrides = overrides.with_audit_log(path.clone());
        }
        overrides
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    init_logging(cli.log_file.as_ref())?;

    let config = resolve_config(&cli)?;

    // Check if we have a TTY before attempting initialization
    use std::io::IsTerminal;

    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: triage-tui requires a terminal (TTY)");
        eprintln!();
        eprintln!("This usually means:");
        eprintln!("  - Running in a non-interactive environment (CI, container)");
        eprintln!("  - SSH without -t flag");
        eprintln!("  - Piped stdin/stdout");
        std::process::exit(1);
    }

    let client = ConductorClient::from_config(&config)?;

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        // Restore terminal before printing panic
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    // Run the app
    let mut app = App::new(client);
    let result = app.run(&mut terminal).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result?;

    // Show goodbye message after TUI closes
    if let Some(goodbye) = app.goodbye() {
        println!("\n{goodbye}\n");
    }

    Ok(())
}

/// Install the tracing subscriber
///
/// Raw mode owns the terminal, so formatted output only goes to a file.
fn init_logging(log_file: Option<&PathBuf>) -> anyhow::Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_target(false)
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(file_layer)
        .init();
    Ok(())
}

/// Defaults, then file, then environment, then CLI flags
fn resolve_config(cli: &Cli) -> anyhow::Result<TriageConfig> {
    let path = cli.config.clone().or_else(default_config_path);
    let mut config = load_config_from_path(path).context("Failed to load configuration")?;

    cli.overrides().apply(&mut config);
    config.validate().context("Invalid configuration")?;

    tracing::info!(
        base_url = %config.base_url,
        top_k = config.default_top_k,
        source = %config.source(),
        "Configuration resolved"
    );
    Ok(config)
}
