use std::path::{Path, PathBuf};
use std::time::Duration;

use anyhow::{bail, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use penguin::bus::EventBus;
use penguin::config::DashboardConfig;
use penguin::monitor::connect_all;
use penguin::tui::app::DashboardApp;
use penguin::tui::runner::run_dashboard;

#[derive(Parser)]
#[command(
    name = "penguin",
    version,
    about = "Ping many hosts at once and watch them in a live table."
)]
struct Cli {
    /// Hosts to ping (names or IP addresses)
    hosts: Vec<String>,

    /// Interval between pings, e.g. 500ms or 2s
    #[arg(short, long, value_parser = humantime::parse_duration)]
    interval: Option<Duration>,

    /// How long each ping waits for its reply
    #[arg(long, value_parser = humantime::parse_duration)]
    timeout: Option<Duration>,

    /// Number of recent pings shown in the history strip
    #[arg(long)]
    history: Option<usize>,

    /// ICMP payload size in bytes
    #[arg(long)]
    size: Option<usize>,

    /// Config file (defaults to ~/.penguin/config.yaml when present)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Write diagnostics to this file instead of stderr
    #[arg(long)]
    log_file: Option<PathBuf>,
}

impl Cli {
    /// Command-line flags win over the config file.
    fn apply(&self, config: &mut DashboardConfig) {
        if let Some(interval) = self.interval {
            config.interval = interval;
        }
        if let Some(timeout) = self.timeout {
            config.timeout = timeout;
        }
        if let Some(history) = self.history {
            config.history = history;
        }
        if let Some(size) = self.size {
            config.payload_size = size;
        }
    }
}

fn init_tracing(log_file: Option<&Path>) -> Result<()> {
    match log_file {
        Some(path) => {
            let file = std::fs::OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)?;
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::from_default_env().add_directive("penguin=info".parse()?),
                )
                .with_writer(std::sync::Mutex::new(file))
                .with_ansi(false)
                .init();
        }
        None => {
            // The dashboard owns the screen; only errors go to stderr.
            tracing_subscriber::fmt()
                .with_env_filter(
                    EnvFilter::from_default_env().add_directive("penguin=error".parse()?),
                )
                .with_writer(std::io::stderr)
                .init();
        }
    }
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.log_file.as_deref())?;

    if cli.hosts.is_empty() {
        bail!("no hosts");
    }

    let mut config = DashboardConfig::load(cli.config.as_deref())?;
    cli.apply(&mut config);
    config.validate()?;

    info!(hosts = ?cli.hosts, interval = ?config.interval, "penguin starting");

    let monitors = connect_all(&cli.hosts, &config.probe_options(), config.history).await?;
    let app = DashboardApp::new(monitors, &config)?;
    run_dashboard(app, EventBus::new()).await
}
