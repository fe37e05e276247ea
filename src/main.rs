use std::env;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tracing::{error, info};

use tether_broker::{DebugBroker, RegistryConfig, SessionRegistry};
use tether_config::load_config;
use tether_sourcemap::DefaultFetcher;

mod adapter;
mod logging;

/// Return the directory holding the global config file.
fn default_config_dir() -> PathBuf {
    if let Some(dir) = env::var_os("XDG_CONFIG_HOME") {
        return PathBuf::from(dir).join("tether");
    }
    if let Some(home) = env::var_os("HOME") {
        return PathBuf::from(home).join(".config").join("tether");
    }
    PathBuf::from("/tmp/tether-config")
}

async fn run_broker(config_dir: PathBuf) -> Result<()> {
    let project_dir = env::current_dir().ok();
    let config = load_config(&config_dir, project_dir.as_deref()).unwrap_or_else(|e| {
        error!("config load failed, using defaults: {}", e);
        tether_config::Config::default()
    });

    let fetcher = DefaultFetcher::new(
        config.sourcemap.fetch_http,
        Duration::from_secs(config.sourcemap.fetch_timeout_secs),
    )
    .context("failed to build source map fetcher")?;

    let registry = SessionRegistry::new(
        RegistryConfig {
            max_sessions: config.broker.max_sessions,
            command_timeout: Duration::from_secs(config.broker.command_timeout_secs),
            connect_timeout: Duration::from_secs(config.broker.connect_timeout_secs),
            allowed_hosts: config.broker.allowed_hosts.clone(),
        },
        Arc::new(fetcher),
    );
    let broker = DebugBroker::new(Arc::new(registry));

    info!("tether broker ready");
    let stdin = tokio::io::BufReader::new(tokio::io::stdin());
    adapter::run(broker, stdin, tokio::io::stdout()).await
}

fn init_logging(config_dir: &Path) -> Result<()> {
    // Peek at the config for the log settings; failures fall back to
    // defaults so logging never blocks startup.
    let config = load_config(config_dir, None).unwrap_or_default();

    let log_path = config
        .log
        .file
        .clone()
        .unwrap_or_else(logging::default_log_file_path);
    logging::ensure_log_dir(&log_path).context("failed to create log directory")?;
    logging::rotate_log_files(
        &log_path,
        logging::DEFAULT_MAX_LOG_SIZE,
        logging::DEFAULT_MAX_LOG_FILES,
    )
    .context("failed to rotate log files")?;

    // Log to a file: stdout belongs to the adapter protocol.
    let log_file = std::fs::File::options()
        .create(true)
        .append(true)
        .open(&log_path)
        .with_context(|| format!("failed to open log file: {}", log_path.display()))?;
    tracing_subscriber::fmt()
        .with_env_filter(logging::level_filter(config.log.level))
        .with_writer(std::sync::Mutex::new(log_file))
        .with_ansi(false)
        .init();
    Ok(())
}

fn main() {
    let args: Vec<String> = env::args().collect();
    let config_dir = match args.iter().position(|a| a == "--config") {
        Some(idx) => match args.get(idx + 1) {
            Some(dir) => PathBuf::from(dir),
            None => {
                eprintln!("tether: --config requires a directory argument");
                std::process::exit(2);
            }
        },
        None => default_config_dir(),
    };

    if let Err(e) = init_logging(&config_dir) {
        eprintln!("tether: logging setup failed: {:#}", e);
    }

    let runtime = match tokio::runtime::Runtime::new() {
        Ok(rt) => rt,
        Err(e) => {
            eprintln!("tether: failed to start runtime: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = runtime.block_on(run_broker(config_dir)) {
        eprintln!("tether: {:#}", e);
        std::process::exit(1);
    }
    info!("tether exited cleanly");
}
