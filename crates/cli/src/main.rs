//! Panaderia CLI - bakery console from the terminal

mod commands;
mod config;
mod logging;
mod output;
mod state_dir;

use anyhow::Result;
use clap::{Parser, ValueEnum};
use commands::{Commands, Context};
use state_dir::StateDir;
use std::time::Duration;
use tracing::{Level, error, info};

#[derive(Parser)]
#[command(name = "panaderia")]
#[command(about = "Bakery management console")]
#[command(version)]
struct Cli {
    /// Set logging level
    #[arg(short = 'l', long, global = true, default_value = "warn")]
    log_level: LogLevel,

    /// Directory holding settings, the remembered session and logs
    #[arg(short = 'd', long, global = true, env = "PANADERIA_DATA_DIR")]
    data_dir: Option<std::path::PathBuf>,

    /// Request timeout in seconds (0 = no timeout)
    #[arg(short = 't', long, global = true, default_value = "30")]
    timeout: u64,

    /// Disable file logging (only log to stderr)
    #[arg(long, global = true)]
    no_file_log: bool,

    /// Override the API base URL
    #[arg(long, global = true)]
    api_base: Option<String>,

    #[command(subcommand)]
    command: Commands,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let state_dir = match cli.data_dir {
        Some(dir) => StateDir::with_override(dir),
        None => StateDir::new(),
    };

    logging::init_logging(cli.log_level.into(), &state_dir, cli.no_file_log)?;

    info!("Starting Panaderia CLI");

    let timeout = (cli.timeout > 0).then(|| Duration::from_secs(cli.timeout));
    let context = Context::new(state_dir, cli.api_base, timeout)?;

    match cli.command.execute(&context).await {
        Ok(()) => {
            info!("Command completed successfully");
        }
        Err(e) => {
            error!("Command failed: {e:#}");
            eprintln!("Error: {e:#}");
            std::process::exit(1);
        }
    }

    Ok(())
}

#[derive(Clone, Debug, ValueEnum)]
enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(log_level: LogLevel) -> Self {
        match log_level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}
