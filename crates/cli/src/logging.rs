use crate::state_dir::StateDir;
use anyhow::Result;
use panaderia_core::telemetry;
use tracing::Level;

/// Initialize logging for the CLI
///
/// Logs always go to stderr; unless disabled they are also written to
/// `cli.log` in the data directory, truncated on every run.
pub fn init_logging(log_level: Level, state_dir: &StateDir, no_file_log: bool) -> Result<()> {
    let level = log_level.as_str().to_lowercase();

    if no_file_log {
        telemetry::init_tracing(&level)?;
    } else {
        telemetry::init_file_tracing(&level, &state_dir.log_file())?;
    }

    Ok(())
}
