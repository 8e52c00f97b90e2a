use std::fs::{self, OpenOptions};
use std::path::PathBuf;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

pub const LOG_FILTER_VAR: &str = "MOVIE_ROWS_LOG";

fn data_dir() -> PathBuf {
    dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("movie_rows")
}

pub fn log_path() -> PathBuf {
    data_dir().join("movie_rows.log")
}

/// Sends tracing output to a log file. The terminal belongs to the UI, so
/// nothing is written to stdout or stderr.
pub fn init() -> Result<PathBuf, Box<dyn std::error::Error>> {
    init_at(log_path())
}

fn init_at(path: PathBuf) -> Result<PathBuf, Box<dyn std::error::Error>> {
    if let Some(dir) = path.parent() {
        fs::create_dir_all(dir)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(&path)?;

    let filter = EnvFilter::try_from_env(LOG_FILTER_VAR).unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .with_target(false)
        .try_init()
        .map_err(|e| -> Box<dyn std::error::Error> { e })?;

    Ok(path)
}
