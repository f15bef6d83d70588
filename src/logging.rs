//! File logging. The terminal belongs to the UI, so events go to a log file
//! under the state directory.

use std::fs::OpenOptions;
use std::io;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::filter::EnvFilter;

/// Environment variable holding the filter directives.
pub const LOG_ENV: &str = "KOGNI_LOG";

/// Filter from `raw` when it parses, else from `fallback`, else `info`.
pub fn build_filter(raw: Option<&str>, fallback: &str) -> EnvFilter {
    raw.and_then(|r| EnvFilter::try_new(r).ok())
        .or_else(|| EnvFilter::try_new(fallback).ok())
        .unwrap_or_else(|| EnvFilter::new("info"))
}

pub fn init(path: &Path, fallback_filter: &str) -> io::Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let file = OpenOptions::new().create(true).append(true).open(path)?;
    let raw = std::env::var(LOG_ENV).ok();

    tracing_subscriber::fmt()
        .with_env_filter(build_filter(raw.as_deref(), fallback_filter))
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .try_init()
        .map_err(io::Error::other)
}
