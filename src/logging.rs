//! Tracing subscriber setup.
//!
//! Console output goes to stderr so it never mixes with command output.
//! `RUST_LOG` overrides the default level. With a log directory, a second
//! layer records everything at debug level into `aigit_YYYYMMDD.log`.

use std::fs::{self, OpenOptions};
use std::io;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use chrono::{Local, NaiveDate};
use tracing_subscriber::filter::LevelFilter;
use tracing_subscriber::{EnvFilter, Layer, layer::SubscriberExt, util::SubscriberInitExt};

/// File name of the log for `date`.
pub fn log_file_name(date: NaiveDate) -> String {
    format!("aigit_{}.log", date.format("%Y%m%d"))
}

fn console_filter(verbose: bool) -> EnvFilter {
    let default = if verbose { "aigit=debug,warn" } else { "aigit=info,warn" };
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default))
}

/// Install the global subscriber. Returns the log file path when a
/// directory was given.
pub fn init(verbose: bool, log_dir: Option<&Path>) -> io::Result<Option<PathBuf>> {
    let console = tracing_subscriber::fmt::layer()
        .with_target(false)
        .with_writer(io::stderr)
        .with_filter(console_filter(verbose));

    let (file_layer, log_path) = match log_dir {
        Some(dir) => {
            fs::create_dir_all(dir)?;
            let path = dir.join(log_file_name(Local::now().date_naive()));
            let file = OpenOptions::new().create(true).append(true).open(&path)?;
            let layer = tracing_subscriber::fmt::layer()
                .with_ansi(false)
                .with_writer(Mutex::new(file))
                .with_filter(LevelFilter::DEBUG);
            (Some(layer), Some(path))
        }
        None => (None, None),
    };

    tracing_subscriber::registry()
        .with(console)
        .with(file_layer)
        .init();

    if verbose {
        tracing::debug!("Debug logging enabled");
    }
    if let Some(path) = &log_path {
        tracing::debug!("Writing log file {}", path.display());
    }

    Ok(log_path)
}
