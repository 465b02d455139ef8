//! Logging setup for the beacon tools with file output and optional stdout.
//!
//! Logs always go to a file at `warn` level (or lower if `BEACON_LOG` is set).
//! Stdout logging is enabled when `BEACON_LOG` or `RUST_LOG` is set, or in debug builds.
//!
//! ## Environment Variables
//!
//! 1. **`BEACON_LOG`** (highest priority) - beacon-specific logging control
//! 2. **`RUST_LOG`** - Standard tracing environment variable
//! 3. **Default** - `warn` globally, `info` for beacon crates
//!
//! `BEACON_LOG=debug` expands to every beacon crate. Values containing `=`,
//! `:` or `,` are passed through as a full filter, e.g.
//! `BEACON_LOG=beacon::renderer=trace,beacon=debug`.
//!
//! ## Log File Location
//!
//! Default: `<data_local_dir>/beacon/logs/beacon-<pid>.log`
//! - macOS: `~/Library/Application Support/beacon/logs/beacon-12345.log`
//! - Linux: `~/.local/share/beacon/logs/beacon-12345.log`
//!
//! Override with `--log-file <path>`.

use std::{
    env,
    path::{Path, PathBuf},
};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_subscriber::{
    fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter, Layer, Registry,
};

type Error = Box<dyn std::error::Error + Send + Sync>;

/// Crates whose level `BEACON_LOG=<level>` controls.
const BEACON_CRATES: &[&str] = &["beacon", "beacon_bin", "beacon_log"];

/// Returned from [`init`]; must be held alive to ensure log file flushing.
pub struct LogGuard {
    _file_guard: WorkerGuard,
    pub log_file: PathBuf,
}

#[derive(Debug, Default)]
pub struct LogConfig {
    pub log_file_path: Option<PathBuf>,
}

/// Initialize logging.
///
/// This function respects the environment variable priority described in the module docs:
/// `BEACON_LOG` > `RUST_LOG` > default settings.
///
/// The returned [`LogGuard`] must be held for the lifetime of the program --
/// dropping it flushes and stops the background file writer.
pub fn init(config: LogConfig) -> Result<LogGuard, Error> {
    let (log_dir, filename) = resolve_log_path(config.log_file_path);

    std::fs::create_dir_all(&log_dir).ok();

    let file_appender = tracing_appender::rolling::never(&log_dir, &filename);
    let (non_blocking_file, file_guard) = tracing_appender::non_blocking(file_appender);

    let file_layer = fmt::layer()
        .with_writer(non_blocking_file)
        .with_ansi(false)
        .with_filter(create_file_filter());

    let stdout_enabled =
        env::var("BEACON_LOG").is_ok() || env::var("RUST_LOG").is_ok() || cfg!(debug_assertions);

    let stdout_layer = if stdout_enabled {
        Some(fmt::layer().with_filter(create_filter()))
    } else {
        None
    };

    Registry::default()
        .with(file_layer)
        .with(stdout_layer)
        .try_init()?;

    Ok(LogGuard {
        _file_guard: file_guard,
        log_file: log_dir.join(filename),
    })
}

/// Initialize logging for tests.
///
/// Stdout-only (no file output), and safe to call from every test: a subscriber
/// installed by an earlier test is left in place.
#[allow(clippy::let_unit_value)]
pub fn test() {
    let _ = test_init();
}

fn test_init() -> Result<(), Error> {
    fmt()
        .with_env_filter(create_filter())
        .with_test_writer()
        .try_init()?;
    Ok(())
}

/// Split the log destination into a directory and a file name.
///
/// An override with an extension is a file path; without one it is a directory.
fn resolve_log_path(override_path: Option<PathBuf>) -> (PathBuf, String) {
    let filename = format!("beacon-{}.log", std::process::id());

    if let Some(path) = override_path {
        if path.extension().is_some() {
            let dir = path.parent().unwrap_or_else(|| Path::new("."));
            let name = path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or(filename);
            return (dir.to_path_buf(), name);
        }
        return (path, filename);
    }

    let dir = dirs::data_local_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join("beacon")
        .join("logs");

    (dir, filename)
}

/// File filter: uses user-specified level if set, otherwise defaults to `warn`.
fn create_file_filter() -> EnvFilter {
    if env::var("BEACON_LOG").is_ok() || env::var("RUST_LOG").is_ok() {
        return create_filter();
    }
    EnvFilter::new("warn")
}

/// Create the appropriate [`EnvFilter`] based on environment variables.
///
/// Implements the priority system: `BEACON_LOG` > `RUST_LOG` > defaults.
fn create_filter() -> EnvFilter {
    if let Ok(beacon_log) = env::var("BEACON_LOG") {
        return EnvFilter::new(expand_beacon_log(&beacon_log));
    }

    if let Ok(rust_log) = env::var("RUST_LOG") {
        return EnvFilter::new(rust_log);
    }

    EnvFilter::new(expand_beacon_log("info"))
}

/// Expand a `BEACON_LOG` value into a full filter string.
///
/// - `debug` becomes `warn,beacon=debug,beacon_bin=debug,beacon_log=debug`
/// - anything with `=`, `:` or `,` is used as-is
fn expand_beacon_log(beacon_log: &str) -> String {
    if beacon_log.contains('=') || beacon_log.contains(':') || beacon_log.contains(',') {
        return beacon_log.to_string();
    }

    let mut filter = String::from("warn");
    for krate in BEACON_CRATES {
        filter.push_str(&format!(",{krate}={beacon_log}"));
    }
    filter
}
