//! # padmouse
//!
//! Use a gamepad as keyboard and mouse.
//!
//! Polls the controller at a fixed rate (150Hz by default) and turns sticks,
//! buttons and triggers into cursor movement, clicks, scrolling and key
//! presses.
//!
//! # Usage
//!
//! ```bash
//! padmouse                    # config/default.toml if present, else defaults
//! padmouse my-config.toml     # explicit configuration file
//! RUST_LOG=debug padmouse     # verbose logging
//! ```
//!
//! Expected output:
//! ```text
//! INFO padmouse: padmouse v0.1.0 starting...
//! INFO padmouse::controller::evdev_pad: Opened gamepad Xbox Wireless Controller at /dev/input/event17
//! INFO padmouse::poll_loop: Polling controller every 6ms
//! ```

use std::path::Path;

use anyhow::{Context, Result};
use tracing::{info, Level};
use tracing_appender::non_blocking::WorkerGuard;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

use padmouse::config::{Config, LoggingConfig};
use padmouse::platform;
use padmouse::poll_loop::PollLoop;

/// Configuration file picked up when no path is given
const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Loads the configuration named on the command line, the default file, or
/// the built-in defaults, in that order. Returns where it came from.
fn load_config(arg: Option<String>) -> Result<(Config, String)> {
    match arg {
        Some(path) => {
            let config = Config::load(&path)
                .with_context(|| format!("Failed to load configuration from {}", path))?;
            Ok((config, path))
        }
        None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
            let config = Config::load(DEFAULT_CONFIG_PATH)
                .with_context(|| format!("Failed to load {}", DEFAULT_CONFIG_PATH))?;
            Ok((config, DEFAULT_CONFIG_PATH.to_string()))
        }
        None => Ok((Config::default(), "built-in defaults".to_string())),
    }
}

/// `RUST_LOG` directives when set, otherwise the configured level.
fn log_filter(rust_log: Option<&str>, level: &str) -> EnvFilter {
    rust_log
        .filter(|directives| !directives.trim().is_empty())
        .and_then(|directives| EnvFilter::try_new(directives).ok())
        .unwrap_or_else(|| {
            let level = level.parse::<Level>().unwrap_or(Level::INFO);
            EnvFilter::default().add_directive(level.into())
        })
}

/// Opens (creating if needed) the log file, never rotated.
fn open_log_file(file: &str) -> Result<RollingFileAppender> {
    let path = Path::new(file);
    let directory = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .with_context(|| format!("Log file {} has no usable file name", file))?;

    RollingFileAppender::builder()
        .rotation(Rotation::NEVER)
        .filename_prefix(file_name)
        .build(directory)
        .with_context(|| format!("Failed to open log file {}", file))
}

/// Sets up stderr logging, plus a log file when one is configured.
///
/// The returned guard flushes the file writer and must live until exit.
fn init_logging(config: &LoggingConfig) -> Result<Option<WorkerGuard>> {
    let rust_log = std::env::var(EnvFilter::DEFAULT_ENV).ok();
    let filter = log_filter(rust_log.as_deref(), &config.level);

    if config.file.is_empty() {
        tracing_subscriber::fmt().with_env_filter(filter).init();
        return Ok(None);
    }

    let appender = open_log_file(&config.file)?;
    let (file_writer, guard) = tracing_appender::non_blocking(appender);

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr.and(file_writer))
        .with_ansi(false)
        .init();

    Ok(Some(guard))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> Result<()> {
    let (config, source) = load_config(std::env::args().nth(1))?;
    let _log_guard = init_logging(&config.logging)?;

    info!("padmouse v{} starting...", env!("CARGO_PKG_VERSION"));
    info!("Configuration: {}", source);

    let caps = platform::open(&config).context("Failed to open controller backend")?;
    caps.log_availability();

    let mut poll_loop = PollLoop::new(&config, caps);
    poll_loop.run().await;

    Ok(())
}
