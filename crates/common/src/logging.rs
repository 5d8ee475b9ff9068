//! Logging and tracing initialization.

use std::fs::OpenOptions;
use std::sync::Arc;

use crate::config::LoggingConfig;

/// Initialize the tracing subscriber from a [`LoggingConfig`].
///
/// `RUST_LOG` overrides the configured level. Events go to stderr, or
/// append to the configured log file when one is set; `config.json`
/// switches to structured JSON output. Safe to call more than once;
/// only the first call installs a subscriber.
pub fn init_logging(config: &LoggingConfig) {
    use tracing_subscriber::{fmt, EnvFilter};

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(&config.level));

    let builder = fmt::Subscriber::builder()
        .with_env_filter(env_filter)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false);

    if let Some(path) = &config.file {
        let file = match OpenOptions::new().create(true).append(true).open(path) {
            Ok(file) => Arc::new(file),
            Err(e) => {
                eprintln!("Failed to open log file {}: {e}", path.display());
                return init_logging(&LoggingConfig {
                    file: None,
                    ..config.clone()
                });
            }
        };
        if config.json {
            let subscriber = builder.json().with_writer(file).finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        } else {
            let subscriber = builder.with_ansi(false).with_writer(file).finish();
            tracing::subscriber::set_global_default(subscriber).ok();
        }
    } else if config.json {
        let subscriber = builder.json().finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    } else {
        let subscriber = builder.finish();
        tracing::subscriber::set_global_default(subscriber).ok();
    }
}

/// Initialize logging with defaults (useful for tests and quick scripts).
pub fn init_default_logging() {
    init_logging(&LoggingConfig::default());
}
