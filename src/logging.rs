//! Logger initialization for the command-line tool.

use std::sync::Once;

/// Logger configuration.
///
/// `env_filter` follows the `env_logger` filter syntax (e.g. "info",
/// "brushlayer=debug"). When unset, `RUST_LOG` is used, then `default_level`.
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    pub env_filter: Option<String>,
    pub default_level: log::LevelFilter,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            env_filter: None,
            default_level: log::LevelFilter::Info,
        }
    }
}

impl LoggingConfig {
    /// `--verbose` turns on the per-layer diagnostics.
    pub fn verbose(verbose: bool) -> Self {
        Self {
            default_level: if verbose {
                log::LevelFilter::Debug
            } else {
                log::LevelFilter::Info
            },
            ..Self::default()
        }
    }
}

static INIT: Once = Once::new();

/// Initializes the global logger once; later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let mut builder = env_logger::Builder::new();

        if let Some(filter) = config.env_filter {
            builder.parse_filters(&filter);
        } else if let Ok(filter) = std::env::var("RUST_LOG") {
            builder.parse_filters(&filter);
        } else {
            builder.filter_level(config.default_level);
        }

        builder.format_timestamp(None);
        // try_init: a test harness may already have installed a logger
        let _ = builder.try_init();

        log::debug!("logging initialized");
    });
}
