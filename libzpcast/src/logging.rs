//! Logging setup shared by the zpcast binaries
//!
//! Logs always go to stderr so stdout stays reserved for the posted text.
//!
//! # Examples
//!
//! ```no_run
//! use libzpcast::logging::{LoggingConfig, LogFormat};
//!
//! // JSON lines for a hosted deployment
//! LoggingConfig::new(LogFormat::Json, "info".to_string(), false).init();
//!
//! // Or let ZPCAST_LOG_FORMAT / ZPCAST_LOG_LEVEL decide
//! libzpcast::logging::init_default(false);
//! ```

use std::str::FromStr;
use tracing_subscriber::EnvFilter;

pub const ENV_LOG_FORMAT: &str = "ZPCAST_LOG_FORMAT";
pub const ENV_LOG_LEVEL: &str = "ZPCAST_LOG_LEVEL";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One plain line per event, no colors
    #[default]
    Text,
    /// One JSON object per line, run fields flattened
    Json,
    /// Multi-line with colors and source locations
    Pretty,
}

impl LogFormat {
    const ALL: [LogFormat; 3] = [LogFormat::Text, LogFormat::Json, LogFormat::Pretty];

    pub fn as_str(&self) -> &'static str {
        match self {
            LogFormat::Text => "text",
            LogFormat::Json => "json",
            LogFormat::Pretty => "pretty",
        }
    }
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|format| format.as_str().eq_ignore_ascii_case(s))
            .ok_or_else(|| {
                format!(
                    "Invalid log format: '{}'. Valid options: text, json, pretty",
                    s
                )
            })
    }
}

impl std::fmt::Display for LogFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

pub struct LoggingConfig {
    pub format: LogFormat,
    /// Directive used when `RUST_LOG` is unset, e.g. `info` or `libzpcast=debug`
    pub level: String,
    /// Forces `debug` regardless of `level`
    pub verbose: bool,
}

impl LoggingConfig {
    pub fn new(format: LogFormat, level: String, verbose: bool) -> Self {
        Self {
            format,
            level,
            verbose,
        }
    }

    /// Read `ZPCAST_LOG_FORMAT` and `ZPCAST_LOG_LEVEL`, defaulting to text at info
    pub fn from_env(verbose: bool) -> Self {
        let format = std::env::var(ENV_LOG_FORMAT)
            .ok()
            .and_then(|s| s.parse().ok())
            .unwrap_or_default();
        let level = std::env::var(ENV_LOG_LEVEL)
            .ok()
            .filter(|s| !s.trim().is_empty())
            .unwrap_or_else(|| "info".to_string());

        Self::new(format, level, verbose)
    }

    pub fn default_directive(&self) -> &str {
        if self.verbose {
            "debug"
        } else {
            &self.level
        }
    }

    fn filter(&self) -> EnvFilter {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(self.default_directive()))
    }

    /// Install the global subscriber
    ///
    /// Call once at startup; later calls keep the first subscriber.
    pub fn init(&self) {
        let builder = tracing_subscriber::fmt()
            .with_env_filter(self.filter())
            .with_writer(std::io::stderr);

        let installed = match self.format {
            LogFormat::Text => builder.with_target(false).try_init(),
            LogFormat::Json => builder
                .json()
                .flatten_event(true)
                .with_current_span(true)
                .try_init(),
            LogFormat::Pretty => builder
                .pretty()
                .with_file(true)
                .with_line_number(true)
                .try_init(),
        };

        if let Err(e) = installed {
            tracing::warn!("Logging already initialized: {}", e);
        }
    }
}

/// Initialize logging from the environment, see [`LoggingConfig::from_env`]
pub fn init_default(verbose: bool) {
    LoggingConfig::from_env(verbose).init();
}
