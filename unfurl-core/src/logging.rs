//! Logging setup for unfurl.
//!
//! The engine always logs through `tracing`; applications that already run
//! a subscriber need nothing from this module. With the `tracing-subscriber`
//! feature enabled, [`init`] and [`init_with_config`] install one.
//!
//! # Environment Variables
//!
//! - `UNFURL_DEBUG=true` / `UNFURL_DEBUG=1` - Enable debug logging
//! - `UNFURL_LOG_LEVEL=debug|info|warn|error|trace` - Set specific log level
//! - `UNFURL_LOG_FORMAT=json|pretty|compact` - Set output format (default: json)
//!
//! Environment variables win over the `[logging]` section of `unfurl.toml`.
//!
//! ```rust,no_run
//! use unfurl_core::logging;
//!
//! // Call once at startup; later calls return the settings already in use.
//! if let Some(settings) = logging::init() {
//!     println!("logging at {}", settings.level);
//! }
//! ```
//!
//! Events emitted by the engine:
//!
//! ```rust,ignore
//! debug!(schema = %schema.name, strategy = %strategy, many, "expanding resource");
//! trace!(params = ?arguments.keys().collect::<Vec<_>>(), "built fetch arguments");
//! warn!(path = %path, max_depth, "expand path truncated");
//! ```

use std::env;
use std::sync::OnceLock;

use unfurl_schema::config::{LogFormat, LoggingConfig};

const DEBUG_VAR: &str = "UNFURL_DEBUG";
const LEVEL_VAR: &str = "UNFURL_LOG_LEVEL";
const FORMAT_VAR: &str = "UNFURL_LOG_FORMAT";

static INSTALLED: OnceLock<LogSettings> = OnceLock::new();

/// Level and format a subscriber is installed with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LogSettings {
    /// One of `trace`, `debug`, `info`, `warn`, `error`.
    pub level: &'static str,
    /// Output format.
    pub format: LogFormat,
}

impl LogSettings {
    /// Settings requested through the environment, if any.
    ///
    /// `None` unless `UNFURL_DEBUG` or `UNFURL_LOG_LEVEL` is set.
    pub fn from_env() -> Option<Self> {
        let level = env_level()?;
        Some(Self {
            level,
            format: env_format().unwrap_or(LogFormat::Json),
        })
    }

    /// Settings from an `unfurl.toml` `[logging]` section, overridden by
    /// the environment.
    pub fn from_config(config: &LoggingConfig) -> Self {
        Self {
            level: env_level()
                .or_else(|| parse_level(&config.level))
                .unwrap_or("warn"),
            format: env_format().unwrap_or(config.format),
        }
    }

    /// `EnvFilter` directive covering the unfurl crates.
    pub fn directive(&self) -> String {
        ["unfurl", "unfurl_core", "unfurl_schema"]
            .iter()
            .map(|target| format!("{}={}", target, self.level))
            .collect::<Vec<_>>()
            .join(",")
    }
}

/// Check if `UNFURL_DEBUG` is set to "true", "1", or "yes" (case-insensitive).
#[inline]
pub fn is_debug_enabled() -> bool {
    env::var(DEBUG_VAR).is_ok_and(|v| matches!(v.to_ascii_lowercase().as_str(), "true" | "1" | "yes"))
}

fn env_level() -> Option<&'static str> {
    match env::var(LEVEL_VAR) {
        Ok(level) => parse_level(&level),
        Err(_) if is_debug_enabled() => Some("debug"),
        Err(_) => None,
    }
}

fn env_format() -> Option<LogFormat> {
    env::var(FORMAT_VAR).ok().and_then(|f| parse_format(&f))
}

fn parse_level(level: &str) -> Option<&'static str> {
    ["trace", "debug", "info", "warn", "error"]
        .into_iter()
        .find(|known| known.eq_ignore_ascii_case(level.trim()))
}

fn parse_format(format: &str) -> Option<LogFormat> {
    [LogFormat::Json, LogFormat::Pretty, LogFormat::Compact]
        .into_iter()
        .find(|known| known.as_str().eq_ignore_ascii_case(format.trim()))
}

/// Install a subscriber if the environment asks for one.
///
/// Returns the settings in effect, or `None` when logging was not requested.
pub fn init() -> Option<LogSettings> {
    LogSettings::from_env().map(install)
}

/// Install a subscriber configured by `unfurl.toml`.
pub fn init_with_config(config: &LoggingConfig) -> LogSettings {
    install(LogSettings::from_config(config))
}

/// Settings of the subscriber installed by this module, if any.
pub fn installed() -> Option<LogSettings> {
    INSTALLED.get().copied()
}

fn install(settings: LogSettings) -> LogSettings {
    *INSTALLED.get_or_init(|| {
        #[cfg(feature = "tracing-subscriber")]
        {
            use tracing_subscriber::{EnvFilter, fmt, prelude::*};

            let filter =
                EnvFilter::try_new(settings.directive()).unwrap_or_else(|_| EnvFilter::new("warn"));
            let registry = tracing_subscriber::registry().with(filter);
            let result = match settings.format {
                LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
                LogFormat::Pretty => registry.with(fmt::layer().pretty()).try_init(),
                LogFormat::Compact => registry.with(fmt::layer().compact()).try_init(),
            };
            match result {
                Ok(()) => tracing::info!(
                    level = settings.level,
                    format = settings.format.as_str(),
                    "unfurl logging initialized"
                ),
                Err(e) => tracing::debug!(error = %e, "subscriber already installed"),
            }
        }
        settings
    })
}

/// Debug event emitted only while `UNFURL_DEBUG` is enabled.
#[macro_export]
macro_rules! unfurl_debug {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::debug!($($arg)*);
        }
    };
}

/// Trace event emitted only while `UNFURL_DEBUG` is enabled.
#[macro_export]
macro_rules! unfurl_trace {
    ($($arg:tt)*) => {
        if $crate::logging::is_debug_enabled() {
            tracing::trace!($($arg)*);
        }
    };
}
