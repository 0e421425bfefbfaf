//! tracing-subscriber setup
//!
//! Every log line goes to stderr. stdout belongs to build reports and, under
//! `serve`, to bridge replies, so nothing else may write there.
//!
//! `RUST_LOG` overrides the computed filter entirely. Otherwise dependencies
//! log at `warn` and codeforge at the configured level.
//!
//! ```no_run
//! use codeforge::util::{init_logging, LoggingConfig};
//! use tracing::Level;
//!
//! let mut config = LoggingConfig::from_env();
//! config.level = Level::DEBUG;
//! init_logging(config);
//!
//! tracing::debug!(environment = "cpp", "Selecting toolchain");
//! ```

use std::env;
use std::sync::Once;
use tracing::Level;
use tracing_subscriber::filter::Directive;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub const LOG_LEVEL_VAR: &str = "CODEFORGE_LOG_LEVEL";
pub const LOG_JSON_VAR: &str = "CODEFORGE_LOG_JSON";

static INIT: Once = Once::new();

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoggingConfig {
    /// Threshold for codeforge's own events
    pub level: Level,

    /// One JSON object per event instead of the human-readable format
    pub json: bool,

    /// Print the emitting module path
    pub show_target: bool,

    /// Print source file and line
    pub show_source: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Level::INFO,
            json: false,
            show_target: true,
            show_source: false,
        }
    }
}

impl LoggingConfig {
    /// ```
    /// use codeforge::util::LoggingConfig;
    /// use tracing::Level;
    ///
    /// assert_eq!(LoggingConfig::with_level(Level::WARN).level, Level::WARN);
    /// ```
    pub fn with_level(level: Level) -> Self {
        Self {
            level,
            ..Self::default()
        }
    }

    /// Reads `CODEFORGE_LOG_LEVEL` and `CODEFORGE_LOG_JSON`. JSON output also
    /// turns on source locations, since it is meant for log collectors.
    pub fn from_env() -> Self {
        let level = env::var(LOG_LEVEL_VAR)
            .ok()
            .map_or(Level::INFO, |value| parse_level(&value));
        let json = env::var(LOG_JSON_VAR).map_or(false, |value| is_truthy(&value));

        Self {
            level,
            json,
            show_source: json,
            ..Self::default()
        }
    }

    fn filter(&self) -> EnvFilter {
        if env::var_os("RUST_LOG").is_some() {
            return EnvFilter::from_default_env();
        }

        let filter = EnvFilter::new("warn");
        match format!("codeforge={}", self.level).parse::<Directive>() {
            Ok(directive) => filter.add_directive(directive),
            Err(_) => filter,
        }
    }
}

fn is_truthy(value: &str) -> bool {
    matches!(
        value.trim().to_ascii_lowercase().as_str(),
        "1" | "true" | "yes" | "on"
    )
}

/// Parses a level name, case-insensitively. Unknown names fall back to INFO
/// with a note on stderr.
///
/// ```
/// use codeforge::util::logging::parse_level;
/// use tracing::Level;
///
/// assert_eq!(parse_level("Debug"), Level::DEBUG);
/// assert_eq!(parse_level("loud"), Level::INFO);
/// ```
pub fn parse_level(value: &str) -> Level {
    match value.trim().to_ascii_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        other => {
            eprintln!(
                "Unknown log level '{}', using info (expected trace, debug, info, warn or error)",
                other
            );
            Level::INFO
        }
    }
}

/// Installs the global subscriber. Later calls are ignored.
pub fn init_logging(config: LoggingConfig) {
    INIT.call_once(|| {
        let base = fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(config.show_target)
            .with_file(config.show_source)
            .with_line_number(config.show_source);

        let (json, text) = if config.json {
            (Some(base.json()), None)
        } else {
            (None, Some(base))
        };

        tracing_subscriber::registry()
            .with(config.filter())
            .with(tracing_subscriber::Layer::and_then(json, text))
            .init();
    });
}
