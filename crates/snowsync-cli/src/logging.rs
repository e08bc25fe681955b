//! Logging setup for the `snowsync` binary
//!
//! Events go to stderr so command output on stdout stays pipeable.
//! `RUST_LOG` takes precedence over the verbosity-derived filter.

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt, Layer};

/// Crates whose events the verbosity flag controls
const TARGETS: &[&str] = &["snowsync_cli", "snowsync_schema_tools", "snowsync_driver_snowflake"];

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, clap::ValueEnum)]
pub enum LogFormat {
    #[default]
    Text,
    Json,
}

/// Logging configuration
#[derive(Debug, Clone)]
pub struct LoggingConfig {
    /// Default filter used when `RUST_LOG` is unset
    pub default_filter: String,
    pub format: LogFormat,
    /// Whether to include file/line information in logs
    pub include_location: bool,
}

impl LoggingConfig {
    /// `verbosity` 0 logs warnings, 1 adds info, 2 debug and 3+ trace for
    /// the snowsync crates. Everything else stays at `warn`.
    pub fn from_verbosity(verbosity: u8, format: LogFormat) -> Self {
        let level = match verbosity {
            0 => "warn",
            1 => "info",
            2 => "debug",
            _ => "trace",
        };
        let mut default_filter = String::from("warn");
        for target in TARGETS {
            default_filter.push_str(&format!(",{}={}", target, level));
        }

        Self {
            default_filter,
            format,
            include_location: verbosity >= 3,
        }
    }
}

/// Installs the global subscriber
pub fn init(config: &LoggingConfig) -> anyhow::Result<()> {
    let env_filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new(&config.default_filter))?;

    let layer = match config.format {
        LogFormat::Text => fmt::layer()
            .with_writer(std::io::stderr)
            .with_target(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(env_filter)
            .boxed(),
        LogFormat::Json => fmt::layer()
            .with_writer(std::io::stderr)
            .json()
            .with_current_span(true)
            .with_file(config.include_location)
            .with_line_number(config.include_location)
            .with_filter(env_filter)
            .boxed(),
    };

    tracing_subscriber::registry().with(layer).try_init()?;
    tracing::debug!(filter = %config.default_filter, "logging initialized");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_levels() {
        let quiet = LoggingConfig::from_verbosity(0, LogFormat::Text);
        assert_eq!(
            quiet.default_filter,
            "warn,snowsync_cli=warn,snowsync_schema_tools=warn,snowsync_driver_snowflake=warn"
        );
        assert!(!quiet.include_location);

        let loud = LoggingConfig::from_verbosity(5, LogFormat::Json);
        assert!(loud.default_filter.ends_with("snowsync_driver_snowflake=trace"));
        assert!(loud.include_location);
    }

    #[test]
    fn test_default_filter_parses() {
        for verbosity in 0..4 {
            let config = LoggingConfig::from_verbosity(verbosity, LogFormat::Text);
            assert!(EnvFilter::try_new(&config.default_filter).is_ok());
        }
    }
}
