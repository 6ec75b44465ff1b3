use anyhow::Result;
use crest_config::{LogFormat, LogLevel, LoggingConfig};
use tracing_subscriber::EnvFilter;

/// Pick the filter: explicit directive, then `RUST_LOG`, then the configured level
pub fn build_filter(explicit: Option<&str>, configured: LogLevel) -> EnvFilter {
    explicit
        .and_then(|directive| EnvFilter::try_new(directive).ok())
        .or_else(|| EnvFilter::try_from_default_env().ok())
        .unwrap_or_else(|| EnvFilter::new(configured.to_string()))
}

/// Initialize logging from configuration, with an optional level override
pub fn init_logging_from_config(config: &LoggingConfig, level_override: Option<&str>) -> Result<()> {
    let filter = build_filter(level_override, config.level);
    let builder = tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_file(config.include_location)
        .with_line_number(config.include_location);

    // Use try_init to avoid panic if global subscriber already set
    let outcome = match config.format {
        LogFormat::Json => builder.json().try_init(),
        LogFormat::Compact => builder.compact().try_init(),
        LogFormat::Text => builder.try_init(),
    };

    if outcome.is_err() {
        tracing::debug!("Global tracing subscriber already initialized, skipping");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_explicit_directive_wins() {
        temp_env::with_var("RUST_LOG", Some("trace"), || {
            let filter = build_filter(Some("warn"), LogLevel::Debug);
            assert_eq!(filter.to_string(), "warn");
        });
    }

    #[test]
    fn test_rust_log_beats_configured_level() {
        temp_env::with_var("RUST_LOG", Some("crest_core=trace"), || {
            let filter = build_filter(None, LogLevel::Error);
            assert_eq!(filter.to_string(), "crest_core=trace");
        });
    }

    #[test]
    fn test_configured_level_is_the_fallback() {
        temp_env::with_var_unset("RUST_LOG", || {
            let filter = build_filter(None, LogLevel::Debug);
            assert_eq!(filter.to_string(), "debug");
        });
    }

    #[test]
    fn test_init_is_idempotent() {
        let config = LoggingConfig::default();
        assert!(init_logging_from_config(&config, Some("info")).is_ok());
        assert!(init_logging_from_config(&config, Some("debug")).is_ok());
    }
}
