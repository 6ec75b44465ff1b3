//! Configuration loading and environment variable handling

use crate::domains::CrestConfig;
use crate::domains::utils::parse_bool;
use crate::error::{ConfigError, ConfigResult};
use std::path::Path;
use std::str::FromStr;
use tracing::debug;

/// Configuration loader with environment variable support
pub struct ConfigLoader {
    /// Environment variable prefix
    prefix: String,
}

impl ConfigLoader {
    /// Create a new config loader with default prefix
    pub fn new() -> Self {
        Self {
            prefix: "CREST".to_string(),
        }
    }

    /// Create a new config loader with custom prefix
    pub fn with_prefix(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    /// Load configuration from a YAML file with environment overrides
    pub fn from_file(&self, path: impl AsRef<Path>) -> ConfigResult<CrestConfig> {
        let config = self.layered(Some(path))?;
        config.validate_all()?;
        Ok(config)
    }

    /// Load configuration from environment variables only
    pub fn from_env(&self) -> ConfigResult<CrestConfig> {
        let config = self.layered(None::<&Path>)?;
        config.validate_all()?;
        Ok(config)
    }

    /// File (if any) plus environment overrides, without validation.
    ///
    /// Callers that apply a further layer (command line flags) validate once
    /// everything is merged.
    pub fn layered(&self, config_path: Option<impl AsRef<Path>>) -> ConfigResult<CrestConfig> {
        let mut config = match config_path {
            Some(path) => {
                debug!("Loading configuration from {}", path.as_ref().display());
                let content = std::fs::read_to_string(path)?;
                serde_yaml::from_str(&content)?
            }
            None => CrestConfig::default(),
        };

        self.apply_env_overrides(&mut config)?;
        Ok(config)
    }

    /// Apply environment variable overrides to configuration
    fn apply_env_overrides(&self, config: &mut CrestConfig) -> ConfigResult<()> {
        self.apply_request_overrides(&mut config.request)?;
        self.apply_parse_overrides(&mut config.parse)?;
        self.apply_execution_overrides(&mut config.execution)?;
        self.apply_http_overrides(&mut config.http)?;
        self.apply_logging_overrides(&mut config.logging)?;
        Ok(())
    }

    fn apply_request_overrides(
        &self,
        config: &mut crate::domains::request::RequestConfig,
    ) -> ConfigResult<()> {
        if let Ok(url) = self.get_env_var("URL") {
            config.url = url;
        }

        if let Ok(method) = self.get_env_var("METHOD") {
            config.method = method;
        }

        if let Ok(data) = self.get_env_var("DATA") {
            config.data = Some(data);
        }

        if let Ok(headers) = self.get_env_var("HEADERS") {
            config.headers = Some(headers);
        }

        if let Ok(token) = self.get_env_var("AUTH_TOKEN") {
            config.auth_token = Some(token);
        }

        if let Ok(auth_type) = self.get_env_var("AUTH_TYPE") {
            config.auth_type = auth_type.parse().map_err(ConfigError::EnvError)?;
        }

        if let Ok(timeout) = self.get_env_var("TIMEOUT") {
            let seconds: u64 = timeout
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid TIMEOUT: {}", e)))?;
            config.timeout = std::time::Duration::from_secs(seconds);
        }

        if let Ok(verify_ssl) = self.get_env_var("VERIFY_SSL") {
            config.verify_ssl = parse_bool(&verify_ssl)
                .map_err(|e| ConfigError::EnvError(format!("Invalid VERIFY_SSL: {}", e)))?;
        }

        if let Ok(debug) = self.get_env_var("DEBUG") {
            config.debug = parse_bool(&debug)
                .map_err(|e| ConfigError::EnvError(format!("Invalid DEBUG: {}", e)))?;
        }

        Ok(())
    }

    fn apply_parse_overrides(
        &self,
        config: &mut crate::domains::parse::ParseConfig,
    ) -> ConfigResult<()> {
        if let Ok(parse) = self.get_env_var("PARSE_RESPONSE") {
            config.parse_response = parse_bool(&parse)
                .map_err(|e| ConfigError::EnvError(format!("Invalid PARSE_RESPONSE: {}", e)))?;
        }

        if let Ok(path) = self.get_env_var("JSON_PATH") {
            config.json_path = Some(path);
        }

        if let Ok(delimiter) = self.get_env_var("DELIMITER") {
            config.delimiter = Some(delimiter);
        }

        Ok(())
    }

    fn apply_execution_overrides(
        &self,
        config: &mut crate::domains::execution::ExecutionConfig,
    ) -> ConfigResult<()> {
        if let Ok(delay) = self.get_env_var("DELAY") {
            config.delay = delay
                .parse()
                .map_err(|e| ConfigError::EnvError(format!("Invalid DELAY: {}", e)))?;
        }

        if let Ok(scheme) = self.get_env_var("SESSION_SCHEME") {
            config.session_scheme = scheme;
        }

        Ok(())
    }

    fn apply_http_overrides(
        &self,
        config: &mut crate::domains::http::HttpConfig,
    ) -> ConfigResult<()> {
        if let Ok(user_agent) = self.get_env_var("HTTP_USER_AGENT") {
            config.user_agent = user_agent;
        }

        if let Ok(redirects) = self.get_env_var("HTTP_MAX_REDIRECTS") {
            config.max_redirects = redirects.parse().map_err(|e| {
                ConfigError::EnvError(format!("Invalid HTTP_MAX_REDIRECTS: {}", e))
            })?;
        }

        Ok(())
    }

    fn apply_logging_overrides(
        &self,
        config: &mut crate::domains::logging::LoggingConfig,
    ) -> ConfigResult<()> {
        if let Ok(log_level) = self.get_env_var("LOG_LEVEL") {
            config.level = crate::domains::logging::LogLevel::from_str(&log_level)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_LEVEL: {}", log_level)))?;
        }

        if let Ok(format) = self.get_env_var("LOG_FORMAT") {
            config.format = crate::domains::logging::LogFormat::from_str(&format)
                .map_err(|_| ConfigError::EnvError(format!("Invalid LOG_FORMAT: {}", format)))?;
        }

        Ok(())
    }

    /// Get environment variable with prefix
    fn get_env_var(&self, name: &str) -> Result<String, std::env::VarError> {
        std::env::var(format!("{}_{}", self.prefix, name))
    }
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}
