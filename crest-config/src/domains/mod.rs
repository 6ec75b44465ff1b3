//! Domain-specific configuration modules

pub mod execution;
pub mod http;
pub mod logging;
pub mod parse;
pub mod request;
pub mod utils;

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Complete configuration for one crest invocation
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct CrestConfig {
    /// Request template parameters
    #[serde(default)]
    pub request: request::RequestConfig,

    /// Response parsing parameters
    #[serde(default)]
    pub parse: parse::ParseConfig,

    /// Record loop configuration
    #[serde(default)]
    pub execution: execution::ExecutionConfig,

    /// HTTP client configuration
    #[serde(default)]
    pub http: http::HttpConfig,

    /// Logging configuration
    #[serde(default)]
    pub logging: logging::LoggingConfig,
}

impl CrestConfig {
    /// Validate all domain configurations
    pub fn validate_all(&self) -> ConfigResult<()> {
        self.request.validate()?;
        self.parse.validate()?;
        self.execution.validate()?;
        self.http.validate()?;
        self.logging.validate()?;
        Ok(())
    }

    /// Generate a sample configuration file
    pub fn generate_sample() -> String {
        let mut config = CrestConfig::default();
        config.request.url = "https://api.example.com/items/$id$".to_string();
        config.request.method = "GET".to_string();
        serde_yaml::to_string(&config)
            .unwrap_or_else(|_| "# Failed to generate sample config".to_string())
    }
}
