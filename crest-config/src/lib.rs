//! Domain-driven configuration for crest
//!
//! Invocation parameters (`request`, `parse`, `execution`) and ambient
//! settings (`http`, `logging`) are split by domain, each with serde defaults
//! and validation. Values layer as: YAML file, then `CREST_*` environment
//! variables, then whatever the caller (usually the CLI) sets last.

pub mod error;
pub mod loader;
pub mod validation;

// Domain-specific configuration modules
pub mod domains;

// Re-export main types
pub use error::{ConfigError, ConfigResult};
pub use loader::ConfigLoader;

// Re-export domain configurations
pub use domains::{
    execution::ExecutionConfig,
    http::HttpConfig,
    logging::{LogFormat, LogLevel, LoggingConfig},
    parse::ParseConfig,
    request::{AuthType, RequestConfig, SUPPORTED_METHODS},
    CrestConfig,
};

// Re-export utilities
pub use domains::utils::{parse_bool, serde_duration};
pub use validation::Validatable;
