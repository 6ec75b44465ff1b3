//! Error types for the processing engine

use crate::parser::ResponseFormat;
use crest_config::ConfigError;
use crest_http::HttpError;
use thiserror::Error;

/// Engine result type
pub type EngineResult<T> = Result<T, EngineError>;

/// Errors raised while building, sending or interpreting a request
#[derive(Error, Debug)]
pub enum EngineError {
    /// Bad or insecure URL, unsupported method, bad parameter
    #[error("Validation error: {0}")]
    Validation(String),

    /// The headers template did not render to a flat JSON object of valid headers
    #[error("Header parse error: {0}")]
    HeaderParse(String),

    /// Connection refused, DNS failure, timeout
    #[error("Transport error: {0}")]
    Transport(#[from] HttpError),

    /// A `json_path` segment could not be followed
    #[error("json_path '{path}' could not be resolved: segment '{segment}' {reason}")]
    JsonPath {
        path: String,
        segment: String,
        reason: String,
    },

    /// The response body could not be turned into rows
    #[error("Failed to parse {format} response: {message} (body starts with: {snippet:?})")]
    Parse {
        format: ResponseFormat,
        message: String,
        snippet: String,
    },

    /// The upstream record stream failed
    #[error("Input error: {0}")]
    Input(String),

    /// The output sink refused a group
    #[error("Output error: {0}")]
    Output(String),
}

impl From<ConfigError> for EngineError {
    fn from(err: ConfigError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl EngineError {
    /// Short machine-readable kind, used in error output records
    pub fn kind(&self) -> &'static str {
        match self {
            EngineError::Validation(_) => "validation",
            EngineError::HeaderParse(_) => "header_parse",
            EngineError::Transport(_) => "transport",
            EngineError::JsonPath { .. } => "json_path",
            EngineError::Parse { .. } => "parse",
            EngineError::Input(_) => "input",
            EngineError::Output(_) => "output",
        }
    }

    /// Whether the error is confined to a single record's request or response
    pub fn is_record_scoped(&self) -> bool {
        matches!(
            self,
            EngineError::Validation(_)
                | EngineError::HeaderParse(_)
                | EngineError::Transport(_)
                | EngineError::JsonPath { .. }
                | EngineError::Parse { .. }
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_kinds() {
        assert_eq!(EngineError::Validation("x".into()).kind(), "validation");
        assert_eq!(EngineError::HeaderParse("x".into()).kind(), "header_parse");
        assert_eq!(
            EngineError::Parse {
                format: ResponseFormat::Xml,
                message: "bad".into(),
                snippet: "<a".into(),
            }
            .kind(),
            "parse"
        );
    }

    #[test]
    fn test_record_scope() {
        assert!(EngineError::HeaderParse("x".into()).is_record_scoped());
        assert!(!EngineError::Input("closed".into()).is_record_scoped());
        assert!(!EngineError::Output("broken pipe".into()).is_record_scoped());
    }

    #[test]
    fn test_parse_error_message_carries_format_and_snippet() {
        let err = EngineError::Parse {
            format: ResponseFormat::Json,
            message: "expected value".into(),
            snippet: "{oops".into(),
        };
        let message = err.to_string();
        assert!(message.contains("JSON"));
        assert!(message.contains("{oops"));
    }
}
