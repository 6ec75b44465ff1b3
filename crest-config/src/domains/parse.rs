//! Response parsing parameters

use crate::error::ConfigResult;
use crate::validation::Validatable;
use serde::{Deserialize, Serialize};

/// Controls how response bodies are turned into rows
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ParseConfig {
    /// Parse the body into rows instead of returning it raw
    pub parse_response: bool,

    /// Dot-separated path to the result items in a JSON body
    #[serde(skip_serializing_if = "Option::is_none")]
    pub json_path: Option<String>,

    /// Field separator for delimited text; sniffed when unset
    #[serde(skip_serializing_if = "Option::is_none")]
    pub delimiter: Option<String>,
}

impl ParseConfig {
    /// The configured delimiter as a single character, if any
    pub fn delimiter_char(&self) -> Option<char> {
        self.delimiter.as_deref().and_then(|d| d.chars().next())
    }
}

impl Validatable for ParseConfig {
    fn validate(&self) -> ConfigResult<()> {
        if let Some(delimiter) = &self.delimiter {
            let mut chars = delimiter.chars();
            match (chars.next(), chars.next()) {
                (Some(c), None) if c.is_ascii() && c != '"' && c != '\n' && c != '\r' => {}
                _ => {
                    return Err(self.validation_error(format!(
                        "delimiter must be a single ASCII character other than a quote or newline, got '{}'",
                        delimiter
                    )))
                }
            }
        }

        if let Some(path) = &self.json_path {
            if path.split('.').any(|segment| segment.is_empty()) {
                return Err(self.validation_error(format!(
                    "json_path '{}' contains an empty segment",
                    path
                )));
            }
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "parse"
    }
}
