//! Response parsing
//!
//! Bodies are classified by [`detect_format`] and handed to one of the pure
//! format parsers. Every parser returns rows with a uniform set of columns:
//! columns appear in first-seen order and missing cells are empty strings.

mod delimited;
mod json;
mod xml;

use crate::error::EngineError;
use crest_config::ParseConfig;
use crest_http::HttpResponse;
use serde_json::{Map, Value};
use std::fmt;
use tracing::debug;

/// A single flattened row: column to scalar value
pub type ParsedRow = Map<String, Value>;

const SNIPPET_CHARS: usize = 200;
const UTF8_BOM: &str = "\u{feff}";

/// How to interpret response bodies
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParseOptions {
    pub parse_response: bool,
    pub json_path: Option<String>,
    pub delimiter: Option<char>,
}

impl From<&ParseConfig> for ParseOptions {
    fn from(config: &ParseConfig) -> Self {
        Self {
            parse_response: config.parse_response,
            json_path: config
                .json_path
                .as_ref()
                .filter(|p| !p.trim().is_empty())
                .cloned(),
            delimiter: config.delimiter_char(),
        }
    }
}

/// Body format, decided once per response
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseFormat {
    Json,
    Xml,
    Delimited,
}

impl fmt::Display for ResponseFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ResponseFormat::Json => "JSON",
            ResponseFormat::Xml => "XML",
            ResponseFormat::Delimited => "delimited",
        };
        write!(f, "{}", name)
    }
}

/// Strict JSON first, then XML by its leading `<`, otherwise delimited text
pub fn detect_format(body: &str) -> ResponseFormat {
    if serde_json::from_str::<serde::de::IgnoredAny>(body).is_ok() {
        ResponseFormat::Json
    } else if body.trim_start().starts_with('<') {
        ResponseFormat::Xml
    } else {
        ResponseFormat::Delimited
    }
}

/// Turn a response body into rows.
///
/// Returns no rows when parsing is disabled or the body is empty.
pub fn parse(response: &HttpResponse, options: &ParseOptions) -> Result<Vec<ParsedRow>, EngineError> {
    if !options.parse_response || response.body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Vec::new());
    }

    let text = std::str::from_utf8(&response.body).map_err(|e| {
        let lossy = String::from_utf8_lossy(&response.body);
        parse_error(
            detect_format(&lossy),
            format!("body is not valid UTF-8: {}", e),
            &lossy,
        )
    })?;
    let text = text.strip_prefix(UTF8_BOM).unwrap_or(text);

    let format = detect_format(text);
    debug!("Parsing {} byte {} response", text.len(), format);

    match format {
        ResponseFormat::Json => json::parse_rows(text, options.json_path.as_deref()),
        ResponseFormat::Xml => xml::parse_rows(text),
        ResponseFormat::Delimited => delimited::parse_rows(text, options.delimiter),
    }
}

/// Fill in missing columns so every row has the union of all columns, in first-seen order
pub(crate) fn pad_rows(rows: Vec<ParsedRow>) -> Vec<ParsedRow> {
    let mut columns: Vec<String> = Vec::new();
    for row in &rows {
        for key in row.keys() {
            if !columns.iter().any(|c| c == key) {
                columns.push(key.clone());
            }
        }
    }

    rows.into_iter()
        .map(|mut row| {
            columns
                .iter()
                .map(|column| {
                    let value = row
                        .remove(column)
                        .unwrap_or_else(|| Value::String(String::new()));
                    (column.clone(), value)
                })
                .collect()
        })
        .collect()
}

pub(crate) fn snippet(body: &str) -> String {
    body.chars().take(SNIPPET_CHARS).collect()
}

pub(crate) fn parse_error(
    format: ResponseFormat,
    message: impl Into<String>,
    body: &str,
) -> EngineError {
    EngineError::Parse {
        format,
        message: message.into(),
        snippet: snippet(body),
    }
}
