//! Output record construction

use crate::error::EngineError;
use crate::parser::ParsedRow;
use crate::record::{InputRecord, OutputRecord};
use crest_http::{HttpRequest, HttpResponse};
use serde_json::{Map, Value};

pub const STATUS_CODE: &str = "status_code";
pub const STATUS_MESSAGE: &str = "status_message";
pub const ROW_STATUS_CODE: &str = "crest_status_code";
pub const ROW_URL: &str = "crest_url";
pub const ERROR_KIND: &str = "crest_error";
pub const ERROR_MESSAGE: &str = "crest_error_message";

/// Records for a response: one per parsed row, or a single status record
pub fn emit_response(
    input: Option<&InputRecord>,
    url: &str,
    response: &HttpResponse,
    rows: Vec<ParsedRow>,
) -> Vec<OutputRecord> {
    if rows.is_empty() {
        let message = if response.body.is_empty() {
            response.status_text.clone()
        } else {
            response.text()
        };

        let mut record = OutputRecord::from_input(input);
        record.insert(STATUS_CODE, response.status);
        record.insert(STATUS_MESSAGE, message);
        return vec![record];
    }

    rows.into_iter()
        .map(|row| {
            let mut record = OutputRecord::from_input(input);
            record.extend(row);
            record.insert(ROW_STATUS_CODE, response.status);
            record.insert(ROW_URL, url);
            record
        })
        .collect()
}

/// A single record describing a failed request or response
pub fn emit_error(input: Option<&InputRecord>, error: &EngineError, status: Option<u16>) -> OutputRecord {
    let mut record = OutputRecord::from_input(input);
    record.insert(ERROR_KIND, error.kind());
    record.insert(ERROR_MESSAGE, error.to_string());
    if let Some(status) = status {
        record.insert(STATUS_CODE, status);
    }
    record
}

/// The request that would have been sent
pub fn emit_debug(input: Option<&InputRecord>, request: &HttpRequest) -> OutputRecord {
    let headers: Map<String, Value> = request
        .headers
        .iter()
        .map(|(name, value)| (name.clone(), Value::String(value.clone())))
        .collect();

    let mut record = OutputRecord::from_input(input);
    record.insert("debug_url", request.url.as_str());
    record.insert("debug_method", request.method.as_str());
    record.insert("debug_headers", Value::Object(headers).to_string());
    record.insert("debug_data", request.body_text().unwrap_or_default());
    record.insert("debug_verify_ssl", request.verify_tls);
    record
}
