//! CLI argument parsing definitions

use anyhow::{Context, Result};
use clap::Parser;
use crest_config::{parse_bool, AuthType, CrestConfig, LogFormat};
use std::path::PathBuf;
use std::time::Duration;

/// Call a REST endpoint once, or once per JSON-lines record read from the input.
///
/// Tokens written as `$field$` in --url, --data and --headers are replaced with
/// the matching field of each input record.
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Set the log level (trace, debug, info, warn, error)
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log output format (text, json, compact)
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Endpoint URL, may contain $field$ tokens
    #[arg(long, value_name = "URL")]
    pub url: Option<String>,

    /// HTTP method (GET, POST, PUT, PATCH, DELETE)
    #[arg(long, value_name = "METHOD")]
    pub method: Option<String>,

    /// Request body, sent for POST, PUT and PATCH only
    #[arg(long, value_name = "TEXT")]
    pub data: Option<String>,

    /// Request headers as a flat JSON object
    #[arg(long, value_name = "JSON")]
    pub headers: Option<String>,

    /// Token for the Authorization header
    #[arg(long, value_name = "TOKEN")]
    pub auth_token: Option<String>,

    /// Authorization scheme (Bearer, Basic, Token)
    #[arg(long, value_name = "TYPE")]
    pub auth_type: Option<String>,

    /// Turn response bodies into rows
    #[arg(long, value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_missing_value = "true")]
    pub parse_response: Option<bool>,

    /// Dot-separated path to the result items in a JSON response
    #[arg(long, value_name = "PATH")]
    pub json_path: Option<String>,

    /// Field separator for delimited responses (sniffed when absent)
    #[arg(long, value_name = "CHAR")]
    pub delimiter: Option<String>,

    /// Verify TLS certificates
    #[arg(long, alias = "verify", value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_missing_value = "true")]
    pub verify_ssl: Option<bool>,

    /// Seconds to wait after each input record
    #[arg(long, value_name = "SECONDS")]
    pub delay: Option<f64>,

    /// Per-request timeout in seconds
    #[arg(long, value_name = "SECONDS")]
    pub timeout: Option<u64>,

    /// Emit the request that would be sent instead of sending it
    #[arg(long, value_name = "BOOL", value_parser = parse_bool, num_args = 0..=1, default_missing_value = "true")]
    pub debug: Option<bool>,

    /// Read input records (JSON lines) from this file, `-` for stdin
    #[arg(long, value_name = "PATH", conflicts_with = "generate")]
    pub input: Option<PathBuf>,

    /// Send the request once and ignore stdin
    #[arg(long)]
    pub generate: bool,

    /// Print a sample configuration file and exit
    #[arg(long)]
    pub sample_config: bool,
}

impl Cli {
    /// Overlay the flags that were given onto a loaded configuration
    pub fn apply(&self, config: &mut CrestConfig) -> Result<()> {
        let request = &mut config.request;
        if let Some(url) = &self.url {
            request.url = url.clone();
        }
        if let Some(method) = &self.method {
            request.method = method.clone();
        }
        if let Some(data) = &self.data {
            request.data = Some(data.clone());
        }
        if let Some(headers) = &self.headers {
            request.headers = Some(headers.clone());
        }
        if let Some(token) = &self.auth_token {
            request.auth_token = Some(token.clone());
        }
        if let Some(auth_type) = &self.auth_type {
            request.auth_type = auth_type
                .parse::<AuthType>()
                .map_err(anyhow::Error::msg)
                .context("Invalid --auth-type")?;
        }
        if let Some(verify) = self.verify_ssl {
            request.verify_ssl = verify;
        }
        if let Some(timeout) = self.timeout {
            request.timeout = Duration::from_secs(timeout);
        }
        if let Some(debug) = self.debug {
            request.debug = debug;
        }

        let parse = &mut config.parse;
        if let Some(enabled) = self.parse_response {
            parse.parse_response = enabled;
        }
        if let Some(path) = &self.json_path {
            parse.json_path = Some(path.clone());
        }
        if let Some(delimiter) = &self.delimiter {
            parse.delimiter = Some(delimiter.clone());
        }

        if let Some(delay) = self.delay {
            config.execution.delay = delay;
        }

        if let Some(format) = &self.log_format {
            config.logging.format = format
                .parse::<LogFormat>()
                .map_err(anyhow::Error::msg)
                .context("Invalid --log-format")?;
        }

        Ok(())
    }
}
