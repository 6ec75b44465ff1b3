//! Request template parameters

use crate::error::ConfigResult;
use crate::validation::{
    validate_enum_choice, validate_positive, validate_required_string, validate_url, Validatable,
};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;

/// HTTP methods accepted for the `method` parameter
pub const SUPPORTED_METHODS: [&str; 5] = ["GET", "POST", "PUT", "PATCH", "DELETE"];

/// Parameters describing the request to issue.
///
/// `url`, `data` and `headers` are templates: in streaming mode `$field$`
/// tokens are bound to the fields of each incoming record.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RequestConfig {
    /// Endpoint URL (template)
    pub url: String,

    /// HTTP method, case-insensitive
    pub method: String,

    /// Request body (template), only sent for POST/PUT/PATCH
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<String>,

    /// Headers as a JSON object (template)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub headers: Option<String>,

    /// Token for the synthesized `Authorization` header
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,

    /// Scheme used with `auth_token`
    #[serde(default)]
    pub auth_type: AuthType,

    /// Whether to verify TLS certificates
    #[serde(alias = "verify", default = "crate::domains::utils::default_true")]
    pub verify_ssl: bool,

    /// Per-request timeout
    #[serde(
        with = "crate::domains::utils::serde_duration",
        default = "default_timeout"
    )]
    pub timeout: Duration,

    /// Return the rendered request instead of sending it
    #[serde(default = "crate::domains::utils::default_false")]
    pub debug: bool,
}

/// Authorization scheme for `auth_token`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthType {
    #[default]
    Bearer,
    Basic,
    Token,
}

impl AuthType {
    /// Scheme as written in the `Authorization` header
    pub fn scheme(&self) -> &'static str {
        match self {
            AuthType::Bearer => "Bearer",
            AuthType::Basic => "Basic",
            AuthType::Token => "Token",
        }
    }
}

impl fmt::Display for AuthType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.scheme())
    }
}

impl FromStr for AuthType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "bearer" => Ok(AuthType::Bearer),
            "basic" => Ok(AuthType::Basic),
            "token" => Ok(AuthType::Token),
            _ => Err(format!(
                "Invalid auth type: '{}'. Supported types are: Bearer, Basic, Token",
                s
            )),
        }
    }
}

impl TryFrom<String> for AuthType {
    type Error = String;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<AuthType> for String {
    fn from(auth_type: AuthType) -> Self {
        auth_type.scheme().to_lowercase()
    }
}

impl Default for RequestConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            method: String::new(),
            data: None,
            headers: None,
            auth_token: None,
            auth_type: AuthType::default(),
            verify_ssl: true,
            timeout: default_timeout(),
            debug: false,
        }
    }
}

impl RequestConfig {
    /// Whether the URL template contains substitution tokens
    pub fn url_is_templated(&self) -> bool {
        self.url.contains('$')
    }
}

impl Validatable for RequestConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_required_string(&self.url, "url", self.domain_name())?;

        // Templated URLs can only be checked once rendered
        if !self.url_is_templated() {
            validate_url(&self.url, "url", self.domain_name())?;
        }

        validate_required_string(&self.method, "method", self.domain_name())?;
        validate_enum_choice(&self.method, &SUPPORTED_METHODS, "method", self.domain_name())?;

        validate_positive(self.timeout.as_secs(), "timeout", self.domain_name())?;

        if let Some(token) = &self.auth_token {
            validate_required_string(token, "auth_token", self.domain_name())?;
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "request"
    }
}

fn default_timeout() -> Duration {
    Duration::from_secs(10)
}
