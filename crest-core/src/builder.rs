//! Request assembly
//!
//! Turns a [`RequestTemplate`] plus already rendered url/data/headers into a
//! [`HttpRequest`]. Each step is a standalone function so it can be checked in
//! isolation:
//!
//! 1. [`enforce_https`] - only `https`, or `http` to a loopback host
//! 2. [`parse_headers`] - the headers template must be a flat JSON object
//! 3. [`apply_auth`] - configured token, unless an `Authorization` header exists
//! 4. [`apply_session_credential`] - the caller's own session, loopback only
//! 5. [`select_body`] - body only for methods that carry one

use crate::credentials::{CredentialProvider, NoSessionCredential};
use crate::error::EngineError;
use crate::template::RequestTemplate;
use crest_config::AuthType;
use crest_http::{HttpMethod, HttpRequest};
use serde_json::Value;
use std::net::IpAddr;
use std::sync::Arc;
use tracing::debug;
use url::{Host, Url};

const AUTHORIZATION: &str = "Authorization";

/// Builds resolved requests from a template
#[derive(Clone)]
pub struct RequestBuilder {
    credentials: Arc<dyn CredentialProvider>,
}

impl Default for RequestBuilder {
    fn default() -> Self {
        Self::new(Arc::new(NoSessionCredential))
    }
}

impl std::fmt::Debug for RequestBuilder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RequestBuilder").finish_non_exhaustive()
    }
}

impl RequestBuilder {
    pub fn new(credentials: Arc<dyn CredentialProvider>) -> Self {
        Self { credentials }
    }

    /// Assemble a request from rendered template parts
    pub fn build(
        &self,
        template: &RequestTemplate,
        url: &str,
        data: Option<&str>,
        headers: Option<&str>,
    ) -> Result<HttpRequest, EngineError> {
        let url = url.trim();
        let parsed_url = enforce_https(url)?;
        let mut header_pairs = parse_headers(headers)?;

        apply_auth(
            &mut header_pairs,
            template.auth_type,
            template.auth_token.as_deref(),
        );

        if is_loopback(&parsed_url) {
            apply_session_credential(
                &mut header_pairs,
                self.credentials.as_ref(),
                &template.session_scheme,
            );
        }

        let body = select_body(template.method, data);

        debug!(
            "Built {} request for {} with {} header(s)",
            template.method,
            url,
            header_pairs.len()
        );

        Ok(HttpRequest {
            method: template.method,
            url: url.to_string(),
            headers: header_pairs,
            body,
            timeout: template.timeout,
            verify_tls: template.verify_tls,
        })
    }
}

/// Accept `https` anywhere and `http` only towards the local host
pub fn enforce_https(raw: &str) -> Result<Url, EngineError> {
    let url = Url::parse(raw.trim())
        .map_err(|e| EngineError::Validation(format!("Invalid URL '{}': {}", raw, e)))?;

    match url.scheme() {
        "https" => Ok(url),
        "http" if is_loopback(&url) => Ok(url),
        "http" => Err(EngineError::Validation(format!(
            "Refusing plain HTTP to non-local host in '{}': use https",
            raw
        ))),
        other => Err(EngineError::Validation(format!(
            "Unsupported URL scheme '{}' in '{}'",
            other, raw
        ))),
    }
}

/// `localhost`, `127.0.0.0/8` or `::1`
pub fn is_loopback(url: &Url) -> bool {
    match url.host() {
        Some(Host::Domain(domain)) => domain.eq_ignore_ascii_case("localhost"),
        Some(Host::Ipv4(ip)) => IpAddr::V4(ip).is_loopback(),
        Some(Host::Ipv6(ip)) => IpAddr::V6(ip).is_loopback(),
        None => false,
    }
}

/// Parse the rendered headers template into ordered name/value pairs
pub fn parse_headers(raw: Option<&str>) -> Result<Vec<(String, String)>, EngineError> {
    let raw = match raw.map(str::trim) {
        Some(text) if !text.is_empty() => text,
        _ => return Ok(Vec::new()),
    };

    let value: Value = serde_json::from_str(raw)
        .map_err(|e| EngineError::HeaderParse(format!("headers are not valid JSON: {}", e)))?;

    let Value::Object(map) = value else {
        return Err(EngineError::HeaderParse(
            "headers must be a JSON object".to_string(),
        ));
    };

    let mut pairs = Vec::with_capacity(map.len());
    for (name, value) in map {
        let text = match value {
            Value::String(s) => s,
            Value::Number(n) => n.to_string(),
            Value::Bool(b) => b.to_string(),
            other => {
                return Err(EngineError::HeaderParse(format!(
                    "header '{}' must be a string, number or boolean, got {}",
                    name, other
                )))
            }
        };

        http::HeaderName::from_bytes(name.as_bytes()).map_err(|_| {
            EngineError::HeaderParse(format!("'{}' is not a valid header name", name))
        })?;
        http::HeaderValue::from_str(&text).map_err(|_| {
            EngineError::HeaderParse(format!("header '{}' has an invalid value", name))
        })?;

        pairs.push((name, text));
    }

    Ok(pairs)
}

fn has_authorization(headers: &[(String, String)]) -> bool {
    headers
        .iter()
        .any(|(name, _)| name.eq_ignore_ascii_case(AUTHORIZATION))
}

/// Add `Authorization: <scheme> <token>` unless the caller already set one
pub fn apply_auth(headers: &mut Vec<(String, String)>, auth_type: AuthType, token: Option<&str>) {
    let Some(token) = token.filter(|t| !t.is_empty()) else {
        return;
    };

    if has_authorization(headers) {
        debug!("Explicit Authorization header present, ignoring auth_token");
        return;
    }

    headers.push((
        AUTHORIZATION.to_string(),
        format!("{} {}", auth_type.scheme(), token),
    ));
}

/// Attach the caller's session credential when nothing else authenticates the request.
///
/// Only call this for loopback targets.
pub fn apply_session_credential(
    headers: &mut Vec<(String, String)>,
    credentials: &dyn CredentialProvider,
    scheme: &str,
) {
    if has_authorization(headers) {
        return;
    }

    if let Some(token) = credentials.current_session_token() {
        debug!("Attaching session credential for loopback request");
        headers.push((AUTHORIZATION.to_string(), format!("{} {}", scheme, token)));
    }
}

/// Body bytes for methods that carry one
pub fn select_body(method: HttpMethod, data: Option<&str>) -> Option<Vec<u8>> {
    let data = data?;
    if method.carries_body() {
        Some(data.as_bytes().to_vec())
    } else {
        debug!("Ignoring data for {} request", method);
        None
    }
}
