//! Immutable request template built once per invocation

use crate::builder::enforce_https;
use crate::error::EngineError;
use crate::parser::ParseOptions;
use crest_config::{AuthType, CrestConfig};
use crest_http::HttpMethod;
use std::time::Duration;

/// Everything needed to produce requests for one invocation
#[derive(Debug, Clone)]
pub struct RequestTemplate {
    pub url: String,
    pub method: HttpMethod,
    pub data: Option<String>,
    pub headers: Option<String>,
    pub auth_token: Option<String>,
    pub auth_type: AuthType,
    pub verify_tls: bool,
    pub timeout: Duration,
    pub debug: bool,
    pub parse: ParseOptions,
    /// Pause between records in streaming mode
    pub delay: Option<Duration>,
    /// Scheme for the injected session credential
    pub session_scheme: String,
}

impl RequestTemplate {
    /// A template with default settings
    pub fn new(url: impl Into<String>, method: HttpMethod) -> Self {
        Self {
            url: url.into(),
            method,
            data: None,
            headers: None,
            auth_token: None,
            auth_type: AuthType::default(),
            verify_tls: true,
            timeout: Duration::from_secs(10),
            debug: false,
            parse: ParseOptions::default(),
            delay: None,
            session_scheme: "Bearer".to_string(),
        }
    }
}

impl TryFrom<&CrestConfig> for RequestTemplate {
    type Error = EngineError;

    fn try_from(config: &CrestConfig) -> Result<Self, Self::Error> {
        config.validate_all()?;

        let request = &config.request;
        let method: HttpMethod = request
            .method
            .parse()
            .map_err(|e: crest_http::HttpMethodError| EngineError::Validation(e.to_string()))?;

        // Templated URLs are checked per record once rendered, unless the
        // scheme and host are already fixed before the first token
        match literal_origin(&request.url) {
            Some(origin) => {
                enforce_https(origin)?;
            }
            None if !request.url_is_templated() => {
                enforce_https(&request.url)?;
            }
            None => {}
        }

        Ok(Self {
            url: request.url.clone(),
            method,
            data: non_empty(&request.data),
            headers: non_empty(&request.headers),
            auth_token: non_empty(&request.auth_token),
            auth_type: request.auth_type,
            verify_tls: request.verify_ssl,
            timeout: request.timeout,
            debug: request.debug,
            parse: ParseOptions::from(&config.parse),
            delay: config.execution.delay_duration(),
            session_scheme: config.execution.session_scheme.clone(),
        })
    }
}

/// Text before the first `$` when it already holds a scheme and a complete host
fn literal_origin(url: &str) -> Option<&str> {
    let (prefix, _) = url.trim_start().split_once('$')?;
    let (_, after_scheme) = prefix.split_once("://")?;
    after_scheme
        .contains(['/', '?', '#'])
        .then_some(prefix)
}

fn non_empty(value: &Option<String>) -> Option<String> {
    value.as_ref().filter(|v| !v.trim().is_empty()).cloned()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config(url: &str, method: &str) -> CrestConfig {
        let mut config = CrestConfig::default();
        config.request.url = url.to_string();
        config.request.method = method.to_string();
        config
    }

    #[test]
    fn test_template_from_config() {
        let mut config = config("https://api.example.com/items", "patch");
        config.request.data = Some("   ".to_string());
        config.request.headers = Some(r#"{"X-A": "1"}"#.to_string());
        config.parse.parse_response = true;
        config.parse.delimiter = Some(";".to_string());
        config.execution.delay = 0.5;

        let template = RequestTemplate::try_from(&config).unwrap();
        assert_eq!(template.method, HttpMethod::Patch);
        assert_eq!(template.data, None);
        assert_eq!(template.headers.as_deref(), Some(r#"{"X-A": "1"}"#));
        assert!(template.parse.parse_response);
        assert_eq!(template.parse.delimiter, Some(';'));
        assert_eq!(template.delay, Some(Duration::from_millis(500)));
        assert_eq!(template.timeout, Duration::from_secs(10));
    }

    #[test]
    fn test_insecure_literal_url_is_rejected_up_front() {
        let err = RequestTemplate::try_from(&config("http://example.com/api", "get")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));
    }

    #[test]
    fn test_loopback_http_is_allowed() {
        assert!(RequestTemplate::try_from(&config("http://localhost:8089/services", "get")).is_ok());
    }

    #[test]
    fn test_templated_url_is_deferred() {
        assert!(RequestTemplate::try_from(&config("$scheme$://example.com/$id$", "get")).is_ok());
        assert!(RequestTemplate::try_from(&config("http://$host$/items", "get")).is_ok());
        assert!(RequestTemplate::try_from(&config("http://example.com:$port$/", "get")).is_ok());
    }

    #[test]
    fn test_templated_url_with_insecure_literal_host_is_rejected() {
        let err =
            RequestTemplate::try_from(&config("http://example.com/items/$id$", "get")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("example.com")));

        let err = RequestTemplate::try_from(&config("http://example.com?id=$id$", "get")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(_)));

        assert!(RequestTemplate::try_from(&config("https://example.com/items/$id$", "get")).is_ok());
        assert!(RequestTemplate::try_from(&config("http://127.0.0.1:8089/$path$", "get")).is_ok());
    }

    #[test]
    fn test_literal_origin() {
        assert_eq!(
            literal_origin("https://api.example.com/v1/$id$"),
            Some("https://api.example.com/v1/")
        );
        assert_eq!(literal_origin("https://$host$/v1"), None);
        assert_eq!(literal_origin("$base$/v1"), None);
        assert_eq!(literal_origin("https://api.example.com/v1"), None);
    }

    #[test]
    fn test_unsupported_method_is_a_validation_error() {
        let err = RequestTemplate::try_from(&config("https://example.com", "head")).unwrap_err();
        assert!(matches!(err, EngineError::Validation(msg) if msg.contains("method")));
    }
}
