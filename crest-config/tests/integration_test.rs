//! Integration tests for crest-config

use crest_config::*;
use std::io::Write;
use std::time::Duration;
use temp_env::with_vars;

const CREST_VARS: [&str; 11] = [
    "CREST_URL",
    "CREST_METHOD",
    "CREST_DATA",
    "CREST_HEADERS",
    "CREST_DEBUG",
    "CREST_DELIMITER",
    "CREST_TIMEOUT",
    "CREST_VERIFY_SSL",
    "CREST_DELAY",
    "CREST_AUTH_TYPE",
    "CREST_LOG_LEVEL",
];

#[test]
fn test_default_config_requires_url_and_method() {
    let config = CrestConfig::default();
    let err = config.validate_all().unwrap_err();
    assert!(err.to_string().contains("url cannot be empty"));
}

#[test]
fn test_config_loader_from_env() {
    let vars = vec![
        ("CREST_URL", Some("https://api.example.com/items")),
        ("CREST_METHOD", Some("post")),
        ("CREST_DATA", Some(r#"{"name": "$name$"}"#)),
        ("CREST_HEADERS", Some(r#"{"X-Tenant": "$tenant$"}"#)),
        ("CREST_DEBUG", Some("yes")),
        ("CREST_DELIMITER", Some("|")),
        ("CREST_TIMEOUT", Some("30")),
        ("CREST_VERIFY_SSL", Some("f")),
        ("CREST_DELAY", Some("0.25")),
        ("CREST_AUTH_TYPE", Some("token")),
        ("CREST_LOG_LEVEL", Some("debug")),
    ];

    with_vars(vars, || {
        let config = ConfigLoader::new().from_env().unwrap();

        assert_eq!(config.request.url, "https://api.example.com/items");
        assert_eq!(config.request.method, "post");
        assert_eq!(config.request.timeout, Duration::from_secs(30));
        assert!(!config.request.verify_ssl);
        assert_eq!(config.request.auth_type, AuthType::Token);
        assert_eq!(config.request.data.as_deref(), Some(r#"{"name": "$name$"}"#));
        assert_eq!(
            config.request.headers.as_deref(),
            Some(r#"{"X-Tenant": "$tenant$"}"#)
        );
        assert!(config.request.debug);
        assert_eq!(config.parse.delimiter_char(), Some('|'));
        assert_eq!(config.execution.delay, 0.25);
        assert_eq!(config.logging.level, LogLevel::Debug);
    });
}

#[test]
fn test_invalid_env_value_is_reported() {
    with_vars(vec![("CREST_TIMEOUT", Some("soon"))], || {
        let err = ConfigLoader::new().layered(None::<&str>).unwrap_err();
        assert!(matches!(err, ConfigError::EnvError(_)));
    });
}

#[test]
fn test_invalid_debug_env_value_is_reported() {
    with_vars(vec![("CREST_DEBUG", Some("sometimes"))], || {
        let err = ConfigLoader::new().layered(None::<&str>).unwrap_err();
        assert!(err.to_string().contains("DEBUG"));
    });
}

#[test]
fn test_comprehensive_config_file() {
    let yaml = r#"
request:
  url: "https://api.example.com/users/$user$"
  method: PATCH
  data: '{"active": $active$}'
  headers: '{"X-Trace": "$trace$"}'
  auth_token: secret
  auth_type: basic
  verify: false
  timeout: 5
  debug: true

parse:
  parse_response: true
  json_path: data.items
  delimiter: "|"

execution:
  delay: 1.5

http:
  user_agent: "Test Agent"
  max_redirects: 3

logging:
  level: warn
  format: json
"#;

    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    let config = temp_env::with_vars_unset(CREST_VARS, || {
        ConfigLoader::new().from_file(file.path()).unwrap()
    });

    assert_eq!(config.request.method, "PATCH");
    assert_eq!(config.request.auth_type, AuthType::Basic);
    assert!(!config.request.verify_ssl);
    assert!(config.request.debug);
    assert_eq!(config.request.timeout, Duration::from_secs(5));
    assert!(config.parse.parse_response);
    assert_eq!(config.parse.json_path.as_deref(), Some("data.items"));
    assert_eq!(config.parse.delimiter_char(), Some('|'));
    assert_eq!(config.execution.delay, 1.5);
    assert_eq!(config.http.user_agent, "Test Agent");
    assert_eq!(config.http.max_redirects, 3);
    assert_eq!(config.logging.level, LogLevel::Warn);
    assert_eq!(config.logging.format, LogFormat::Json);
}

#[test]
fn test_env_overrides_file() {
    let yaml = "request:\n  url: https://a.example\n  method: get\n";
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(yaml.as_bytes()).unwrap();

    with_vars(vec![("CREST_URL", Some("https://b.example"))], || {
        let config = ConfigLoader::new().from_file(file.path()).unwrap();
        assert_eq!(config.request.url, "https://b.example");
    });
}

#[test]
fn test_generated_sample_is_valid() {
    let sample = CrestConfig::generate_sample();
    let parsed: CrestConfig = serde_yaml::from_str(&sample).unwrap();
    assert!(parsed.validate_all().is_ok());
    assert_eq!(parsed.request.timeout, Duration::from_secs(10));
}
