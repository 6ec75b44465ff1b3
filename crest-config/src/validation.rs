//! Configuration validation traits and utilities

use crate::error::{ConfigError, ConfigResult};

/// Trait for validatable configuration
pub trait Validatable {
    /// Validate the configuration
    fn validate(&self) -> ConfigResult<()>;

    /// Get the domain name for error reporting
    fn domain_name(&self) -> &'static str;

    /// Helper to create a domain-specific validation error
    fn validation_error(&self, message: impl Into<String>) -> ConfigError {
        ConfigError::DomainError {
            domain: self.domain_name().to_string(),
            message: message.into(),
        }
    }
}

/// Validate a required string field
pub fn validate_required_string(value: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    if value.trim().is_empty() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} cannot be empty", field_name),
        });
    }
    Ok(())
}

/// Validate a positive number
pub fn validate_positive<T>(value: T, field_name: &str, domain: &str) -> ConfigResult<()>
where
    T: PartialOrd + Default + std::fmt::Display,
{
    if value <= T::default() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be greater than 0, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a finite, non-negative number of seconds
pub fn validate_non_negative_seconds(value: f64, field_name: &str, domain: &str) -> ConfigResult<()> {
    if std::time::Duration::try_from_secs_f64(value).is_err() {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!("{} must be a non-negative number of seconds, got {}", field_name, value),
        });
    }
    Ok(())
}

/// Validate a URL
pub fn validate_url(url: &str, field_name: &str, domain: &str) -> ConfigResult<()> {
    validate_required_string(url, field_name, domain)?;

    url::Url::parse(url).map_err(|e| ConfigError::DomainError {
        domain: domain.to_string(),
        message: format!("{} has invalid URL format: {}", field_name, e),
    })?;

    Ok(())
}

/// Validate an enum choice
pub fn validate_enum_choice<T>(
    value: &str,
    valid_choices: &[T],
    field_name: &str,
    domain: &str,
) -> ConfigResult<()>
where
    T: AsRef<str>,
{
    let valid: Vec<&str> = valid_choices.iter().map(|c| c.as_ref()).collect();

    if !valid.iter().any(|&v| v.eq_ignore_ascii_case(value)) {
        return Err(ConfigError::DomainError {
            domain: domain.to_string(),
            message: format!(
                "{} has invalid value '{}'. Valid choices: {}",
                field_name,
                value,
                valid.join(", ")
            ),
        });
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_validate_positive() {
        assert!(validate_positive(10u64, "timeout", "request").is_ok());
        assert!(validate_positive(0u64, "timeout", "request").is_err());
    }

    #[test]
    fn test_validate_non_negative_seconds() {
        assert!(validate_non_negative_seconds(0.0, "delay", "execution").is_ok());
        assert!(validate_non_negative_seconds(0.5, "delay", "execution").is_ok());
        assert!(validate_non_negative_seconds(-1.0, "delay", "execution").is_err());
        assert!(validate_non_negative_seconds(f64::NAN, "delay", "execution").is_err());
        assert!(validate_non_negative_seconds(1e20, "delay", "execution").is_err());
    }

    #[test]
    fn test_validate_enum_choice_is_case_insensitive() {
        let choices = ["GET", "POST"];
        assert!(validate_enum_choice("get", &choices, "method", "request").is_ok());
        assert!(validate_enum_choice("Post", &choices, "method", "request").is_ok());

        let err = validate_enum_choice("fetch", &choices, "method", "request").unwrap_err();
        assert!(err.to_string().contains("Valid choices: GET, POST"));
    }

    #[test]
    fn test_validate_url() {
        assert!(validate_url("https://api.example.com/v1", "url", "request").is_ok());
        assert!(validate_url("not-a-url", "url", "request").is_err());
        assert!(validate_url("", "url", "request").is_err());
    }
}
