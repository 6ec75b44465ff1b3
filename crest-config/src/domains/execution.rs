//! Execution controller configuration

use crate::error::ConfigResult;
use crate::validation::{validate_non_negative_seconds, validate_required_string, Validatable};
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the record loop
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    /// Seconds to wait between records in streaming mode
    #[serde(default)]
    pub delay: f64,

    /// Scheme used when injecting the caller's session credential on loopback calls
    #[serde(default = "default_session_scheme")]
    pub session_scheme: String,
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            delay: 0.0,
            session_scheme: default_session_scheme(),
        }
    }
}

impl ExecutionConfig {
    /// Inter-record delay, `None` when disabled
    pub fn delay_duration(&self) -> Option<Duration> {
        Duration::try_from_secs_f64(self.delay)
            .ok()
            .filter(|delay| !delay.is_zero())
    }
}

impl Validatable for ExecutionConfig {
    fn validate(&self) -> ConfigResult<()> {
        validate_non_negative_seconds(self.delay, "delay", self.domain_name())?;
        validate_required_string(&self.session_scheme, "session_scheme", self.domain_name())?;

        if self.session_scheme.contains(char::is_whitespace) {
            return Err(self.validation_error("session_scheme cannot contain whitespace"));
        }

        Ok(())
    }

    fn domain_name(&self) -> &'static str {
        "execution"
    }
}

fn default_session_scheme() -> String {
    "Bearer".to_string()
}
