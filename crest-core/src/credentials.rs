//! Session credential used for calls back into the local host

/// Supplies the caller's own session credential.
///
/// Only consulted for loopback targets that have no `Authorization` header;
/// the value never comes from input records.
pub trait CredentialProvider: Send + Sync {
    fn current_session_token(&self) -> Option<String>;
}

/// No session available
#[derive(Debug, Clone, Copy, Default)]
pub struct NoSessionCredential;

impl CredentialProvider for NoSessionCredential {
    fn current_session_token(&self) -> Option<String> {
        None
    }
}

/// A fixed session token
#[derive(Debug, Clone)]
pub struct StaticSessionCredential {
    token: String,
}

impl StaticSessionCredential {
    pub fn new(token: impl Into<String>) -> Self {
        Self {
            token: token.into(),
        }
    }
}

impl CredentialProvider for StaticSessionCredential {
    fn current_session_token(&self) -> Option<String> {
        Some(self.token.clone())
    }
}

/// Reads the session token from an environment variable at call time
#[derive(Debug, Clone)]
pub struct EnvSessionCredential {
    variable: String,
}

impl EnvSessionCredential {
    pub const DEFAULT_VARIABLE: &'static str = "CREST_SESSION_TOKEN";

    pub fn new(variable: impl Into<String>) -> Self {
        Self {
            variable: variable.into(),
        }
    }
}

impl Default for EnvSessionCredential {
    fn default() -> Self {
        Self::new(Self::DEFAULT_VARIABLE)
    }
}

impl CredentialProvider for EnvSessionCredential {
    fn current_session_token(&self) -> Option<String> {
        std::env::var(&self.variable)
            .ok()
            .filter(|token| !token.trim().is_empty())
    }
}
