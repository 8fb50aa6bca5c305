//! Service credentials and credential lookup.

use std::fmt;

use base64::{Engine as _, engine::general_purpose};

use crate::error::{DeltaGateError, Result};

/// Default environment prefix used by [`EnvCredentialStore`].
pub const DEFAULT_CREDENTIALS_PREFIX: &str = "DELTAGATE_CREDENTIALS";

/// Username and password of the analysis service user.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
}

impl Credentials {
    /// Validate a username/password pair.
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Result<Self> {
        let username = username.into();
        let password = password.into();
        if username.is_empty() {
            return Err(DeltaGateError::Validation(
                "the user name must match the analysis service user".to_string(),
            ));
        }
        if password.is_empty() {
            return Err(DeltaGateError::Validation(
                "the password must match the analysis service user".to_string(),
            ));
        }
        Ok(Self { username, password })
    }

    /// The username.
    pub fn username(&self) -> &str {
        &self.username
    }

    /// `base64(username:password)`.
    pub fn as_base64(&self) -> String {
        general_purpose::STANDARD.encode(format!("{}:{}", self.username, self.password))
    }

    /// Value for the `Authorization` header.
    pub fn basic_auth_header(&self) -> String {
        format!("Basic {}", self.as_base64())
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Resolves a stored credential identifier into credentials.
#[cfg_attr(test, mockall::automock)]
pub trait CredentialResolver {
    /// Look up credentials by id; unknown ids fail with a configuration error.
    fn resolve(&self, id: &str) -> Result<Credentials>;
}

/// Credential store backed by environment variables.
///
/// An id `ci-bot` resolves from `<PREFIX>_CI_BOT_USERNAME` and
/// `<PREFIX>_CI_BOT_PASSWORD`.
#[derive(Debug, Clone)]
pub struct EnvCredentialStore {
    prefix: String,
}

impl EnvCredentialStore {
    /// Build a store reading variables under `prefix`.
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    fn variable(&self, id: &str, field: &str) -> String {
        let key: String = id
            .trim()
            .chars()
            .map(|c| {
                if c.is_ascii_alphanumeric() {
                    c.to_ascii_uppercase()
                } else {
                    '_'
                }
            })
            .collect();
        format!("{}_{key}_{field}", self.prefix)
    }
}

impl Default for EnvCredentialStore {
    fn default() -> Self {
        Self::new(DEFAULT_CREDENTIALS_PREFIX)
    }
}

impl CredentialResolver for EnvCredentialStore {
    fn resolve(&self, id: &str) -> Result<Credentials> {
        if id.trim().is_empty() {
            return Err(DeltaGateError::Configuration(
                "credentials id is required".to_string(),
            ));
        }
        let username = std::env::var(self.variable(id, "USERNAME")).ok();
        let password = std::env::var(self.variable(id, "PASSWORD")).ok();
        match (username, password) {
            (Some(username), Some(password)) => Credentials::new(username, password)
                .map_err(|err| DeltaGateError::Configuration(format!("credentials {id}: {err}"))),
            _ => Err(DeltaGateError::Configuration(format!(
                "credentials not found: {id}"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::ErrorKind;

    #[test]
    fn encodes_user_name_and_password() {
        let user = Credentials::new("Bot", "BotPassword").expect("credentials");
        assert_eq!(user.as_base64(), "Qm90OkJvdFBhc3N3b3Jk");
        assert_eq!(user.basic_auth_header(), "Basic Qm90OkJvdFBhc3N3b3Jk");
    }

    #[test]
    fn rejects_empty_username_or_password() {
        assert!(Credentials::new("", "secret").is_err());
        assert!(Credentials::new("bot", "").is_err());
    }

    #[test]
    fn debug_redacts_password() {
        let user = Credentials::new("bot", "hunter2").expect("credentials");
        let rendered = format!("{user:?}");
        assert!(rendered.contains("bot"));
        assert!(!rendered.contains("hunter2"));
    }

    #[test]
    fn env_store_resolves_normalized_id() {
        let store = EnvCredentialStore::new("DELTAGATE_TEST_RESOLVE");
        unsafe {
            std::env::set_var("DELTAGATE_TEST_RESOLVE_CI_BOT_USERNAME", "bot");
            std::env::set_var("DELTAGATE_TEST_RESOLVE_CI_BOT_PASSWORD", "secret");
        }
        let user = store.resolve("ci-bot").expect("resolve");
        assert_eq!(user.username(), "bot");
        unsafe {
            std::env::remove_var("DELTAGATE_TEST_RESOLVE_CI_BOT_USERNAME");
            std::env::remove_var("DELTAGATE_TEST_RESOLVE_CI_BOT_PASSWORD");
        }
    }

    #[test]
    fn env_store_reports_missing_credentials() {
        let store = EnvCredentialStore::new("DELTAGATE_TEST_MISSING");
        let err = store.resolve("nobody").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::Configuration);
        assert!(err.to_string().contains("credentials not found: nobody"));
    }

    #[test]
    fn env_store_requires_id() {
        let err = EnvCredentialStore::default().resolve("  ").unwrap_err();
        assert!(err.to_string().contains("credentials id is required"));
    }
}
