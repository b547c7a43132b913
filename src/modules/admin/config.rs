use chrono::Duration;
use log::warn;
use std::fmt;

use crate::modules::error::ProvisionError;
use crate::modules::utils::io::is_valid_email;
use crate::{
    DEFAULT_ADMIN_EMAIL, DEFAULT_ADMIN_PASSWORD, DEFAULT_ADMIN_USERNAME, DEFAULT_HASH_WORK_FACTOR,
    DEFAULT_TOKEN_VALIDITY_SECS,
};

/// Everything one provisioning run needs, passed explicitly rather than read
/// from the process environment
#[derive(Clone)]
pub struct ProvisionConfig {
    pub store_uri: String,
    pub signing_secret: String,
    pub username: String,
    pub email: String,
    pub password: String,
    pub hash_work_factor: u32,
    pub token_validity_secs: u64,
}

// Secrets never reach logs through Debug
impl fmt::Debug for ProvisionConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProvisionConfig")
            .field("store_uri", &self.store_uri)
            .field("signing_secret", &"<redacted>")
            .field("username", &self.username)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .field("hash_work_factor", &self.hash_work_factor)
            .field("token_validity_secs", &self.token_validity_secs)
            .finish()
    }
}

impl ProvisionConfig {
    /// Create a configuration with the default admin identity and limits
    pub fn new(store_uri: impl Into<String>, signing_secret: impl Into<String>) -> Self {
        Self {
            store_uri: store_uri.into(),
            signing_secret: signing_secret.into(),
            username: DEFAULT_ADMIN_USERNAME.to_string(),
            email: DEFAULT_ADMIN_EMAIL.to_string(),
            password: DEFAULT_ADMIN_PASSWORD.to_string(),
            hash_work_factor: DEFAULT_HASH_WORK_FACTOR,
            token_validity_secs: DEFAULT_TOKEN_VALIDITY_SECS,
        }
    }

    pub fn with_username(mut self, username: impl Into<String>) -> Self {
        self.username = username.into();
        self
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = email.into();
        self
    }

    pub fn with_password(mut self, password: impl Into<String>) -> Self {
        self.password = password.into();
        self
    }

    pub fn with_hash_work_factor(mut self, work_factor: u32) -> Self {
        self.hash_work_factor = work_factor;
        self
    }

    pub fn with_token_validity_secs(mut self, secs: u64) -> Self {
        self.token_validity_secs = secs;
        self
    }

    /// Whether the built-in placeholder password is still in use
    pub fn uses_default_password(&self) -> bool {
        self.password == DEFAULT_ADMIN_PASSWORD
    }

    /// Token lifetime as a signed duration
    pub fn token_validity(&self) -> Result<Duration, ProvisionError> {
        i64::try_from(self.token_validity_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .ok_or_else(|| {
                ProvisionError::Config(format!(
                    "token validity of {} seconds is out of range",
                    self.token_validity_secs
                ))
            })
    }

    /// Reject configurations that can never succeed. The signing secret is
    /// checked when the token is signed.
    pub fn validate(&self) -> Result<(), ProvisionError> {
        if self.store_uri.trim().is_empty() {
            return Err(ProvisionError::Config("store URI is required".to_string()));
        }
        if self.username.trim().is_empty() {
            return Err(ProvisionError::Config("username must not be empty".to_string()));
        }
        if self.email.trim().is_empty() {
            return Err(ProvisionError::Config("email must not be empty".to_string()));
        }
        // Email is informational only
        if !is_valid_email(&self.email) {
            warn!("Email `{}` does not look like an address; storing it as given", self.email);
        }
        if self.password.is_empty() {
            return Err(ProvisionError::Config("password must not be empty".to_string()));
        }
        if self.hash_work_factor == 0 {
            return Err(ProvisionError::Config(
                "hash work factor must be a positive integer".to_string(),
            ));
        }
        if self.token_validity_secs == 0 {
            return Err(ProvisionError::Config(
                "token validity must be at least one second".to_string(),
            ));
        }
        self.token_validity()?;
        Ok(())
    }
}
