use std::io;

use thiserror::Error;

/// Errors raised by a user store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unreachable: {0}")]
    Unreachable(String),
    #[error("unsupported store URI scheme `{0}`")]
    UnsupportedScheme(String),
    #[error("username `{0}` already exists")]
    DuplicateUsername(String),
    #[error("store document is corrupt: {0}")]
    Corrupt(String),
    #[error("store connection already released")]
    Disconnected,
    #[error("store I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Every way a provisioning run (or token inspection) can fail
#[derive(Debug, Error)]
pub enum ProvisionError {
    #[error("invalid configuration: {0}")]
    Config(String),
    #[error("store unreachable: {0}")]
    StoreUnreachable(String),
    #[error("constraint violation: username `{0}` already exists, re-run to reuse it")]
    ConstraintViolation(String),
    #[error("password hashing failed: {0}")]
    HashingFailure(String),
    #[error("token signing failed: {0}")]
    SigningFailure(String),
    #[error("invalid token: {0}")]
    InvalidToken(String),
    #[error("unexpected error: {0}")]
    Unknown(String),
}

impl ProvisionError {
    /// Process exit status reported by the CLI for this error
    pub fn exit_status(&self) -> u8 {
        match self {
            ProvisionError::Config(_) => 2,
            ProvisionError::StoreUnreachable(_) => 3,
            ProvisionError::ConstraintViolation(_) => 4,
            ProvisionError::HashingFailure(_) => 5,
            ProvisionError::SigningFailure(_) => 6,
            ProvisionError::InvalidToken(_) => 7,
            ProvisionError::Unknown(_) => 1,
        }
    }
}

impl From<StoreError> for ProvisionError {
    fn from(error: StoreError) -> Self {
        match error {
            StoreError::Unreachable(msg) => ProvisionError::StoreUnreachable(msg),
            StoreError::DuplicateUsername(name) => ProvisionError::ConstraintViolation(name),
            StoreError::UnsupportedScheme(_) => ProvisionError::Config(error.to_string()),
            StoreError::Corrupt(_) | StoreError::Disconnected | StoreError::Io(_) => {
                ProvisionError::Unknown(error.to_string())
            }
        }
    }
}
