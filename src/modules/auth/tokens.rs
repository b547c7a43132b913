use chrono::{DateTime, Duration, TimeZone, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use sha2::Digest;

use super::store::{Account, Role};
use crate::modules::error::ProvisionError;

/// Claims carried by an issued token
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// A freshly signed, never persisted credential
#[derive(Debug, Clone)]
pub struct Credential {
    pub token: String,
    pub claims: Claims,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Credential {
    /// Short SHA-256 fingerprint so logs can refer to a token without leaking it
    pub fn fingerprint(&self) -> String {
        let digest = sha2::Sha256::digest(self.token.as_bytes());
        hex::encode(&digest[..8])
    }
}

/// Sign `{sub, role}` for the account, valid for `validity` from `now`
pub fn issue_credential(
    account: &Account,
    secret: &str,
    validity: Duration,
    now: DateTime<Utc>,
) -> Result<Credential, ProvisionError> {
    if secret.trim().is_empty() {
        return Err(ProvisionError::SigningFailure(
            "signing secret is missing or empty".to_string(),
        ));
    }

    // JWT timestamps have whole-second resolution
    let issued_at = Utc
        .timestamp_opt(now.timestamp(), 0)
        .single()
        .ok_or_else(|| ProvisionError::SigningFailure("invalid issue time".to_string()))?;
    let expires_at = issued_at
        .checked_add_signed(validity)
        .ok_or_else(|| ProvisionError::SigningFailure("token expiry overflows".to_string()))?;

    let claims = Claims {
        sub: account.id.clone(),
        role: account.role,
        iat: issued_at.timestamp(),
        exp: expires_at.timestamp(),
    };

    let token = encode(
        &Header::new(Algorithm::HS256),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
    .map_err(|e| ProvisionError::SigningFailure(e.to_string()))?;

    Ok(Credential {
        token,
        claims,
        issued_at,
        expires_at,
    })
}

/// Verify signature and expiry, returning the decoded claims
pub fn verify_token(token: &str, secret: &str) -> Result<Claims, ProvisionError> {
    if secret.trim().is_empty() {
        return Err(ProvisionError::InvalidToken(
            "signing secret is missing or empty".to_string(),
        ));
    }

    let mut validation = Validation::new(Algorithm::HS256);
    validation.leeway = 0;

    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &validation,
    )
    .map(|data| data.claims)
    .map_err(|e| ProvisionError::InvalidToken(e.to_string()))
}
