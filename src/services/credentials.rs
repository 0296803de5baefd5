use crate::models::AccountKind;
use argon2::{
    password_hash::{rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use chrono::Utc;
use jsonwebtoken::{decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from password hashing and session tokens
#[derive(Debug, Error)]
pub enum CredentialError {
    #[error("Password hashing failed: {0}")]
    Hashing(String),

    #[error("Token encoding failed: {0}")]
    Encoding(String),

    #[error("Token expired")]
    Expired,

    #[error("Invalid token: {0}")]
    InvalidToken(String),
}

/// Session token claims
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Claims {
    pub sub: i64,
    pub email: String,
    pub kind: AccountKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<i64>,
    pub iat: i64,
    pub exp: i64,
}

/// Password hashing (argon2) and HS256 session tokens
#[derive(Clone)]
pub struct CredentialService {
    secret: String,
    ttl_secs: i64,
}

impl CredentialService {
    pub fn new(secret: String, ttl_secs: i64) -> Self {
        Self { secret, ttl_secs }
    }

    pub fn hash_password(&self, password: &str) -> Result<String, CredentialError> {
        let salt = SaltString::generate(&mut OsRng);
        Argon2::default()
            .hash_password(password.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| CredentialError::Hashing(e.to_string()))
    }

    /// A malformed stored hash counts as a mismatch
    pub fn verify_password(&self, password: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => Argon2::default()
                .verify_password(password.as_bytes(), &parsed)
                .is_ok(),
            Err(e) => {
                tracing::warn!("Stored password hash is unreadable: {}", e);
                false
            }
        }
    }

    pub fn issue_token(
        &self,
        account_id: i64,
        email: &str,
        kind: AccountKind,
        company_id: Option<i64>,
    ) -> Result<String, CredentialError> {
        let now = Utc::now().timestamp();
        let claims = Claims {
            sub: account_id,
            email: email.to_string(),
            kind,
            company_id,
            iat: now,
            exp: now + self.ttl_secs,
        };

        encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| CredentialError::Encoding(e.to_string()))
    }

    pub fn validate_token(&self, token: &str) -> Result<Claims, CredentialError> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        decode::<Claims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map(|data| data.claims)
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => CredentialError::Expired,
            _ => CredentialError::InvalidToken(e.to_string()),
        })
    }
}
