use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::ErrorKind,
};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::instrument;

use crate::domain::entities::identity::VerifiedIdentity;

/// HS256 keys shorter than the hash output are rejected.
pub const MIN_SECRET_LEN: usize = 32;

/// Longest accepted session lifetime.
pub const MAX_TTL: Duration = Duration::days(365);

#[derive(Error, Debug)]
pub enum IssueError {
    #[error("Signing key is not configured")]
    SigningKeyUnavailable,

    #[error("Signing key must be at least 32 bytes")]
    WeakSigningKey,

    #[error("Token TTL must be positive and at most 365 days")]
    InvalidTtl,

    #[error("Token signing failed")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionClaims {
    pub iss: String,
    pub sub: String,
    pub iat: i64,
    pub exp: i64,
    pub first_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,
    pub auth_date: i64,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionToken {
    pub token: String,
    pub expires_at: OffsetDateTime,
}

/// Signs session tokens for verified identities.
///
/// Tokens are HS256 JWTs without a nonce, so issuing twice for the same
/// identity at the same instant yields the same token.
pub struct TokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    ttl: Duration,
}

impl TokenIssuer {
    pub fn new(secret: &SecretString, issuer: String, ttl: Duration) -> Result<Self, IssueError> {
        let secret = secret.expose_secret().as_bytes();
        if secret.is_empty() {
            return Err(IssueError::SigningKeyUnavailable);
        }
        if secret.len() < MIN_SECRET_LEN {
            return Err(IssueError::WeakSigningKey);
        }
        if !ttl.is_positive() || ttl > MAX_TTL {
            return Err(IssueError::InvalidTtl);
        }

        Ok(Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            issuer,
            ttl,
        })
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    #[instrument(skip_all, fields(user_id = identity.user_id()))]
    pub fn issue(
        &self,
        identity: &VerifiedIdentity,
        now: OffsetDateTime,
    ) -> Result<SessionToken, IssueError> {
        let expires_at = now.checked_add(self.ttl).ok_or(IssueError::InvalidTtl)?;
        let claims = SessionClaims {
            iss: self.issuer.clone(),
            sub: identity.user_id().to_string(),
            iat: now.unix_timestamp(),
            exp: expires_at.unix_timestamp(),
            first_name: identity.first_name().to_owned(),
            last_name: identity.last_name().map(str::to_owned),
            username: identity.username().map(str::to_owned),
            auth_date: identity.auth_date().unix_timestamp(),
        };

        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(IssueError::Signing)?;

        Ok(SessionToken { token, expires_at })
    }

    /// Verifies a token issued by this issuer. Expiry is checked against `now`
    /// instead of the wall clock.
    pub fn decode(
        &self,
        token: &str,
        now: OffsetDateTime,
    ) -> Result<SessionClaims, jsonwebtoken::errors::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_issuer(&[&self.issuer]);
        validation.validate_exp = false;
        validation.leeway = 0;

        let claims = decode::<SessionClaims>(token, &self.decoding_key, &validation)?.claims;
        if claims.exp <= now.unix_timestamp() {
            return Err(ErrorKind::ExpiredSignature.into());
        }
        Ok(claims)
    }
}
