use std::net::SocketAddr;

use axum::http::HeaderValue;
use env_helpers::get_env_default;
use secrecy::SecretString;
use time::Duration;

use crate::infra::error::InfraError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Pretty,
    Json,
}

pub struct AppConfig {
    /// Bot token the login payloads are signed for. Only used to derive the
    /// verification key at startup.
    pub telegram_bot_token: SecretString,
    pub jwt_secret: SecretString,
    /// Value of the `iss` claim.
    pub jwt_issuer: String,
    pub access_token_ttl: Duration,
    /// Oldest `auth_date` accepted, relative to now.
    pub auth_max_age: Duration,
    pub auth_clock_skew: Duration,
    pub cors_origin: HeaderValue,
    pub bind_addr: SocketAddr,
}

impl AppConfig {
    pub fn from_env() -> Result<Self, InfraError> {
        let telegram_bot_token = required_secret("TELEGRAM_BOT_TOKEN")?;
        let jwt_secret = required_secret("JWT_SECRET")?;

        let jwt_issuer: String = get_env_default("JWT_ISSUER", "issue-token".to_string());
        let access_token_ttl_secs: i64 = get_env_default("ACCESS_TOKEN_TTL_SECS", 3_600);
        let auth_max_age_secs: i64 = get_env_default("AUTH_MAX_AGE_SECS", 86_400);
        let auth_clock_skew_secs: i64 = get_env_default("AUTH_CLOCK_SKEW_SECS", 60);

        let cors_origin: HeaderValue =
            get_env_default("CORS_ORIGIN", String::from("http://localhost:3000"))
                .parse()
                .map_err(|_| InfraError::ConfigInvalid { var: "CORS_ORIGIN" })?;

        let bind_addr: SocketAddr =
            get_env_default("BIND_ADDR", SocketAddr::from(([0, 0, 0, 0], 3000)));

        Ok(Self {
            telegram_bot_token,
            jwt_secret,
            jwt_issuer,
            access_token_ttl: Duration::seconds(access_token_ttl_secs),
            auth_max_age: Duration::seconds(auth_max_age_secs),
            auth_clock_skew: Duration::seconds(auth_clock_skew_secs),
            cors_origin,
            bind_addr,
        })
    }
}

impl LogFormat {
    pub fn from_env() -> Self {
        match std::env::var("LOG_FORMAT").as_deref() {
            Ok("json") => LogFormat::Json,
            _ => LogFormat::Pretty,
        }
    }
}

fn required_secret(var: &'static str) -> Result<SecretString, InfraError> {
    match std::env::var(var) {
        Ok(value) if !value.is_empty() => Ok(SecretString::new(value.into())),
        _ => Err(InfraError::ConfigMissing { var }),
    }
}
