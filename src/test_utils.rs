//! Fixtures shared by unit and HTTP tests.

use std::net::SocketAddr;

use axum::http::HeaderValue;
use secrecy::SecretString;
use time::{Duration, OffsetDateTime};

use crate::{
    adapters::http::app_state::AppState,
    application::{
        telegram::{self, AuthPayload, BotSecretKey, VerifyPolicy},
        use_cases::telegram_auth::TelegramAuthUseCases,
    },
    domain::entities::identity::VerifiedIdentity,
    infra::{config::AppConfig, setup::build_app_state},
};

pub const TEST_BOT_TOKEN: &str = "123456:TEST-bot-token";
pub const TEST_JWT_SECRET: &str = "test-jwt-secret-with-at-least-32-bytes";

pub fn test_config() -> AppConfig {
    AppConfig {
        telegram_bot_token: SecretString::new(TEST_BOT_TOKEN.into()),
        jwt_secret: SecretString::new(TEST_JWT_SECRET.into()),
        jwt_issuer: "issue-token".to_string(),
        access_token_ttl: Duration::hours(1),
        auth_max_age: Duration::hours(24),
        auth_clock_skew: Duration::seconds(60),
        cors_origin: HeaderValue::from_static("http://localhost:3000"),
        bind_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
    }
}

pub fn test_app_state() -> AppState {
    build_app_state(test_config()).unwrap()
}

pub fn test_auth_use_cases() -> TelegramAuthUseCases {
    test_app_state().telegram_auth_use_cases.as_ref().clone()
}

/// Returns the data-check-string for `fields` and the hash a bot with
/// `bot_token` would attach to it.
pub fn sign_fields(bot_token: &str, fields: &[(&str, String)]) -> (String, String) {
    let payload = AuthPayload::new(fields.iter().map(|(k, v)| (*k, v.as_str())), "");
    let data_check_string = payload.data_check_string();
    let key = BotSecretKey::derive(&SecretString::new(bot_token.into()));
    let hash = key.sign(&data_check_string);
    (data_check_string, hash)
}

/// A Login Widget payload signed for `bot_token`.
pub fn signed_widget_payload(
    bot_token: &str,
    user_id: i64,
    first_name: &str,
    auth_date: i64,
) -> AuthPayload {
    let fields = [
        ("id", user_id.to_string()),
        ("first_name", first_name.to_string()),
        ("auth_date", auth_date.to_string()),
    ];
    let (_, hash) = sign_fields(bot_token, &fields);
    AuthPayload::new(fields, hash)
}

/// An identity obtained the only way the crate allows: by verifying a signed
/// payload.
pub fn verified_identity(user_id: i64, first_name: &str) -> VerifiedIdentity {
    let auth_date = 1_700_000_000;
    let payload = signed_widget_payload(TEST_BOT_TOKEN, user_id, first_name, auth_date);
    let key = BotSecretKey::derive(&SecretString::new(TEST_BOT_TOKEN.into()));
    let now = OffsetDateTime::from_unix_timestamp(auth_date).unwrap();
    telegram::verify(&payload, &key, &VerifyPolicy::default(), now).unwrap()
}
