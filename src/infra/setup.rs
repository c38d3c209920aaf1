use std::sync::Arc;

use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

use crate::{
    adapters::http::app_state::AppState,
    application::{
        jwt::TokenIssuer,
        telegram::{BotSecretKey, VerifyPolicy},
        use_cases::telegram_auth::TelegramAuthUseCases,
    },
    infra::{
        config::{AppConfig, LogFormat},
        error::InfraError,
    },
};

pub fn init_app_state() -> Result<AppState, InfraError> {
    let config = AppConfig::from_env()?;
    build_app_state(config)
}

pub fn build_app_state(config: AppConfig) -> Result<AppState, InfraError> {
    let key = Arc::new(BotSecretKey::derive(&config.telegram_bot_token));

    let issuer = TokenIssuer::new(
        &config.jwt_secret,
        config.jwt_issuer.clone(),
        config.access_token_ttl,
    )
    .map_err(InfraError::TokenIssuer)?;

    if !config.auth_max_age.is_positive() {
        return Err(InfraError::ConfigInvalid {
            var: "AUTH_MAX_AGE_SECS",
        });
    }
    if config.auth_clock_skew.is_negative() {
        return Err(InfraError::ConfigInvalid {
            var: "AUTH_CLOCK_SKEW_SECS",
        });
    }

    let policy = VerifyPolicy {
        max_age: config.auth_max_age,
        clock_skew: config.auth_clock_skew,
    };

    let telegram_auth_use_cases = TelegramAuthUseCases::new(key, policy, Arc::new(issuer));

    Ok(AppState {
        config: Arc::new(config),
        telegram_auth_use_cases: Arc::new(telegram_auth_use_cases),
    })
}

pub fn init_tracing(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "issue_token=info,tower_http=info".into());

    // Console (pretty logs) for local runs, JSON lines for log shippers.
    let (console_layer, json_layer) = match format {
        LogFormat::Pretty => (
            Some(fmt::layer().with_target(false).with_level(true).pretty()),
            None,
        ),
        LogFormat::Json => (
            None,
            Some(
                fmt::layer()
                    .json()
                    .with_current_span(true)
                    .with_span_list(true),
            ),
        ),
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(console_layer)
        .with(json_layer)
        .try_init()
        .ok();
}
