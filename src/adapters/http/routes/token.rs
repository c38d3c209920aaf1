//! Session token issuance for Telegram logins.

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    routing::post,
};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

use crate::{
    adapters::http::app_state::AppState,
    app_error::{AppError, AppResult},
    application::telegram::AuthPayload,
};

/// Either the raw Mini App `initData` string, or a pre-built
/// data-check-string with its hash.
#[derive(Deserialize)]
struct TokenRequest {
    init_data: Option<String>,
    hash: Option<String>,
    data_check_string: Option<String>,
}

#[derive(Serialize)]
struct TokenResponse {
    token: String,
    /// Unix seconds.
    expires_at: i64,
}

impl TokenRequest {
    fn into_payload(self) -> AppResult<AuthPayload> {
        let payload = match self {
            TokenRequest {
                init_data: Some(init_data),
                ..
            } => AuthPayload::from_init_data(&init_data)?,
            TokenRequest {
                hash: Some(hash),
                data_check_string: Some(data_check_string),
                ..
            } => AuthPayload::from_data_check_string(&data_check_string, hash)?,
            _ => {
                return Err(AppError::InvalidInput(
                    "Expected init_data, or hash with data_check_string".into(),
                ));
            }
        };
        Ok(payload)
    }
}

/// POST /api/token
/// Verifies a Telegram login payload and returns a signed session token.
async fn issue_token(
    State(app_state): State<AppState>,
    body: Result<Json<TokenRequest>, JsonRejection>,
) -> AppResult<Json<TokenResponse>> {
    let Json(request) = body.map_err(|_| AppError::InvalidInput("Invalid request format".into()))?;
    let payload = request.into_payload()?;

    let session = app_state
        .telegram_auth_use_cases
        .exchange(&payload, OffsetDateTime::now_utc())?;

    Ok(Json(TokenResponse {
        token: session.token,
        expires_at: session.expires_at.unix_timestamp(),
    }))
}

pub fn router() -> Router<AppState> {
    Router::new().route("/token", post(issue_token))
}
