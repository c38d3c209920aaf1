use std::sync::Arc;

use time::OffsetDateTime;
use tracing::{error, info, instrument, warn};

use crate::{
    app_error::AppResult,
    application::{
        jwt::{SessionToken, TokenIssuer},
        telegram::{self, AuthPayload, BotSecretKey, VerifyPolicy},
    },
};

/// Exchanges a provider-signed login payload for a session token.
#[derive(Clone)]
pub struct TelegramAuthUseCases {
    key: Arc<BotSecretKey>,
    policy: VerifyPolicy,
    issuer: Arc<TokenIssuer>,
}

impl TelegramAuthUseCases {
    pub fn new(key: Arc<BotSecretKey>, policy: VerifyPolicy, issuer: Arc<TokenIssuer>) -> Self {
        Self {
            key,
            policy,
            issuer,
        }
    }

    #[instrument(skip_all)]
    pub fn exchange(&self, payload: &AuthPayload, now: OffsetDateTime) -> AppResult<SessionToken> {
        let identity = telegram::verify(payload, &self.key, &self.policy, now)
            .inspect_err(|e| warn!(reason = e.kind(), "login payload rejected"))?;

        let session = self.issuer.issue(&identity, now).inspect_err(|e| {
            error!(error = %e, user_id = identity.user_id(), "session token issuance failed")
        })?;

        info!(user_id = identity.user_id(), expires_at = %session.expires_at, "session token issued");
        Ok(session)
    }
}
