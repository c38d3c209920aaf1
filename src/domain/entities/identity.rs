use time::OffsetDateTime;

/// A Telegram user whose login payload passed signature and freshness checks.
///
/// Only `application::telegram::verify` constructs this type; it has no public
/// constructor and no `Deserialize` impl.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VerifiedIdentity {
    user_id: i64,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
    is_premium: Option<bool>,
    photo_url: Option<String>,
    query_id: Option<String>,
    start_param: Option<String>,
    auth_date: OffsetDateTime,
}

/// Identity fields as read from a payload that has already been authenticated.
#[derive(Default)]
pub(crate) struct IdentityParts {
    pub user_id: i64,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
    pub language_code: Option<String>,
    pub is_premium: Option<bool>,
    pub photo_url: Option<String>,
    pub query_id: Option<String>,
    pub start_param: Option<String>,
}

impl VerifiedIdentity {
    pub(crate) fn from_verified(parts: IdentityParts, auth_date: OffsetDateTime) -> Self {
        Self {
            user_id: parts.user_id,
            first_name: parts.first_name,
            last_name: parts.last_name,
            username: parts.username,
            language_code: parts.language_code,
            is_premium: parts.is_premium,
            photo_url: parts.photo_url,
            query_id: parts.query_id,
            start_param: parts.start_param,
            auth_date,
        }
    }

    pub fn user_id(&self) -> i64 {
        self.user_id
    }

    pub fn first_name(&self) -> &str {
        &self.first_name
    }

    pub fn last_name(&self) -> Option<&str> {
        self.last_name.as_deref()
    }

    pub fn username(&self) -> Option<&str> {
        self.username.as_deref()
    }

    pub fn language_code(&self) -> Option<&str> {
        self.language_code.as_deref()
    }

    pub fn is_premium(&self) -> Option<bool> {
        self.is_premium
    }

    pub fn photo_url(&self) -> Option<&str> {
        self.photo_url.as_deref()
    }

    /// Mini App query id, present when the payload came from `initData`.
    pub fn query_id(&self) -> Option<&str> {
        self.query_id.as_deref()
    }

    pub fn start_param(&self) -> Option<&str> {
        self.start_param.as_deref()
    }

    /// Time the provider signed the payload.
    pub fn auth_date(&self) -> OffsetDateTime {
        self.auth_date
    }
}
