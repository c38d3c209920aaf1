//! Verification of Telegram login payloads (Mini App `initData` and the
//! Login Widget data-check-string).
//!
//! The provider signs `hex(HMAC-SHA256(secret_key, data_check_string))` where
//! `secret_key = HMAC-SHA256("WebAppData", bot_token)` and the data-check-string
//! is every field except `hash`, sorted by key, joined as `key=value` lines.

use std::collections::BTreeMap;
use std::fmt;

use hmac::{Hmac, Mac};
use secrecy::{ExposeSecret, SecretBox, SecretString};
use serde::Deserialize;
use sha2::Sha256;
use thiserror::Error;
use time::{Duration, OffsetDateTime};
use tracing::{debug, instrument};

use crate::domain::entities::identity::{IdentityParts, VerifiedIdentity};

type HmacSha256 = Hmac<Sha256>;

const WEB_APP_DATA: &[u8] = b"WebAppData";
const HASH_FIELD: &str = "hash";

pub const DEFAULT_MAX_AGE: Duration = Duration::hours(24);
pub const DEFAULT_CLOCK_SKEW: Duration = Duration::seconds(60);

/// Verification failures. Messages never carry the provided hash, the
/// data-check-string or key material.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum VerifyError {
    #[error("Signature mismatch")]
    SignatureMismatch,

    #[error("Malformed payload: {0}")]
    Malformed(&'static str),

    #[error("Payload is outside the freshness window")]
    Stale,
}

impl VerifyError {
    pub fn kind(&self) -> &'static str {
        match self {
            VerifyError::SignatureMismatch => "signature_mismatch",
            VerifyError::Malformed(_) => "malformed",
            VerifyError::Stale => "stale",
        }
    }
}

/// Key derived from the bot token, used to check payload signatures.
pub struct BotSecretKey(SecretBox<[u8; 32]>);

impl BotSecretKey {
    pub fn derive(bot_token: &SecretString) -> Self {
        let mut mac =
            HmacSha256::new_from_slice(WEB_APP_DATA).expect("HMAC accepts any key length");
        mac.update(bot_token.expose_secret().as_bytes());

        let mut bytes = [0u8; 32];
        bytes.copy_from_slice(&mac.finalize().into_bytes());
        Self(SecretBox::new(Box::new(bytes)))
    }

    fn mac(&self) -> HmacSha256 {
        HmacSha256::new_from_slice(self.0.expose_secret()).expect("HMAC accepts any key length")
    }

    /// Produces the hash the provider would attach to `data_check_string`.
    #[cfg(test)]
    pub(crate) fn sign(&self, data_check_string: &str) -> String {
        let mut mac = self.mac();
        mac.update(data_check_string.as_bytes());
        hex::encode(mac.finalize().into_bytes())
    }
}

impl fmt::Debug for BotSecretKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("BotSecretKey([REDACTED])")
    }
}

/// Replay protection for provider timestamps.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyPolicy {
    /// Oldest accepted `auth_date`, relative to now.
    pub max_age: Duration,
    /// How far in the future `auth_date` may be.
    pub clock_skew: Duration,
}

impl Default for VerifyPolicy {
    fn default() -> Self {
        Self {
            max_age: DEFAULT_MAX_AGE,
            clock_skew: DEFAULT_CLOCK_SKEW,
        }
    }
}

/// Raw provider fields plus the separately delivered hash.
#[derive(Clone, PartialEq, Eq)]
pub struct AuthPayload {
    fields: BTreeMap<String, String>,
    hash: String,
}

impl AuthPayload {
    /// Builds a payload from already-split fields. A `hash` entry among
    /// `fields` is dropped.
    pub fn new<I, K, V>(fields: I, hash: impl Into<String>) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<String>,
    {
        let mut fields: BTreeMap<String, String> = fields
            .into_iter()
            .map(|(k, v)| (k.into(), v.into()))
            .collect();
        fields.remove(HASH_FIELD);
        Self {
            fields,
            hash: hash.into(),
        }
    }

    /// Parses a newline separated `key=value` list, in any order.
    pub fn from_data_check_string(
        data_check_string: &str,
        hash: impl Into<String>,
    ) -> Result<Self, VerifyError> {
        if data_check_string.is_empty() {
            return Err(VerifyError::Malformed("empty data check string"));
        }

        let mut fields = BTreeMap::new();
        for line in data_check_string.split('\n') {
            let (key, value) = line
                .split_once('=')
                .ok_or(VerifyError::Malformed("field without '='"))?;
            insert_field(&mut fields, key, value)?;
        }
        fields.remove(HASH_FIELD);

        Ok(Self {
            fields,
            hash: hash.into(),
        })
    }

    /// Parses the URL-encoded `initData` string handed to a Mini App.
    pub fn from_init_data(init_data: &str) -> Result<Self, VerifyError> {
        let mut fields = BTreeMap::new();
        let mut hash = None;

        for (key, value) in url::form_urlencoded::parse(init_data.as_bytes()) {
            if key == HASH_FIELD {
                if hash.replace(value.into_owned()).is_some() {
                    return Err(VerifyError::Malformed("duplicate field"));
                }
                continue;
            }
            insert_field(&mut fields, &key, &value)?;
        }

        let hash = hash.ok_or(VerifyError::Malformed("missing hash"))?;
        Ok(Self { fields, hash })
    }

    /// The provider's canonical serialization of every field except `hash`.
    pub fn data_check_string(&self) -> String {
        self.fields
            .iter()
            .map(|(key, value)| format!("{key}={value}"))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn field(&self, key: &str) -> Option<&str> {
        self.fields.get(key).map(String::as_str)
    }
}

impl fmt::Debug for AuthPayload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AuthPayload")
            .field("fields", &self.fields.keys().collect::<Vec<_>>())
            .field("hash", &"[REDACTED]")
            .finish()
    }
}

fn insert_field(
    fields: &mut BTreeMap<String, String>,
    key: &str,
    value: &str,
) -> Result<(), VerifyError> {
    if key.is_empty() {
        return Err(VerifyError::Malformed("empty field name"));
    }
    if fields.insert(key.to_owned(), value.to_owned()).is_some() {
        return Err(VerifyError::Malformed("duplicate field"));
    }
    Ok(())
}

/// Checks the payload signature and freshness and extracts the user.
///
/// The signature is checked before any field is interpreted, so nothing
/// unauthenticated reaches the JSON decoder.
#[instrument(skip_all)]
pub fn verify(
    payload: &AuthPayload,
    key: &BotSecretKey,
    policy: &VerifyPolicy,
    now: OffsetDateTime,
) -> Result<VerifiedIdentity, VerifyError> {
    let provided =
        hex::decode(&payload.hash).map_err(|_| VerifyError::Malformed("hash is not hex"))?;

    let mut mac = key.mac();
    mac.update(payload.data_check_string().as_bytes());
    // verify_slice compares in constant time.
    mac.verify_slice(&provided)
        .map_err(|_| VerifyError::SignatureMismatch)?;

    let auth_date = parse_auth_date(payload)?;
    check_freshness(auth_date, policy, now)?;

    let parts = identity_parts(payload)?;
    debug!(user_id = parts.user_id, "login payload verified");

    Ok(VerifiedIdentity::from_verified(parts, auth_date))
}

fn parse_auth_date(payload: &AuthPayload) -> Result<OffsetDateTime, VerifyError> {
    let raw = payload
        .field("auth_date")
        .ok_or(VerifyError::Malformed("missing auth_date"))?;
    let secs: i64 = raw
        .parse()
        .map_err(|_| VerifyError::Malformed("auth_date is not an integer"))?;
    OffsetDateTime::from_unix_timestamp(secs)
        .map_err(|_| VerifyError::Malformed("auth_date out of range"))
}

fn check_freshness(
    auth_date: OffsetDateTime,
    policy: &VerifyPolicy,
    now: OffsetDateTime,
) -> Result<(), VerifyError> {
    let age = now - auth_date;
    if age > policy.max_age || -age > policy.clock_skew {
        return Err(VerifyError::Stale);
    }
    Ok(())
}

/// The `user` field of Mini App `initData`.
#[derive(Deserialize)]
struct WebAppUser {
    id: i64,
    first_name: String,
    last_name: Option<String>,
    username: Option<String>,
    language_code: Option<String>,
    is_premium: Option<bool>,
    photo_url: Option<String>,
}

fn identity_parts(payload: &AuthPayload) -> Result<IdentityParts, VerifyError> {
    let owned = |key: &str| payload.field(key).map(str::to_owned);

    let mut parts = match payload.field("user") {
        Some(raw) => {
            let user: WebAppUser = serde_json::from_str(raw)
                .map_err(|_| VerifyError::Malformed("user is not a valid user object"))?;
            IdentityParts {
                user_id: user.id,
                first_name: user.first_name,
                last_name: user.last_name,
                username: user.username,
                language_code: user.language_code,
                is_premium: user.is_premium,
                photo_url: user.photo_url,
                ..Default::default()
            }
        }
        // Login Widget payloads carry the user as top-level fields.
        None => IdentityParts {
            user_id: payload
                .field("id")
                .ok_or(VerifyError::Malformed("missing id"))?
                .parse()
                .map_err(|_| VerifyError::Malformed("id is not an integer"))?,
            first_name: owned("first_name").ok_or(VerifyError::Malformed("missing first_name"))?,
            last_name: owned("last_name"),
            username: owned("username"),
            photo_url: owned("photo_url"),
            ..Default::default()
        },
    };

    parts.query_id = owned("query_id");
    parts.start_param = owned("start_param");
    Ok(parts)
}
