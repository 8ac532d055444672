//! Short-lived HS256 credentials for calls to the config gateway.

use std::sync::Arc;

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{Map, Value};

use crate::error::{Result, SyncError};

/// Key id the gateway uses to pick the admin secret.
pub const KEY_ID: &str = "sc-admin-kid";

/// Lifetime of every issued token.
pub const TOKEN_TTL_MINUTES: i64 = 10;

/// Issues signed tokens for the sync service's own identity.
///
/// The secret is read-only after construction; clones share it.
#[derive(Clone)]
pub struct CredentialProvider {
    secret: Arc<str>,
}

impl CredentialProvider {
    pub fn new(secret: impl Into<Arc<str>>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Claims the sync service presents to the gateway.
    pub fn service_claims() -> Map<String, Value> {
        let mut claims = Map::new();
        claims.insert("id".into(), Value::from("config-sync"));
        claims.insert("role".into(), Value::from("admin"));
        claims
    }

    /// Sign `claims` with a fixed expiry. Any `exp` in `claims` is replaced.
    pub fn issue(&self, claims: Map<String, Value>) -> Result<String> {
        if self.secret.is_empty() {
            return Err(SyncError::Signing("admin secret is empty".into()));
        }

        let mut claims = claims;
        let exp = Utc::now() + Duration::minutes(TOKEN_TTL_MINUTES);
        claims.insert("exp".into(), Value::from(exp.timestamp()));

        let mut header = Header::new(Algorithm::HS256);
        header.kid = Some(KEY_ID.to_string());

        encode(
            &header,
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SyncError::Signing(e.to_string()))
    }

    pub fn issue_service_token(&self) -> Result<String> {
        self.issue(Self::service_claims())
    }
}

impl std::fmt::Debug for CredentialProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialProvider")
            .field("secret", &"<redacted>")
            .finish()
    }
}
