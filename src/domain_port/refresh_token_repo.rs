use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

/// A refresh token at rest. Only the keyed hash is stored, never the token.
#[derive(Debug, Clone)]
pub struct RefreshTokenRecord {
    pub token_hash: String,
    pub user_id: UserId,
    pub expires_at: DateTime<Utc>,
    pub revoked_at: Option<DateTime<Utc>>,
}

impl RefreshTokenRecord {
    pub fn is_active(&self, now: DateTime<Utc>) -> bool {
        self.revoked_at.is_none() && self.expires_at > now
    }
}

#[async_trait::async_trait]
pub trait RefreshTokenRepo: Send + Sync {
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), AuthError>;

    async fn find_by_hash(&self, token_hash: &str)
    -> Result<Option<RefreshTokenRecord>, AuthError>;

    /// Marks the token revoked. Returns `false` if it was unknown or already revoked.
    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, AuthError>;

    async fn delete_revoked_expired(&self, now: DateTime<Utc>) -> Result<usize, AuthError>;
}
