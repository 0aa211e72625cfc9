use crate::domain_model::UserId;
use chrono::{DateTime, Utc};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("token invalid")]
    TokenInvalid,
    #[error("token expired")]
    TokenExpired,
    #[error("store error: {0}")]
    Store(String),
    #[error("internal error: {0}")]
    InternalError(String),
}

#[derive(Debug, Clone, Serialize)]
pub struct AccessToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct RefreshToken(pub String);

#[derive(Debug, Clone, Serialize)]
pub struct AuthTokens {
    pub access_token: AccessToken,
    pub refresh_token: RefreshToken,
    pub access_token_expires_at: DateTime<Utc>,
    pub refresh_token_expires_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait TokenCodec: Send + Sync {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError>;
    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError>;
}

#[async_trait::async_trait]
pub trait AuthService: Send + Sync {
    /// Opens a new session for `user`. Login itself lives outside this crate.
    async fn issue_tokens(&self, user: UserId) -> Result<AuthTokens, AuthError>;
    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError>;
    /// Exchanges a refresh token for a new pair. The presented token is revoked.
    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError>;
    /// Unknown tokens are not an error.
    async fn revoke_token(&self, refresh_token: &str) -> Result<(), AuthError>;
    /// Deletes refresh tokens that are both revoked and expired. Returns how many went.
    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, AuthError>;
}
