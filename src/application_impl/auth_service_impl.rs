use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::{DateTime, Utc};
use hmac::{Hmac, KeyInit, Mac};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode};
use nanoid::nanoid;
use sha2::Sha256;
use std::sync::Arc;
use std::time::Duration;

// region codec

#[derive(Debug, Clone)]
pub struct JwtConfig {
    pub access_ttl: Duration,
    pub signing_key: Vec<u8>,
}

pub struct JwtHs256Codec {
    cfg: JwtConfig,
}

impl JwtHs256Codec {
    pub fn new(cfg: JwtConfig) -> Self {
        JwtHs256Codec { cfg }
    }

    #[inline]
    fn gen_jti() -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

#[async_trait::async_trait]
impl TokenCodec for JwtHs256Codec {
    async fn issue_access_token(
        &self,
        user: UserId,
    ) -> Result<(AccessToken, DateTime<Utc>), AuthError> {
        let iat_dt = Utc::now();
        let exp_dt = iat_dt + self.cfg.access_ttl;
        let claims = AccessClaims {
            sub: user.to_string(),
            id: user,
            exp: exp_dt.timestamp(),
            iat: iat_dt.timestamp(),
            jti: Self::gen_jti(),
        };
        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(&self.cfg.signing_key),
        )
        .map_err(|e| AuthError::InternalError(e.to_string()))?;
        Ok((AccessToken(token), exp_dt))
    }

    async fn verify_access_token(&self, token: &AccessToken) -> Result<UserId, AuthError> {
        let mut v = Validation::new(Algorithm::HS256);
        v.validate_exp = true;
        v.leeway = 0;
        let data = decode::<AccessClaims>(
            &token.0,
            &DecodingKey::from_secret(&self.cfg.signing_key),
            &v,
        )
        .map_err(|e| match e.kind() {
            ErrorKind::ExpiredSignature => AuthError::TokenExpired,
            _ => AuthError::TokenInvalid,
        })?;
        Ok(data.claims.id)
    }
}

// endregion

// region refresh token hashing

/// Keyed hash of an opaque refresh token, so a leaked store cannot be replayed.
pub struct RefreshTokenHasher {
    secret: Vec<u8>,
}

impl RefreshTokenHasher {
    pub fn new(secret: Vec<u8>) -> Self {
        Self { secret }
    }

    pub fn hash(&self, token: &str) -> Result<String, AuthError> {
        let mut mac = Hmac::<Sha256>::new_from_slice(&self.secret)
            .map_err(|e| AuthError::InternalError(e.to_string()))?;
        mac.update(token.as_bytes());
        Ok(hex::encode(mac.finalize().into_bytes()))
    }
}

// endregion

pub struct RealAuthService {
    token_codec: Arc<dyn TokenCodec>,
    refresh_repo: Arc<dyn RefreshTokenRepo>,
    hasher: RefreshTokenHasher,
    refresh_ttl: Duration,
}

impl RealAuthService {
    pub fn new(
        token_codec: Arc<dyn TokenCodec>,
        refresh_repo: Arc<dyn RefreshTokenRepo>,
        hasher: RefreshTokenHasher,
        refresh_ttl: Duration,
    ) -> Self {
        Self {
            token_codec,
            refresh_repo,
            hasher,
            refresh_ttl,
        }
    }

    #[inline]
    fn new_refresh_token() -> String {
        nanoid!(64)
    }
}

#[async_trait::async_trait]
impl AuthService for RealAuthService {
    async fn issue_tokens(&self, user: UserId) -> Result<AuthTokens, AuthError> {
        let (access_token, access_exp) = self.token_codec.issue_access_token(user).await?;

        let refresh_token = Self::new_refresh_token();
        let refresh_exp = Utc::now() + self.refresh_ttl;
        self.refresh_repo
            .save(RefreshTokenRecord {
                token_hash: self.hasher.hash(&refresh_token)?,
                user_id: user,
                expires_at: refresh_exp,
                revoked_at: None,
            })
            .await?;

        Ok(AuthTokens {
            access_token,
            refresh_token: RefreshToken(refresh_token),
            access_token_expires_at: access_exp,
            refresh_token_expires_at: refresh_exp,
        })
    }

    async fn verify_token(&self, token: &str) -> Result<UserId, AuthError> {
        self.token_codec
            .verify_access_token(&AccessToken(token.to_string()))
            .await
    }

    async fn refresh_token(&self, refresh_token: &str) -> Result<AuthTokens, AuthError> {
        let now = Utc::now();
        let token_hash = self.hasher.hash(refresh_token)?;

        let record = self
            .refresh_repo
            .find_by_hash(&token_hash)
            .await?
            .ok_or(AuthError::TokenInvalid)?;
        if !record.is_active(now) {
            return Err(AuthError::TokenInvalid);
        }

        // Rotation: whoever revokes first wins, a concurrent replay loses.
        if !self.refresh_repo.revoke(&token_hash, now).await? {
            return Err(AuthError::TokenInvalid);
        }

        self.issue_tokens(record.user_id).await
    }

    async fn revoke_token(&self, refresh_token: &str) -> Result<(), AuthError> {
        let token_hash = self.hasher.hash(refresh_token)?;
        if !self.refresh_repo.revoke(&token_hash, Utc::now()).await? {
            debug!("revoke requested for an unknown or already revoked refresh token");
        }
        Ok(())
    }

    async fn purge_expired_tokens(&self, now: DateTime<Utc>) -> Result<usize, AuthError> {
        self.refresh_repo.delete_revoked_expired(now).await
    }
}
