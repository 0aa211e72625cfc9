use crate::application_port::*;
use crate::domain_port::*;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

pub struct MemoryRefreshTokenRepo {
    tokens: DashMap<String, RefreshTokenRecord>,
}

impl MemoryRefreshTokenRepo {
    pub fn new() -> Self {
        Self {
            tokens: DashMap::new(),
        }
    }
}

impl Default for MemoryRefreshTokenRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl RefreshTokenRepo for MemoryRefreshTokenRepo {
    async fn save(&self, record: RefreshTokenRecord) -> Result<(), AuthError> {
        self.tokens.insert(record.token_hash.clone(), record);
        Ok(())
    }

    async fn find_by_hash(
        &self,
        token_hash: &str,
    ) -> Result<Option<RefreshTokenRecord>, AuthError> {
        Ok(self.tokens.get(token_hash).map(|r| r.value().clone()))
    }

    async fn revoke(&self, token_hash: &str, at: DateTime<Utc>) -> Result<bool, AuthError> {
        let Some(mut record) = self.tokens.get_mut(token_hash) else {
            return Ok(false);
        };
        if record.revoked_at.is_some() {
            return Ok(false);
        }
        record.revoked_at = Some(at);
        Ok(true)
    }

    async fn delete_revoked_expired(&self, now: DateTime<Utc>) -> Result<usize, AuthError> {
        let mut removed = 0;
        self.tokens.retain(|_, record| {
            let keep = record.revoked_at.is_none() || record.expires_at > now;
            if !keep {
                removed += 1;
            }
            keep
        });
        Ok(removed)
    }
}
