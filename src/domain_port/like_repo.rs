use crate::application_port::*;
use crate::domain_model::*;
use chrono::{DateTime, Utc};

#[derive(Debug, Clone)]
pub struct LikeRecord {
    pub tweet_id: TweetId,
    pub user_id: UserId,
    pub created_at: DateTime<Utc>,
}

#[async_trait::async_trait]
pub trait LikeRepo: Send + Sync {
    async fn find(&self, tweet_id: TweetId, user_id: UserId)
    -> Result<Option<LikeRecord>, LikeError>;

    /// Fails with `LikeError::AlreadyExists` when the (tweet, user) pair is taken.
    async fn add(&self, record: LikeRecord) -> Result<(), LikeError>;

    /// Returns whether a record was removed.
    async fn remove(&self, tweet_id: TweetId, user_id: UserId) -> Result<bool, LikeError>;
}
