use crate::application_port::*;
use crate::domain_model::*;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeChange {
    Increment,
    Decrement,
}

#[async_trait::async_trait]
pub trait TweetRepo: Send + Sync {
    async fn find(&self, tweet_id: TweetId) -> Result<Option<Tweet>, LikeError>;

    async fn insert(&self, tweet: Tweet) -> Result<(), LikeError>;

    /// Applies `change` atomically. `None` when the tweet does not exist.
    async fn apply_like_change(
        &self,
        tweet_id: TweetId,
        change: LikeChange,
    ) -> Result<Option<Tweet>, LikeError>;
}
