use crate::domain_model::{TweetId, UserId};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum LikeError {
    #[error("the tweet has already been liked by this user")]
    AlreadyExists,
    #[error("store error: {0}")]
    Store(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LikeEvent {
    Liked { tweet_id: TweetId, user_id: UserId },
    Unliked { tweet_id: TweetId, user_id: UserId },
}

impl LikeEvent {
    pub fn tweet_id(&self) -> TweetId {
        match self {
            LikeEvent::Liked { tweet_id, .. } | LikeEvent::Unliked { tweet_id, .. } => *tweet_id,
        }
    }

    pub fn user_id(&self) -> UserId {
        match self {
            LikeEvent::Liked { user_id, .. } | LikeEvent::Unliked { user_id, .. } => *user_id,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ToggleLikeResult {
    pub liked: bool,
}

/// Receives domain events synchronously, after the like record has changed.
#[async_trait::async_trait]
pub trait LikeEventSink: Send + Sync {
    async fn dispatch(&self, event: LikeEvent);
}

#[async_trait::async_trait]
pub trait LikeService: Send + Sync {
    async fn toggle(&self, tweet_id: TweetId, user_id: UserId)
    -> Result<ToggleLikeResult, LikeError>;
}
