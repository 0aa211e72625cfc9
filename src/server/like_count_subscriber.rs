use crate::application_port::*;
use crate::domain_port::*;
use crate::logger::*;
use crate::server::LikeEventSubscriber;
use std::sync::Arc;

/// Keeps `Tweet::likes_count` in step with like records.
pub struct LikeCountSubscriber {
    tweet_repo: Arc<dyn TweetRepo>,
}

impl LikeCountSubscriber {
    pub fn new(tweet_repo: Arc<dyn TweetRepo>) -> Self {
        Self { tweet_repo }
    }
}

#[async_trait::async_trait]
impl LikeEventSubscriber for LikeCountSubscriber {
    fn name(&self) -> &'static str {
        "like-count"
    }

    async fn on_event(&self, event: &LikeEvent) -> anyhow::Result<()> {
        let change = match event {
            LikeEvent::Liked { .. } => LikeChange::Increment,
            LikeEvent::Unliked { .. } => LikeChange::Decrement,
        };
        let tweet_id = event.tweet_id();

        match self.tweet_repo.apply_like_change(tweet_id, change).await? {
            Some(tweet) => trace!(%tweet_id, likes = tweet.likes_count, "like count updated"),
            None => debug!(%tweet_id, "like event for unknown tweet ignored"),
        }
        Ok(())
    }
}
