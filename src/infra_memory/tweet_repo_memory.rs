use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;

pub struct MemoryTweetRepo {
    tweets: DashMap<TweetId, Tweet>,
}

impl MemoryTweetRepo {
    pub fn new() -> Self {
        Self {
            tweets: DashMap::new(),
        }
    }
}

impl Default for MemoryTweetRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl TweetRepo for MemoryTweetRepo {
    async fn find(&self, tweet_id: TweetId) -> Result<Option<Tweet>, LikeError> {
        Ok(self.tweets.get(&tweet_id).map(|tweet| tweet.value().clone()))
    }

    async fn insert(&self, tweet: Tweet) -> Result<(), LikeError> {
        self.tweets.insert(tweet.id, tweet);
        Ok(())
    }

    async fn apply_like_change(
        &self,
        tweet_id: TweetId,
        change: LikeChange,
    ) -> Result<Option<Tweet>, LikeError> {
        let Some(mut tweet) = self.tweets.get_mut(&tweet_id) else {
            return Ok(None);
        };
        match change {
            LikeChange::Increment => tweet.like(),
            LikeChange::Decrement => tweet.unlike(),
        }
        Ok(Some(tweet.clone()))
    }
}
