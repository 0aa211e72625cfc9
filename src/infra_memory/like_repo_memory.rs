use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;

pub struct MemoryLikeRepo {
    likes: DashMap<(TweetId, UserId), LikeRecord>,
}

impl MemoryLikeRepo {
    pub fn new() -> Self {
        Self {
            likes: DashMap::new(),
        }
    }
}

impl Default for MemoryLikeRepo {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait::async_trait]
impl LikeRepo for MemoryLikeRepo {
    async fn find(
        &self,
        tweet_id: TweetId,
        user_id: UserId,
    ) -> Result<Option<LikeRecord>, LikeError> {
        Ok(self
            .likes
            .get(&(tweet_id, user_id))
            .map(|record| record.value().clone()))
    }

    async fn add(&self, record: LikeRecord) -> Result<(), LikeError> {
        match self.likes.entry((record.tweet_id, record.user_id)) {
            Entry::Occupied(_) => Err(LikeError::AlreadyExists),
            Entry::Vacant(slot) => {
                slot.insert(record);
                Ok(())
            }
        }
    }

    async fn remove(&self, tweet_id: TweetId, user_id: UserId) -> Result<bool, LikeError> {
        Ok(self.likes.remove(&(tweet_id, user_id)).is_some())
    }
}
