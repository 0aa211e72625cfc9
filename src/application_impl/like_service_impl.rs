use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use std::sync::Arc;

pub struct RealLikeService {
    like_repo: Arc<dyn LikeRepo>,
    events: Arc<dyn LikeEventSink>,
}

impl RealLikeService {
    pub fn new(like_repo: Arc<dyn LikeRepo>, events: Arc<dyn LikeEventSink>) -> Self {
        Self { like_repo, events }
    }
}

#[async_trait::async_trait]
impl LikeService for RealLikeService {
    async fn toggle(
        &self,
        tweet_id: TweetId,
        user_id: UserId,
    ) -> Result<ToggleLikeResult, LikeError> {
        if self.like_repo.find(tweet_id, user_id).await?.is_some() {
            if self.like_repo.remove(tweet_id, user_id).await? {
                self.events
                    .dispatch(LikeEvent::Unliked { tweet_id, user_id })
                    .await;
            } else {
                debug!(%tweet_id, %user_id, "like vanished before removal");
            }
            return Ok(ToggleLikeResult { liked: false });
        }

        // The unique (tweet, user) constraint is the only guard against a double submit.
        self.like_repo
            .add(LikeRecord {
                tweet_id,
                user_id,
                created_at: Utc::now(),
            })
            .await?;
        self.events
            .dispatch(LikeEvent::Liked { tweet_id, user_id })
            .await;

        Ok(ToggleLikeResult { liked: true })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryLikeRepo;
    use std::sync::Mutex;

    #[derive(Default)]
    struct RecordingSink {
        events: Mutex<Vec<LikeEvent>>,
    }

    #[async_trait::async_trait]
    impl LikeEventSink for RecordingSink {
        async fn dispatch(&self, event: LikeEvent) {
            self.events.lock().unwrap().push(event);
        }
    }

    fn ids() -> (TweetId, UserId) {
        (
            TweetId(uuid::Uuid::new_v4()),
            UserId(uuid::Uuid::new_v4()),
        )
    }

    #[tokio::test]
    async fn toggle_alternates_between_like_and_unlike() {
        let sink = Arc::new(RecordingSink::default());
        let service = RealLikeService::new(Arc::new(MemoryLikeRepo::new()), sink.clone());
        let (tweet_id, user_id) = ids();

        assert!(service.toggle(tweet_id, user_id).await.unwrap().liked);
        assert!(!service.toggle(tweet_id, user_id).await.unwrap().liked);
        assert!(service.toggle(tweet_id, user_id).await.unwrap().liked);

        let events = sink.events.lock().unwrap().clone();
        assert_eq!(
            events,
            vec![
                LikeEvent::Liked { tweet_id, user_id },
                LikeEvent::Unliked { tweet_id, user_id },
                LikeEvent::Liked { tweet_id, user_id },
            ]
        );
    }

    #[tokio::test]
    async fn duplicate_add_surfaces_conflict_without_event() {
        let sink = Arc::new(RecordingSink::default());
        let repo = Arc::new(MemoryLikeRepo::new());
        let (tweet_id, user_id) = ids();

        // Simulates a concurrent request that inserted between find and add.
        let racing = RacingLikeRepo {
            inner: repo.clone(),
        };
        let service = RealLikeService::new(Arc::new(racing), sink.clone());

        let result = service.toggle(tweet_id, user_id).await;
        assert!(matches!(result, Err(LikeError::AlreadyExists)));
        assert!(sink.events.lock().unwrap().is_empty());
    }

    struct RacingLikeRepo {
        inner: Arc<MemoryLikeRepo>,
    }

    #[async_trait::async_trait]
    impl LikeRepo for RacingLikeRepo {
        async fn find(
            &self,
            _tweet_id: TweetId,
            _user_id: UserId,
        ) -> Result<Option<LikeRecord>, LikeError> {
            Ok(None)
        }

        async fn add(&self, record: LikeRecord) -> Result<(), LikeError> {
            self.inner.add(record.clone()).await?;
            self.inner.add(record).await
        }

        async fn remove(&self, tweet_id: TweetId, user_id: UserId) -> Result<bool, LikeError> {
            self.inner.remove(tweet_id, user_id).await
        }
    }
}
