use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use crate::server::LikeEventSubscriber;
use std::sync::Arc;

pub const LIKE_BROADCAST_PRIORITY: i32 = -10;

/// Pushes the fresh counter to the hub after the count subscriber ran.
/// Publishing is best effort: a failing hub never fails the toggle.
pub struct LikeBroadcastSubscriber {
    tweet_repo: Arc<dyn TweetRepo>,
    publisher: Arc<dyn HubPublisher>,
    topic: String,
}

impl LikeBroadcastSubscriber {
    pub fn new(
        tweet_repo: Arc<dyn TweetRepo>,
        publisher: Arc<dyn HubPublisher>,
        public_origin: &str,
    ) -> Self {
        Self {
            tweet_repo,
            publisher,
            topic: likes_topic(public_origin),
        }
    }
}

#[async_trait::async_trait]
impl LikeEventSubscriber for LikeBroadcastSubscriber {
    fn name(&self) -> &'static str {
        "like-broadcast"
    }

    fn priority(&self) -> i32 {
        LIKE_BROADCAST_PRIORITY
    }

    async fn on_event(&self, event: &LikeEvent) -> anyhow::Result<()> {
        let tweet_id = event.tweet_id();
        let Some(tweet) = self.tweet_repo.find(tweet_id).await? else {
            return Ok(());
        };

        let update = LikeCountUpdate {
            tweet_id,
            likes_count: tweet.likes_count,
            triggered_by: event.user_id(),
        };
        let data = serde_json::to_string(&update)?;

        if let Err(e) = self.publisher.publish(&self.topic, &data).await {
            warn!(%tweet_id, error = %e, "failed to broadcast like update");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infra_memory::MemoryTweetRepo;
    use std::sync::Mutex;

    #[derive(Default)]
    struct CapturingHub {
        published: Mutex<Vec<(String, String)>>,
        fail: bool,
    }

    #[async_trait::async_trait]
    impl HubPublisher for CapturingHub {
        async fn publish(&self, topic: &str, data: &str) -> Result<(), HubError> {
            if self.fail {
                return Err(HubError::Unavailable("hub down".to_string()));
            }
            self.published
                .lock()
                .unwrap()
                .push((topic.to_string(), data.to_string()));
            Ok(())
        }
    }

    async fn seeded(likes: u64) -> (Arc<MemoryTweetRepo>, TweetId) {
        let repo = Arc::new(MemoryTweetRepo::new());
        let tweet_id = TweetId(uuid::Uuid::new_v4());
        repo.insert(Tweet {
            id: tweet_id,
            likes_count: likes,
        })
        .await
        .unwrap();
        (repo, tweet_id)
    }

    #[tokio::test]
    async fn publishes_current_count_on_normalized_topic() {
        let (repo, tweet_id) = seeded(7).await;
        let hub = Arc::new(CapturingHub::default());
        let subscriber =
            LikeBroadcastSubscriber::new(repo, hub.clone(), "https://chirp.example:443");
        let user_id = UserId(uuid::Uuid::new_v4());

        subscriber
            .on_event(&LikeEvent::Liked { tweet_id, user_id })
            .await
            .unwrap();

        let published = hub.published.lock().unwrap().clone();
        assert_eq!(published.len(), 1);
        assert_eq!(published[0].0, "https://chirp.example/tweets/likes");
        let update: LikeCountUpdate = serde_json::from_str(&published[0].1).unwrap();
        assert_eq!(
            update,
            LikeCountUpdate {
                tweet_id,
                likes_count: 7,
                triggered_by: user_id
            }
        );
    }

    #[tokio::test]
    async fn hub_failure_is_swallowed() {
        let (repo, tweet_id) = seeded(1).await;
        let hub = Arc::new(CapturingHub {
            fail: true,
            ..Default::default()
        });
        let subscriber = LikeBroadcastSubscriber::new(repo, hub, "http://localhost");

        let result = subscriber
            .on_event(&LikeEvent::Unliked {
                tweet_id,
                user_id: UserId(uuid::Uuid::new_v4()),
            })
            .await;

        assert!(result.is_ok());
    }

    #[tokio::test]
    async fn unknown_tweet_publishes_nothing() {
        let hub = Arc::new(CapturingHub::default());
        let subscriber =
            LikeBroadcastSubscriber::new(Arc::new(MemoryTweetRepo::new()), hub.clone(), "http://x");

        subscriber
            .on_event(&LikeEvent::Liked {
                tweet_id: TweetId(uuid::Uuid::new_v4()),
                user_id: UserId(uuid::Uuid::new_v4()),
            })
            .await
            .unwrap();

        assert!(hub.published.lock().unwrap().is_empty());
    }
}
