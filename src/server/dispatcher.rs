use crate::application_port::*;
use crate::logger::*;
use crate::server::LikeEventSubscriber;
use std::sync::Arc;

/// Runs every subscriber in priority order, inline with the write that raised the event.
pub struct LikeEventDispatcher {
    subscribers: Vec<Arc<dyn LikeEventSubscriber>>,
}

impl LikeEventDispatcher {
    pub fn new(mut subscribers: Vec<Arc<dyn LikeEventSubscriber>>) -> Self {
        subscribers.sort_by_key(|s| std::cmp::Reverse(s.priority()));
        Self { subscribers }
    }
}

#[async_trait::async_trait]
impl LikeEventSink for LikeEventDispatcher {
    async fn dispatch(&self, event: LikeEvent) {
        for subscriber in &self.subscribers {
            if let Err(e) = subscriber.on_event(&event).await {
                error!(
                    subscriber = subscriber.name(),
                    tweet_id = %event.tweet_id(),
                    "like event subscriber failed: {e:#}"
                );
            }
        }
    }
}
