use crate::application_port::LikeEvent;

/// A listener on like events. Higher priority runs first.
#[async_trait::async_trait]
pub trait LikeEventSubscriber: Send + Sync {
    fn name(&self) -> &'static str;

    fn priority(&self) -> i32 {
        0
    }

    async fn on_event(&self, event: &LikeEvent) -> anyhow::Result<()>;
}
