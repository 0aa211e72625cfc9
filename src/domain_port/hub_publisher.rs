#[derive(Debug, thiserror::Error)]
pub enum HubError {
    #[error("hub is closed")]
    Closed,
    #[error("hub unavailable: {0}")]
    Unavailable(String),
}

#[async_trait::async_trait]
pub trait HubPublisher: Send + Sync {
    async fn publish(&self, topic: &str, data: &str) -> Result<(), HubError>;
}
