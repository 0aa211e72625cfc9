#[async_trait::async_trait]
pub trait PushReceiver: Send {
    /// Next message payload. `None` means the server closed the stream.
    async fn next(&mut self) -> Option<anyhow::Result<String>>;
}

#[async_trait::async_trait]
impl PushReceiver for tokio::sync::mpsc::UnboundedReceiver<anyhow::Result<String>> {
    async fn next(&mut self) -> Option<anyhow::Result<String>> {
        self.recv().await
    }
}

#[async_trait::async_trait]
pub trait PushConnector: Send + Sync {
    async fn connect(&self, topic: &str) -> anyhow::Result<Box<dyn PushReceiver>>;
}
