use crate::domain_port::*;
use crate::logger::*;
use futures_util::Stream;
use futures_util::stream;
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;
use tokio_util::sync::CancellationToken;

const HUB_CAPACITY: usize = 1024;

#[derive(Debug, Clone)]
pub struct HubMessage {
    pub topic: String,
    pub data: String,
}

/// In-process push hub. Every subscriber sees every message on its topic
/// published after it subscribed.
pub struct BroadcastHub {
    sender: broadcast::Sender<HubMessage>,
    cancellation_token: CancellationToken,
}

impl BroadcastHub {
    pub fn new(cancellation_token: CancellationToken) -> Self {
        let (sender, _) = broadcast::channel(HUB_CAPACITY);
        Self {
            sender,
            cancellation_token,
        }
    }

    pub fn subscriber_count(&self) -> usize {
        self.sender.receiver_count()
    }

    /// Message payloads for `topic`. Ends when the hub is cancelled.
    pub fn subscribe(
        &self,
        topic: String,
    ) -> impl Stream<Item = String> + Send + 'static + use<> {
        let receiver = self.sender.subscribe();
        let cancel = self.cancellation_token.clone();

        stream::unfold(
            (receiver, topic, cancel),
            |(mut receiver, topic, cancel)| async move {
                loop {
                    let received = tokio::select! {
                        biased;
                        _ = cancel.cancelled() => return None,
                        received = receiver.recv() => received,
                    };
                    match received {
                        Ok(message) if message.topic == topic => {
                            return Some((message.data, (receiver, topic, cancel)));
                        }
                        Ok(_) => continue,
                        Err(RecvError::Lagged(skipped)) => {
                            warn!(skipped, %topic, "hub subscriber lagged");
                        }
                        Err(RecvError::Closed) => return None,
                    }
                }
            },
        )
    }
}

#[async_trait::async_trait]
impl HubPublisher for BroadcastHub {
    async fn publish(&self, topic: &str, data: &str) -> Result<(), HubError> {
        if self.cancellation_token.is_cancelled() {
            return Err(HubError::Closed);
        }
        let message = HubMessage {
            topic: topic.to_owned(),
            data: data.to_owned(),
        };
        match self.sender.send(message) {
            Ok(subscribers) => debug!(%topic, subscribers, "hub message published"),
            // Nobody listening is not a failure.
            Err(_) => trace!(%topic, "hub message published without subscribers"),
        }
        Ok(())
    }
}
