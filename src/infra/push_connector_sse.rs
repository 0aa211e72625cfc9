use crate::domain_port::*;
use crate::infra::SseDecoder;
use crate::logger::*;
use anyhow::anyhow;
use futures_util::StreamExt;
use futures_util::stream::BoxStream;
use reqwest::Client;
use std::collections::VecDeque;
use std::time::Duration;

const CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

/// Subscribes to a hub topic over server-sent events.
pub struct SsePushConnector {
    client: Client,
    hub_url: String,
}

impl SsePushConnector {
    pub fn try_new(hub_url: String) -> anyhow::Result<Self> {
        // No overall timeout: the stream is meant to stay open.
        let client = Client::builder()
            .connect_timeout(CONNECT_TIMEOUT)
            .build()
            .map_err(|e| anyhow!(e))?;
        Ok(Self { client, hub_url })
    }
}

#[async_trait::async_trait]
impl PushConnector for SsePushConnector {
    async fn connect(&self, topic: &str) -> anyhow::Result<Box<dyn PushReceiver>> {
        let response = self
            .client
            .get(&self.hub_url)
            .query(&[("topic", topic)])
            .header("Accept", "text/event-stream")
            .send()
            .await?
            .error_for_status()?;
        debug!(hub = %self.hub_url, topic, "push stream connected");

        let stream = response
            .bytes_stream()
            .map(|chunk| chunk.map(|bytes| bytes.to_vec()))
            .boxed();

        Ok(Box::new(SseReceiver {
            stream,
            decoder: SseDecoder::new(),
            pending: VecDeque::new(),
        }))
    }
}

pub struct SseReceiver {
    stream: BoxStream<'static, reqwest::Result<Vec<u8>>>,
    decoder: SseDecoder,
    pending: VecDeque<String>,
}

#[async_trait::async_trait]
impl PushReceiver for SseReceiver {
    async fn next(&mut self) -> Option<anyhow::Result<String>> {
        loop {
            if let Some(data) = self.pending.pop_front() {
                return Some(Ok(data));
            }
            match self.stream.next().await? {
                Ok(chunk) => self.pending.extend(self.decoder.push(&chunk)),
                Err(e) => return Some(Err(anyhow!(e))),
            }
        }
    }
}
