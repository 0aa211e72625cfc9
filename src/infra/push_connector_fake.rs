use crate::domain_port::*;
use anyhow::anyhow;
use std::collections::VecDeque;
use std::sync::{Mutex, PoisonError};
use tokio::sync::mpsc::{UnboundedSender, unbounded_channel};
use tokio::time::Instant;

type PushSender = UnboundedSender<anyhow::Result<String>>;

enum Script {
    Refuse,
    Accept(Box<dyn PushReceiver>),
}

/// Connection attempts are answered from a script. Once the script runs out
/// an attempt never completes.
#[derive(Default)]
pub struct FakePushConnector {
    script: Mutex<VecDeque<Script>>,
    attempts: Mutex<Vec<Instant>>,
    topics: Mutex<Vec<String>>,
}

impl FakePushConnector {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refuse(&self) {
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Script::Refuse);
    }

    /// Scripts a successful connection; messages sent on the returned sender
    /// arrive on it, and dropping the sender closes the stream.
    pub fn accept(&self) -> PushSender {
        let (tx, rx) = unbounded_channel();
        self.script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push_back(Script::Accept(Box::new(rx)));
        tx
    }

    pub fn attempts(&self) -> Vec<Instant> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn topics(&self) -> Vec<String> {
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }
}

#[async_trait::async_trait]
impl PushConnector for FakePushConnector {
    async fn connect(&self, topic: &str) -> anyhow::Result<Box<dyn PushReceiver>> {
        self.attempts
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(Instant::now());
        self.topics
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(topic.to_owned());

        let next = self
            .script
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .pop_front();
        match next {
            Some(Script::Refuse) => Err(anyhow!("connection refused")),
            Some(Script::Accept(receiver)) => Ok(receiver),
            None => std::future::pending().await,
        }
    }
}
