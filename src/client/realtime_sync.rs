use crate::client::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BackoffPolicy {
    pub base: Duration,
    pub max: Duration,
}

impl BackoffPolicy {
    /// `min(base * 2^attempt, max)`, saturating at `max` on overflow.
    pub fn delay(&self, attempt: u32) -> Duration {
        2u32.checked_pow(attempt)
            .and_then(|factor| self.base.checked_mul(factor))
            .map_or(self.max, |delay| delay.min(self.max))
    }
}

impl Default for BackoffPolicy {
    fn default() -> Self {
        Self {
            base: Duration::from_millis(1000),
            max: Duration::from_millis(30_000),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PushOutcome {
    /// Number of renderings whose count changed.
    Applied(usize),
    /// Echo of this client's own toggle.
    Suppressed,
    Malformed,
}

/// State shared with the reconnect task.
struct SyncInner {
    topic: String,
    connector: Arc<dyn PushConnector>,
    board: Arc<LikeBoard>,
    recent: Arc<RecentActions>,
    vault: Arc<TokenVault>,
    backoff: BackoffPolicy,
    status: watch::Sender<ConnectionStatus>,
}

impl SyncInner {
    fn set_status(&self, state: ConnectionState, attempt: u32) {
        self.status.send_replace(ConnectionStatus { state, attempt });
    }

    fn handle_message(&self, data: &str) -> PushOutcome {
        let update: LikeCountUpdate = match serde_json::from_str(data) {
            Ok(update) => update,
            Err(e) => {
                warn!(error = %e, "ignoring malformed like update");
                return PushOutcome::Malformed;
            }
        };

        // Only our own echo: another user's like on the same tweet still applies.
        if self.recent.is_recent(update.tweet_id)
            && self.vault.user_id() == Some(update.triggered_by)
        {
            trace!(tweet_id = %update.tweet_id, "suppressing echo of own like");
            return PushOutcome::Suppressed;
        }

        let changed = self.board.apply_count(update.tweet_id, update.likes_count);
        debug!(
            tweet_id = %update.tweet_id,
            likes_count = update.likes_count,
            changed,
            "like count updated"
        );
        PushOutcome::Applied(changed)
    }

    async fn run(self: Arc<Self>, cancel: CancellationToken) {
        let mut attempt: u32 = 0;

        loop {
            self.set_status(ConnectionState::Connecting, attempt);

            let connected = tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                r = self.connector.connect(&self.topic) => r,
            };

            match connected {
                Ok(mut receiver) => {
                    attempt = 0;
                    self.set_status(ConnectionState::Open, attempt);
                    info!(topic = %self.topic, "push stream open");

                    loop {
                        let next = tokio::select! {
                            biased;
                            _ = cancel.cancelled() => {
                                self.set_status(ConnectionState::Closed, attempt);
                                return;
                            }
                            next = receiver.next() => next,
                        };
                        match next {
                            Some(Ok(data)) => {
                                self.handle_message(&data);
                            }
                            Some(Err(e)) => {
                                warn!(error = %e, "push stream failed");
                                break;
                            }
                            None => {
                                info!("push stream closed by server");
                                break;
                            }
                        }
                    }
                }
                Err(e) => warn!(attempt, error = %e, "push stream connection failed"),
            }

            let delay = self.backoff.delay(attempt);
            self.set_status(ConnectionState::Reconnecting, attempt);
            debug!(attempt, delay_ms = delay.as_millis() as u64, "reconnecting push stream");

            tokio::select! {
                biased;
                _ = cancel.cancelled() => break,
                _ = tokio::time::sleep(delay) => {}
            }
            attempt = attempt.saturating_add(1);
        }

        self.set_status(ConnectionState::Closed, attempt);
    }
}

/// Long-lived subscription to like-count updates. Reconnects forever until
/// `disconnect` or `shutdown`.
pub struct RealtimeSync {
    inner: Arc<SyncInner>,
    task: Mutex<Option<(CancellationToken, JoinHandle<()>)>>,
    cancel: CancellationToken,
}

impl RealtimeSync {
    pub fn new(
        topic: String,
        connector: Arc<dyn PushConnector>,
        board: Arc<LikeBoard>,
        recent: Arc<RecentActions>,
        vault: Arc<TokenVault>,
        backoff: BackoffPolicy,
    ) -> Self {
        let (status, _) = watch::channel(ConnectionStatus::default());
        Self {
            inner: Arc::new(SyncInner {
                topic,
                connector,
                board,
                recent,
                vault,
                backoff,
                status,
            }),
            task: Mutex::new(None),
            cancel: CancellationToken::new(),
        }
    }

    pub fn topic(&self) -> &str {
        &self.inner.topic
    }

    pub fn status(&self) -> ConnectionStatus {
        *self.inner.status.borrow()
    }

    pub fn watch_status(&self) -> watch::Receiver<ConnectionStatus> {
        self.inner.status.subscribe()
    }

    /// Starts a new connection loop, stopping the previous one first.
    pub fn connect(&self) {
        let mut slot = self.task.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((cancel, handle)) = slot.take() {
            cancel.cancel();
            handle.abort();
        }

        let cancel = self.cancel.child_token();
        let handle = tokio::spawn(self.inner.clone().run(cancel.clone()));
        *slot = Some((cancel, handle));
    }

    pub fn disconnect(&self) {
        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((cancel, handle)) = previous {
            cancel.cancel();
            handle.abort();
            self.inner.set_status(ConnectionState::Closed, 0);
            info!(topic = %self.inner.topic, "push stream disconnected");
        }
    }

    pub fn handle_message(&self, data: &str) -> PushOutcome {
        self.inner.handle_message(data)
    }

    pub async fn shutdown(&self) {
        self.cancel.cancel();

        let previous = self
            .task
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .take();
        if let Some((_, handle)) = previous {
            let r = handle.await;
            debug!("realtime task finished: {:?}", r);
        }
        self.inner.set_status(ConnectionState::Closed, 0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::test_support::*;
    use crate::infra::{FakePushConnector, MemoryTokenStore};

    struct Harness {
        sync: RealtimeSync,
        connector: Arc<FakePushConnector>,
        board: Arc<LikeBoard>,
        recent: Arc<RecentActions>,
        vault: Arc<TokenVault>,
    }

    fn harness() -> Harness {
        let connector = Arc::new(FakePushConnector::new());
        let board = Arc::new(LikeBoard::new());
        let recent = Arc::new(RecentActions::default());
        let vault = Arc::new(TokenVault::new(Arc::new(MemoryTokenStore::new())));
        let sync = RealtimeSync::new(
            "http://localhost/tweets/likes".to_string(),
            connector.clone(),
            board.clone(),
            recent.clone(),
            vault.clone(),
            BackoffPolicy::default(),
        );
        Harness {
            sync,
            connector,
            board,
            recent,
            vault,
        }
    }

    fn update(tweet: TweetId, count: u64, by: UserId) -> String {
        serde_json::to_string(&LikeCountUpdate {
            tweet_id: tweet,
            likes_count: count,
            triggered_by: by,
        })
        .unwrap()
    }

    fn gaps_ms(attempts: &[tokio::time::Instant]) -> Vec<u128> {
        attempts
            .windows(2)
            .map(|w| w[1].duration_since(w[0]).as_millis())
            .collect()
    }

    #[test]
    fn backoff_doubles_up_to_the_cap() {
        let policy = BackoffPolicy::default();
        let delays: Vec<u128> = (0..8).map(|a| policy.delay(a).as_millis()).collect();
        assert_eq!(
            delays,
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000, 30000]
        );
        assert_eq!(policy.delay(u32::MAX), Duration::from_millis(30_000));
    }

    #[test]
    fn own_echo_is_suppressed() {
        let h = harness();
        let user = UserId(uuid::Uuid::new_v4());
        h.vault.set_access_token(&access_token_for(user, 3600)).unwrap();
        let tweet = TweetId(uuid::Uuid::new_v4());
        let button = h.board.render(LikeButtonState::new(tweet, true, 5));
        h.recent.mark(tweet);

        assert_eq!(h.sync.handle_message(&update(tweet, 6, user)), PushOutcome::Suppressed);
        assert_eq!(h.board.get(button).unwrap().count, 5);
    }

    #[test]
    fn other_users_update_is_never_suppressed() {
        let h = harness();
        let me = UserId(uuid::Uuid::new_v4());
        h.vault.set_access_token(&access_token_for(me, 3600)).unwrap();
        let tweet = TweetId(uuid::Uuid::new_v4());
        let a = h.board.render(LikeButtonState::new(tweet, true, 5));
        let b = h.board.render(LikeButtonState::new(tweet, true, 5));
        h.recent.mark(tweet);

        let outcome = h.sync.handle_message(&update(tweet, 6, UserId(uuid::Uuid::new_v4())));

        assert_eq!(outcome, PushOutcome::Applied(2));
        assert_eq!(h.board.get(a).unwrap().count, 6);
        assert_eq!(h.board.get(b).unwrap().count, 6);
    }

    #[test]
    fn own_update_without_marker_applies() {
        let h = harness();
        let me = UserId(uuid::Uuid::new_v4());
        h.vault.set_access_token(&access_token_for(me, 3600)).unwrap();
        let tweet = TweetId(uuid::Uuid::new_v4());
        h.board.render(LikeButtonState::new(tweet, false, 0));

        assert_eq!(h.sync.handle_message(&update(tweet, 1, me)), PushOutcome::Applied(1));
        // idempotent
        assert_eq!(h.sync.handle_message(&update(tweet, 1, me)), PushOutcome::Applied(0));
    }

    #[test]
    fn malformed_message_is_ignored() {
        let h = harness();
        assert_eq!(h.sync.handle_message("{not json"), PushOutcome::Malformed);
        assert_eq!(
            h.sync.handle_message(r#"{"tweetId":"x","likesCount":-1}"#),
            PushOutcome::Malformed
        );
    }

    #[tokio::test(start_paused = true)]
    async fn reconnect_delays_follow_the_backoff() {
        let h = harness();
        for _ in 0..8 {
            h.connector.refuse();
        }

        h.sync.connect();
        tokio::time::sleep(Duration::from_secs(200)).await;

        let attempts = h.connector.attempts();
        assert_eq!(attempts.len(), 9);
        assert_eq!(
            gaps_ms(&attempts[..8]),
            vec![1000, 2000, 4000, 8000, 16000, 30000, 30000]
        );
        assert_eq!(h.sync.status().state, ConnectionState::Connecting);
        h.sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn successful_open_resets_the_attempt_counter() {
        let h = harness();
        h.connector.refuse();
        h.connector.refuse();
        drop(h.connector.accept());
        h.connector.refuse();

        h.sync.connect();
        tokio::time::sleep(Duration::from_secs(60)).await;

        let attempts = h.connector.attempts();
        assert_eq!(gaps_ms(&attempts[..4]), vec![1000, 2000, 1000]);
        h.sync.shutdown().await;
        assert_eq!(h.sync.status().state, ConnectionState::Closed);
    }

    #[tokio::test(start_paused = true)]
    async fn messages_reach_the_board_while_open() {
        let h = harness();
        let tweet = TweetId(uuid::Uuid::new_v4());
        let button = h.board.render(LikeButtonState::new(tweet, false, 0));
        let sender = h.connector.accept();

        h.sync.connect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert_eq!(
            h.sync.status(),
            ConnectionStatus {
                state: ConnectionState::Open,
                attempt: 0
            }
        );

        sender
            .send(Ok(update(tweet, 3, UserId(uuid::Uuid::new_v4()))))
            .unwrap();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert_eq!(h.board.get(button).unwrap().count, 3);
        assert_eq!(h.connector.topics(), vec![h.sync.topic().to_string()]);
        h.sync.shutdown().await;
    }

    #[tokio::test(start_paused = true)]
    async fn connect_supersedes_the_previous_loop() {
        let h = harness();
        let first = h.connector.accept();
        let second = h.connector.accept();

        h.sync.connect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        h.sync.connect();
        tokio::time::sleep(Duration::from_millis(10)).await;

        assert!(first.is_closed());
        assert!(!second.is_closed());
        assert_eq!(h.connector.attempts().len(), 2);

        h.sync.disconnect();
        tokio::time::sleep(Duration::from_millis(10)).await;
        assert!(second.is_closed());
        assert_eq!(h.sync.status().state, ConnectionState::Closed);

        // Nothing reconnects after a disconnect.
        tokio::time::sleep(Duration::from_secs(120)).await;
        assert_eq!(h.connector.attempts().len(), 2);
    }
}
