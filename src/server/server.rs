use crate::application_impl::*;
use crate::application_port::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra_memory::*;
use crate::logger::*;
use crate::server::*;
use crate::settings::Settings;
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

pub struct Server {
    pub auth_service: Arc<dyn AuthService>,
    pub like_service: Arc<dyn LikeService>,
    pub hub: Arc<BroadcastHub>,
    pub tweet_repo: Arc<dyn TweetRepo>,
    pub dev_login: bool,
    sweeper_handle: Mutex<Option<JoinHandle<()>>>,
    cancel: CancellationToken,
}

impl Server {
    pub async fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let key = settings.auth.signing_key.clone().into_bytes();
        if key.is_empty() {
            return Err(anyhow::anyhow!("auth.signing_key must not be empty"));
        }
        let token_codec: Arc<dyn TokenCodec> = Arc::new(JwtHs256Codec::new(JwtConfig {
            access_ttl: Duration::from_secs(settings.auth.access_ttl_secs),
            signing_key: key,
        }));

        let refresh_repo: Arc<dyn RefreshTokenRepo> = Arc::new(MemoryRefreshTokenRepo::new());
        let like_repo: Arc<dyn LikeRepo> = Arc::new(MemoryLikeRepo::new());
        let tweet_repo: Arc<dyn TweetRepo> = Arc::new(MemoryTweetRepo::new());
        for tweet_id in &settings.feed.seed_tweets {
            tweet_repo.insert(Tweet::new(*tweet_id)).await?;
        }

        let auth_service: Arc<dyn AuthService> = Arc::new(RealAuthService::new(
            token_codec,
            refresh_repo,
            RefreshTokenHasher::new(settings.auth.refresh_hash_secret.clone().into_bytes()),
            Duration::from_secs(settings.auth.refresh_ttl_secs),
        ));

        // region runtime infra
        let cancel = CancellationToken::new();

        let hub = Arc::new(BroadcastHub::new(cancel.child_token()));
        let publisher: Arc<dyn HubPublisher> = hub.clone();

        let count_subscriber: Arc<dyn LikeEventSubscriber> =
            Arc::new(LikeCountSubscriber::new(tweet_repo.clone()));
        let broadcast_subscriber: Arc<dyn LikeEventSubscriber> =
            Arc::new(LikeBroadcastSubscriber::new(
                tweet_repo.clone(),
                publisher,
                &settings.http.public_origin,
            ));
        let dispatcher: Arc<dyn LikeEventSink> = Arc::new(LikeEventDispatcher::new(vec![
            count_subscriber,
            broadcast_subscriber,
        ]));
        let like_service: Arc<dyn LikeService> =
            Arc::new(RealLikeService::new(like_repo, dispatcher));

        let sweeper = TokenSweeper::new(
            auth_service.clone(),
            Duration::from_secs(settings.auth.sweep_interval_secs.max(1)),
            cancel.clone(),
        );
        let sweeper_handle = tokio::spawn(async move {
            let _ = sweeper.run().await;
        });

        // endregion

        info!(
            seeded = settings.feed.seed_tweets.len(),
            topic = %likes_topic(&settings.http.public_origin),
            "server started"
        );

        Ok(Self {
            auth_service,
            like_service,
            hub,
            tweet_repo,
            dev_login: settings.auth.dev_login,
            sweeper_handle: Mutex::new(Some(sweeper_handle)),
            cancel,
        })
    }

    /// Ends open hub streams so that a graceful HTTP shutdown can complete.
    pub fn close_streams(&self) {
        self.cancel.cancel();
    }

    pub async fn shutdown(&self) {
        info!("server shutting down...");

        self.cancel.cancel();

        let handle = match self.sweeper_handle.lock() {
            Ok(mut lock) => lock.take(),
            Err(_) => None,
        };
        if let Some(handle) = handle {
            let r = handle.await;
            info!("sweeper handle dropped: {:?}", r);
        }
    }
}
