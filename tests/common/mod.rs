//! Shared setup: a real server on a free local port and clients pointed at it.

use chirp::api;
use chirp::client::ClientContext;
use chirp::domain_model::{TweetId, UserId};
use chirp::server::Server;
use chirp::settings::Settings;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use warp::Filter;

pub struct TestServer {
    pub server: Arc<Server>,
    pub settings: Settings,
    pub tweet: TweetId,
    stop: Option<oneshot::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

fn free_port() -> u16 {
    let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
    listener.local_addr().unwrap().port()
}

impl TestServer {
    pub async fn start() -> Self {
        let port = free_port();
        let origin = format!("http://127.0.0.1:{port}");
        let tweet = TweetId(uuid::Uuid::new_v4());

        let mut settings = Settings::default();
        settings.http.address = format!("127.0.0.1:{port}");
        settings.http.public_origin = origin.clone();
        settings.auth.dev_login = true;
        settings.feed.seed_tweets = vec![tweet];
        settings.client.base_url = origin;
        settings.client.store = "memory".to_string();

        let server = Arc::new(Server::try_new(&settings).await.unwrap());
        let routes = api::routes(server.clone()).recover(api::recover_error);

        let (stop, stopped) = oneshot::channel::<()>();
        let closing = server.clone();
        let (_, running) = warp::serve(routes)
            .try_bind_with_graceful_shutdown(
                settings.http.address.parse::<std::net::SocketAddr>().unwrap(),
                async move {
                    let _ = stopped.await;
                    closing.close_streams();
                },
            )
            .unwrap();
        let handle = tokio::spawn(running);

        Self {
            server,
            settings,
            tweet,
            stop: Some(stop),
            handle: Some(handle),
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.settings.client.base_url, path)
    }

    pub fn client(&self) -> ClientContext {
        ClientContext::try_new(&self.settings).unwrap()
    }

    pub async fn logged_in_client(&self) -> (ClientContext, UserId) {
        let client = self.client();
        let user = UserId(uuid::Uuid::new_v4());
        client.dev_login(user).await.unwrap();
        (client, user)
    }

    pub async fn stop(mut self) {
        if let Some(stop) = self.stop.take() {
            let _ = stop.send(());
        }
        if let Some(handle) = self.handle.take() {
            let _ = tokio::time::timeout(Duration::from_secs(5), handle).await;
        }
        self.server.shutdown().await;
    }
}

/// Polls `check` until it holds or five seconds pass.
pub async fn eventually(mut check: impl FnMut() -> bool) -> bool {
    let deadline = tokio::time::Instant::now() + Duration::from_secs(5);
    while tokio::time::Instant::now() < deadline {
        if check() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    check()
}
