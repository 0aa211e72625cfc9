use crate::client::*;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::infra::*;
use crate::logger::*;
use crate::settings::Settings;
use anyhow::anyhow;
use serde::Deserialize;
use std::sync::Arc;
use std::time::Duration;

pub const DEV_LOGIN_PATH: &str = "/api/token/dev";

/// The outside world as seen by a client.
pub struct ClientPorts {
    pub store: Arc<dyn TokenStore>,
    pub transport: Arc<dyn HttpTransport>,
    pub connector: Arc<dyn PushConnector>,
    pub navigator: Arc<dyn Navigator>,
}

#[derive(Debug, Deserialize)]
struct DevLoginResponse {
    token: String,
    refresh_token: String,
}

/// Everything one client instance shares: session, request client, on-screen
/// like buttons and the push subscription. Built once, torn down by `shutdown`.
pub struct ClientContext {
    pub vault: Arc<TokenVault>,
    pub session: Arc<SessionManager>,
    pub api: Arc<ApiClient>,
    pub board: Arc<LikeBoard>,
    pub recent: Arc<RecentActions>,
    pub toggle: LikeToggleController,
    pub realtime: RealtimeSync,
    pub navigator: Arc<dyn Navigator>,
}

impl ClientContext {
    pub fn new(settings: &Settings, ports: ClientPorts) -> Self {
        let client = &settings.client;
        let base_url = client.base_url.trim_end_matches('/').to_string();

        let vault = Arc::new(TokenVault::new(ports.store));
        let session = Arc::new(SessionManager::new(
            vault.clone(),
            ports.transport.clone(),
            format!("{base_url}{}", client.refresh_path),
            client.expiry_skew_secs,
        ));
        let api = Arc::new(ApiClient::new(
            ApiPaths {
                base_url: base_url.clone(),
                logout_path: client.logout_path.clone(),
                landing_path: client.landing_path.clone(),
                home_path: client.home_path.clone(),
            },
            session.clone(),
            vault.clone(),
            ports.transport,
            ports.navigator.clone(),
        ));

        let board = Arc::new(LikeBoard::new());
        let recent = Arc::new(RecentActions::new(Duration::from_millis(
            settings.realtime.echo_window_ms,
        )));
        let toggle = LikeToggleController::new(
            board.clone(),
            recent.clone(),
            api.clone(),
            session.clone(),
            vault.clone(),
            client.toggle_path.clone(),
        );
        let realtime = RealtimeSync::new(
            likes_topic(&base_url),
            ports.connector,
            board.clone(),
            recent.clone(),
            vault.clone(),
            BackoffPolicy {
                base: Duration::from_millis(settings.realtime.base_delay_ms),
                max: Duration::from_millis(settings.realtime.max_delay_ms),
            },
        );

        Self {
            vault,
            session,
            api,
            board,
            recent,
            toggle,
            realtime,
            navigator: ports.navigator,
        }
    }

    /// Builds a client on reqwest, SSE and the configured token store.
    pub fn try_new(settings: &Settings) -> anyhow::Result<Self> {
        let client = &settings.client;

        let store: Arc<dyn TokenStore> = match client.store.as_str() {
            "memory" => Arc::new(MemoryTokenStore::new()),
            "file" => Arc::new(FileTokenStore::open(&client.store_path)?),
            other => return Err(anyhow!("unknown client.store {other:?}")),
        };
        let transport: Arc<dyn HttpTransport> = Arc::new(ReqwestTransport::try_new(
            Duration::from_secs(client.request_timeout_secs),
        )?);
        let connector: Arc<dyn PushConnector> = Arc::new(SsePushConnector::try_new(format!(
            "{}{}",
            client.base_url.trim_end_matches('/'),
            settings.realtime.hub_path
        ))?);
        let navigator: Arc<dyn Navigator> = Arc::new(HeadlessNavigator::new(&client.home_path));

        Ok(Self::new(
            settings,
            ClientPorts {
                store,
                transport,
                connector,
                navigator,
            },
        ))
    }

    /// Opens a session through the development login endpoint.
    pub async fn dev_login(&self, user_id: UserId) -> Result<(), ApiError> {
        let request = HttpRequest::new(HttpMethod::Post, self.api.url(DEV_LOGIN_PATH))
            .with_json(&serde_json::json!({ "userId": user_id }))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;

        let response = self.api.request(request, true).await?;
        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }
        let tokens: DevLoginResponse =
            serde_json::from_str(&response.body).map_err(|_| ApiError::MalformedBody)?;

        if let Err(e) = self.vault.set_tokens(&tokens.token, &tokens.refresh_token) {
            error!(error = %e, "could not store session");
        }
        info!(user_id = %user_id, "logged in");
        Ok(())
    }

    pub async fn shutdown(&self) {
        info!("client shutting down...");
        self.realtime.shutdown().await;
    }
}
