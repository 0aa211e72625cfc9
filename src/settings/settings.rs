use crate::domain_model::TweetId;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File, FileFormat};
use serde::Deserialize;

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub auth: Auth,
    pub client: Client,
    pub feed: Feed,
    pub http: Http,
    pub log: Log,
    pub realtime: Realtime,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Auth {
    pub signing_key: String,
    pub refresh_hash_secret: String,
    pub access_ttl_secs: u64,
    pub refresh_ttl_secs: u64,
    pub sweep_interval_secs: u64,
    /// Exposes `POST /api/token/dev`, which opens a session for any user id.
    pub dev_login: bool,
}

impl Default for Auth {
    fn default() -> Self {
        Self {
            signing_key: "my-dev-secret-key".to_string(),
            refresh_hash_secret: "my-dev-refresh-secret".to_string(),
            access_ttl_secs: 15 * 60,
            refresh_ttl_secs: 30 * 24 * 60 * 60,
            sweep_interval_secs: 60 * 60,
            dev_login: false,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Client {
    pub base_url: String,
    pub refresh_path: String,
    pub logout_path: String,
    /// `{tweet_id}` is substituted.
    pub toggle_path: String,
    pub landing_path: String,
    pub home_path: String,
    pub request_timeout_secs: u64,
    pub expiry_skew_secs: i64,
    pub store: String, // "memory" or "file"
    pub store_path: String,
}

impl Default for Client {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8080".to_string(),
            refresh_path: "/api/token/refresh".to_string(),
            logout_path: "/api/tokens".to_string(),
            toggle_path: "/api/tweets/{tweet_id}/likes/toggle".to_string(),
            landing_path: "/registration".to_string(),
            home_path: "/".to_string(),
            request_timeout_secs: 10,
            expiry_skew_secs: 60,
            store: "memory".to_string(),
            store_path: "chirp-session.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Feed {
    pub seed_tweets: Vec<TweetId>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Http {
    pub address: String,
    /// Origin the like topic is derived from.
    pub public_origin: String,
    pub cert_path: Option<String>,
    pub key_path: Option<String>,
}

impl Default for Http {
    fn default() -> Self {
        Self {
            address: "127.0.0.1:8080".to_string(),
            public_origin: "http://127.0.0.1:8080".to_string(),
            cert_path: None,
            key_path: None,
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Log {
    pub filter: String,
}

impl Default for Log {
    fn default() -> Self {
        Self {
            filter: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Realtime {
    pub hub_path: String,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
    pub echo_window_ms: u64,
}

impl Default for Realtime {
    fn default() -> Self {
        Self {
            hub_path: "/.well-known/mercure".to_string(),
            base_delay_ms: 1000,
            max_delay_ms: 30_000,
            echo_window_ms: 2000,
        }
    }
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(Environment::with_prefix("CHIRP").separator("__"))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}

pub fn parse_settings_str(toml: &str) -> Result<Settings> {
    let settings: Settings = Config::builder()
        .add_source(File::from_str(toml, FileFormat::Toml))
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
