use crate::client::TokenVault;
use crate::domain_model::*;
use crate::domain_port::*;
use crate::logger::*;
use chrono::Utc;
use futures_util::FutureExt;
use futures_util::future::{BoxFuture, Shared};
use serde::{Deserialize, Deserializer};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

type RefreshFuture = Shared<BoxFuture<'static, Option<String>>>;

pub const AUTH_TOKEN_INVALID: &str = "AUTH_TOKEN_INVALID";
pub const AUTH_UNAUTHORIZED: &str = "AUTH_UNAUTHORIZED";

// region refresh response

/// Three meaningful states of the rotated refresh token in a refresh response.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RotatedToken {
    /// Field missing: the deployment does not rotate, keep the current one.
    #[default]
    Absent,
    /// Field present but null or empty.
    Empty,
    Present(String),
}

impl<'de> Deserialize<'de> for RotatedToken {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        Ok(match Option::<String>::deserialize(deserializer)? {
            Some(token) if !token.is_empty() => RotatedToken::Present(token),
            _ => RotatedToken::Empty,
        })
    }
}

/// Refresh response in canonical form. Either key spelling is accepted, and a
/// body carrying both resolves to the snake-case one when it is non-empty.
#[derive(Debug, Clone, Deserialize)]
#[serde(from = "RawRefreshResponse")]
pub struct RefreshResponse {
    pub token: Option<String>,
    pub refresh_token: RotatedToken,
}

#[derive(Debug, Deserialize)]
struct RawRefreshResponse {
    #[serde(default)]
    token: Option<String>,
    #[serde(default, rename = "accessToken")]
    access_token: Option<String>,
    #[serde(default)]
    refresh_token: RotatedToken,
    #[serde(default, rename = "refreshToken")]
    refresh_token_camel: RotatedToken,
}

impl From<RawRefreshResponse> for RefreshResponse {
    fn from(raw: RawRefreshResponse) -> Self {
        let token = raw
            .token
            .filter(|token| !token.is_empty())
            .or(raw.access_token.filter(|token| !token.is_empty()));

        let refresh_token = match (raw.refresh_token, raw.refresh_token_camel) {
            (RotatedToken::Present(token), _) | (_, RotatedToken::Present(token)) => {
                RotatedToken::Present(token)
            }
            (RotatedToken::Empty, _) | (_, RotatedToken::Empty) => RotatedToken::Empty,
            (RotatedToken::Absent, RotatedToken::Absent) => RotatedToken::Absent,
        };

        Self {
            token,
            refresh_token,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct FailureBody {
    #[serde(default)]
    error: Option<FailureDetail>,
}

#[derive(Debug, Default, Deserialize)]
struct FailureDetail {
    #[serde(default)]
    code: Option<String>,
}

/// Whether a failed refresh proves the session is dead, as opposed to a blip.
pub fn is_token_invalid_failure(status: u16, code: Option<&str>) -> bool {
    matches!(code, Some(AUTH_TOKEN_INVALID) | Some(AUTH_UNAUTHORIZED))
        || status == 422
        || (status == 401 && code.is_none())
}

// endregion

/// Hands out usable access tokens and refreshes them at most once at a time.
pub struct SessionManager {
    vault: Arc<TokenVault>,
    transport: Arc<dyn HttpTransport>,
    refresh_url: String,
    expiry_skew_secs: i64,
    in_flight: Mutex<Option<(u64, RefreshFuture)>>,
    generation: AtomicU64,
}

impl SessionManager {
    pub fn new(
        vault: Arc<TokenVault>,
        transport: Arc<dyn HttpTransport>,
        refresh_url: String,
        expiry_skew_secs: i64,
    ) -> Self {
        Self {
            vault,
            transport,
            refresh_url,
            expiry_skew_secs,
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    pub fn refresh_url(&self) -> &str {
        &self.refresh_url
    }

    /// The stored access token if it stays valid for longer than the skew.
    pub fn usable_access_token(&self) -> Option<String> {
        let token = self.vault.access_token()?;
        let payload = TokenPayload::decode(&token)?;
        let now = Utc::now().timestamp();
        (payload.exp > now.saturating_add(self.expiry_skew_secs)).then_some(token)
    }

    pub async fn ensure_valid_token(self: &Arc<Self>) -> Option<String> {
        if let Some(token) = self.usable_access_token() {
            return Some(token);
        }

        if self.vault.refresh_token().is_none() {
            if self.vault.access_token().is_some() {
                debug!("access token unusable and no refresh token, clearing session");
                self.clear_tokens();
            }
            return None;
        }

        self.join_or_start_refresh().await
    }

    /// Check-then-set under one lock with no await in between.
    fn join_or_start_refresh(self: &Arc<Self>) -> RefreshFuture {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some((_, refresh)) = slot.as_ref() {
            trace!("joining in-flight token refresh");
            return refresh.clone();
        }

        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        let this = Arc::clone(self);
        let refresh = async move {
            let token = this.refresh_access_token().await;
            this.finish_refresh(generation);
            token
        }
        .boxed()
        .shared();

        *slot = Some((generation, refresh.clone()));
        refresh
    }

    fn finish_refresh(&self, generation: u64) {
        let mut slot = self.in_flight.lock().unwrap_or_else(PoisonError::into_inner);
        if slot.as_ref().is_some_and(|(current, _)| *current == generation) {
            *slot = None;
        }
    }

    /// Forgets any in-flight refresh so the next caller starts a new one.
    pub fn reset_in_flight(&self) {
        *self.in_flight.lock().unwrap_or_else(PoisonError::into_inner) = None;
    }

    pub async fn refresh_access_token(&self) -> Option<String> {
        let refresh_token = self.vault.refresh_token()?;

        let request = match HttpRequest::new(HttpMethod::Post, self.refresh_url.as_str())
            .with_json(&serde_json::json!({ "refresh_token": refresh_token }))
        {
            Ok(request) => request,
            Err(e) => {
                error!(error = %e, "could not encode refresh request");
                return None;
            }
        };

        let response = match self.transport.send(request).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "token refresh failed, keeping session for a later retry");
                return None;
            }
        };

        if !response.is_success() {
            let failure: FailureBody = serde_json::from_str(&response.body).unwrap_or_default();
            let code = failure.error.and_then(|detail| detail.code);
            if is_token_invalid_failure(response.status, code.as_deref()) {
                info!(status = response.status, ?code, "refresh token rejected, ending session");
                self.clear_tokens();
            } else {
                warn!(status = response.status, ?code, "token refresh failed, keeping session");
            }
            return None;
        }

        let parsed: RefreshResponse = match serde_json::from_str(&response.body) {
            Ok(parsed) => parsed,
            Err(e) => {
                warn!(error = %e, "unreadable refresh response, keeping session");
                return None;
            }
        };

        let Some(access_token) = parsed.token.filter(|token| !token.is_empty()) else {
            error!("refresh response carried no access token");
            return None;
        };

        if parsed.refresh_token == RotatedToken::Empty {
            error!("refresh response carried an empty refresh token, ending session");
            self.clear_tokens();
            return None;
        }

        if let Err(e) = self.vault.set_access_token(&access_token) {
            error!(error = %e, "could not store refreshed access token");
        }
        if let RotatedToken::Present(rotated) = &parsed.refresh_token {
            if let Err(e) = self.vault.set_refresh_token(rotated) {
                error!(error = %e, "could not store rotated refresh token");
            }
        }

        debug!("access token refreshed");
        Some(access_token)
    }

    pub fn clear_tokens(&self) {
        if let Err(e) = self.vault.clear() {
            error!(error = %e, "could not clear stored session");
        }
    }
}
