use crate::client::*;
use crate::domain_port::*;
use crate::logger::*;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

#[derive(Debug, Clone)]
pub struct ApiPaths {
    pub base_url: String,
    pub logout_path: String,
    /// Where a dead session is sent.
    pub landing_path: String,
    pub home_path: String,
}

/// Every HTTP call goes through here: bearer attachment, one forced refresh
/// and retry on 401, and the redirect when the session cannot be recovered.
pub struct ApiClient {
    paths: ApiPaths,
    session: Arc<SessionManager>,
    vault: Arc<TokenVault>,
    transport: Arc<dyn HttpTransport>,
    navigator: Arc<dyn Navigator>,
}

impl ApiClient {
    pub fn new(
        paths: ApiPaths,
        session: Arc<SessionManager>,
        vault: Arc<TokenVault>,
        transport: Arc<dyn HttpTransport>,
        navigator: Arc<dyn Navigator>,
    ) -> Self {
        Self {
            paths,
            session,
            vault,
            transport,
            navigator,
        }
    }

    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.paths.base_url.trim_end_matches('/'), path)
    }

    pub async fn request(
        &self,
        mut request: HttpRequest,
        skip_auth: bool,
    ) -> Result<HttpResponse, TransportError> {
        if !skip_auth {
            if let Some(token) = self.session.ensure_valid_token().await {
                request.set_bearer(&token);
            }
        }

        let response = self.transport.send(request.clone()).await?;

        if response.status != 401
            || skip_auth
            || request.url.starts_with(self.session.refresh_url())
            || self.vault.refresh_token().is_none()
        {
            return Ok(response);
        }

        debug!(url = %request.url, "request unauthorized, forcing a token refresh");
        // The rejected token may have looked valid locally, so start over.
        self.session.reset_in_flight();

        match self.session.refresh_access_token().await {
            Some(token) => {
                request.set_bearer(&token);
                self.transport.send(request).await
            }
            None => {
                if self.vault.refresh_token().is_some() {
                    self.session.clear_tokens();
                    self.redirect_to_landing();
                }
                Ok(response)
            }
        }
    }

    fn redirect_to_landing(&self) {
        let current = self.navigator.current_path();
        if current != self.paths.landing_path && current != self.paths.home_path {
            info!(from = %current, "session expired, redirecting");
            self.navigator.navigate(&self.paths.landing_path);
        }
    }

    async fn call<T: DeserializeOwned>(
        &self,
        method: HttpMethod,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        let mut request = HttpRequest::new(method, self.url(path));
        if let Some(body) = body {
            request = request
                .with_json(&body)
                .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        }

        let response = self.request(request, false).await?;
        if !response.is_success() {
            return Err(ApiError::from_response(response.status, &response.body));
        }
        Ok(decode_body(&response.body))
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<Option<T>, ApiError> {
        self.call(HttpMethod::Get, path, None).await
    }

    pub async fn post<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        self.call(HttpMethod::Post, path, body).await
    }

    pub async fn patch<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        self.call(HttpMethod::Patch, path, body).await
    }

    pub async fn delete<T: DeserializeOwned>(
        &self,
        path: &str,
        body: Option<Value>,
    ) -> Result<Option<T>, ApiError> {
        self.call(HttpMethod::Delete, path, body).await
    }

    /// Best-effort revoke, then forget the session locally whatever happened.
    pub async fn logout(&self) {
        if let Some(refresh_token) = self.vault.refresh_token() {
            match self.send_revoke(&refresh_token).await {
                Ok(response) if response.is_success() => debug!("refresh token revoked"),
                Ok(response) => warn!(status = response.status, "logout request rejected"),
                Err(e) => warn!(error = %e, "logout request failed"),
            }
        }

        self.session.clear_tokens();
        self.navigator.navigate(&self.paths.home_path);
    }

    async fn send_revoke(&self, refresh_token: &str) -> Result<HttpResponse, TransportError> {
        let mut request = HttpRequest::new(HttpMethod::Delete, self.url(&self.paths.logout_path))
            .with_json(&serde_json::json!({ "refreshToken": refresh_token }))
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        // The current token goes out as-is: no refresh or redirect while logging out.
        if let Some(access_token) = self.vault.access_token() {
            request.set_bearer(&access_token);
        }
        self.request(request, true).await
    }
}

/// Empty or non-JSON bodies decode to `None`.
fn decode_body<T: DeserializeOwned>(body: &str) -> Option<T> {
    if body.trim().is_empty() {
        return None;
    }
    serde_json::from_str(body)
        .map_err(|e| trace!(error = %e, "response body is not the expected JSON"))
        .ok()
}
