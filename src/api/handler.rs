use super::error::*;
use crate::application_port::*;
use crate::domain_model::{TweetId, UserId};
use crate::logger::*;
use crate::server::BroadcastHub;
use futures_util::StreamExt;
use serde::{Deserialize, Serialize};
use std::convert::Infallible;
use std::sync::Arc;
use std::time::Duration;
use warp::http::StatusCode;
use warp::{self, reject};

const SSE_KEEP_ALIVE: Duration = Duration::from_secs(15);

#[derive(Debug, Serialize)]
pub struct TokenPairResponse {
    pub token: String,
    pub refresh_token: String,
}

impl From<AuthTokens> for TokenPairResponse {
    fn from(tokens: AuthTokens) -> Self {
        Self {
            token: tokens.access_token.0,
            refresh_token: tokens.refresh_token.0,
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct RefreshRequest {
    pub refresh_token: String,
}

pub async fn refresh_token(
    body: RefreshRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .refresh_token(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&TokenPairResponse::from(tokens)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RevokeRequest {
    pub refresh_token: String,
}

pub async fn revoke_token(
    body: RevokeRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    auth_service
        .revoke_token(&body.refresh_token)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::with_status(warp::reply(), StatusCode::NO_CONTENT))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DevLoginRequest {
    pub user_id: UserId,
}

pub async fn dev_login(
    body: DevLoginRequest,
    auth_service: Arc<dyn AuthService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let tokens = auth_service
        .issue_tokens(body.user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;
    info!(user_id = %body.user_id, "dev session issued");

    Ok(warp::reply::json(&TokenPairResponse::from(tokens)))
}

pub async fn toggle_like(
    tweet_id: TweetId,
    user_id: UserId,
    like_service: Arc<dyn LikeService>,
) -> Result<impl warp::Reply, warp::Rejection> {
    let result = like_service
        .toggle(tweet_id, user_id)
        .await
        .map_err(ApiErrorCode::from)
        .map_err(reject::custom)?;

    Ok(warp::reply::json(&result))
}

#[derive(Debug, Deserialize)]
pub struct SubscribeQuery {
    pub topic: String,
}

pub fn subscribe(query: SubscribeQuery, hub: Arc<BroadcastHub>) -> impl warp::Reply {
    debug!(topic = %query.topic, "hub subscriber connected");
    let events = hub
        .subscribe(query.topic)
        .map(|data| Ok::<_, Infallible>(warp::sse::Event::default().data(data)));

    warp::sse::reply(
        warp::sse::keep_alive()
            .interval(SSE_KEEP_ALIVE)
            .stream(events),
    )
}

pub fn health() -> impl warp::Reply {
    warp::reply::json(&serde_json::json!({ "status": "ok" }))
}
