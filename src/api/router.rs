use super::error::*;
use super::handler;
use crate::application_port::AuthService;
use crate::domain_model::{TweetId, UserId};
use crate::server::*;
use std::convert::Infallible;
use std::sync::Arc;
use warp::{Filter, http, reject};

const MAX_BODY_BYTES: u64 = 16 * 1024;

pub fn routes(
    server: Arc<Server>,
) -> impl Filter<Extract = (impl warp::Reply,), Error = warp::Rejection> + Clone {
    let refresh = warp::post()
        .and(warp::path!("api" / "token" / "refresh"))
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::refresh_token);

    let dev_enabled = server.dev_login;
    let dev_login = warp::post()
        .and(warp::path!("api" / "token" / "dev"))
        .and(warp::any().and_then(move || async move {
            if dev_enabled {
                Ok(())
            } else {
                Err(reject::not_found())
            }
        }))
        .untuple_one()
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::dev_login);

    let revoke = warp::delete()
        .and(warp::path!("api" / "tokens"))
        .and(json_body())
        .and(with(server.auth_service.clone()))
        .and_then(handler::revoke_token);

    let toggle_like = warp::post()
        .and(warp::path!("api" / "tweets" / TweetId / "likes" / "toggle"))
        .and(with_verification(server.auth_service.clone()))
        .and(with(server.like_service.clone()))
        .and_then(handler::toggle_like);

    let subscribe = warp::get()
        .and(warp::path!(".well-known" / "mercure"))
        .and(warp::query::<handler::SubscribeQuery>())
        .and(with(server.hub.clone()))
        .map(handler::subscribe);

    let health = warp::get()
        .and(warp::path!("health"))
        .map(handler::health);

    refresh
        .or(dev_login)
        .or(revoke)
        .or(toggle_like)
        .or(subscribe)
        .or(health)
}

fn json_body<T>() -> impl Filter<Extract = (T,), Error = warp::Rejection> + Clone
where
    T: serde::de::DeserializeOwned + Send,
{
    warp::body::content_length_limit(MAX_BODY_BYTES).and(warp::body::json())
}

fn with<ServiceType>(
    service: Arc<ServiceType>,
) -> impl Filter<Extract = (Arc<ServiceType>,), Error = Infallible> + Clone
where
    ServiceType: Send + Sync + ?Sized,
{
    warp::any().map(move || service.clone())
}

fn with_verification(
    auth_service: Arc<dyn AuthService>,
) -> impl Filter<Extract = (UserId,), Error = warp::Rejection> + Clone {
    warp::header::<String>(http::header::AUTHORIZATION.as_ref()).and_then(move |header: String| {
        let auth_service = auth_service.clone();
        async move {
            let Some(token) = header.strip_prefix("Bearer ") else {
                return Err(reject::custom(ApiErrorCode::AuthUnauthorized));
            };
            auth_service
                .verify_token(token)
                .await
                .map_err(|_| reject::custom(ApiErrorCode::AuthUnauthorized))
        }
    })
}
