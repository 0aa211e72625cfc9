use crate::application_port::*;
use crate::logger::*;
use serde::Serialize;
use std::convert::Infallible;
use thiserror::Error;
use warp::http::StatusCode;
use warp::{Rejection, reject};

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: ErrorDetail,
}

#[derive(Debug, Serialize)]
struct ErrorDetail {
    code: ApiErrorCode,
    message: String,
}

#[derive(Debug, Serialize)]
struct ValidationBody {
    errors: Vec<FieldError>,
}

#[derive(Debug, Serialize)]
struct FieldError {
    field: Option<String>,
    message: String,
}

pub async fn recover_error(err: Rejection) -> Result<impl warp::Reply, Infallible> {
    if let Some(e) = err.find::<warp::filters::body::BodyDeserializeError>() {
        return Ok(validation_reply(e.to_string()));
    }
    if let Some(e) = err.find::<reject::InvalidQuery>() {
        return Ok(validation_reply(e.to_string()));
    }

    let code = if let Some(code) = err.find::<ApiErrorCode>() {
        code.clone()
    } else if err.find::<reject::MissingHeader>().is_some() {
        ApiErrorCode::AuthUnauthorized
    } else if err.is_not_found() {
        ApiErrorCode::NotFound
    } else if err.find::<reject::MethodNotAllowed>().is_some() {
        ApiErrorCode::MethodNotAllowed
    } else if err.find::<reject::PayloadTooLarge>().is_some() {
        ApiErrorCode::PayloadTooLarge
    } else {
        warn!("unhandled rejection: {:?}", err);
        ApiErrorCode::InternalServerError
    };

    let body = ErrorBody {
        error: ErrorDetail {
            message: code.to_string(),
            code: code.clone(),
        },
    };
    Ok(warp::reply::with_status(
        warp::reply::json(&body),
        code.status(),
    ))
}

fn validation_reply(message: String) -> warp::reply::WithStatus<warp::reply::Json> {
    let body = ValidationBody {
        errors: vec![FieldError {
            field: None,
            message,
        }],
    };
    warp::reply::with_status(warp::reply::json(&body), StatusCode::UNPROCESSABLE_ENTITY)
}

#[derive(Debug, Clone, Error, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ApiErrorCode {
    #[error("Token is invalid or expired")]
    AuthTokenInvalid,
    #[error("Authentication required")]
    AuthUnauthorized,
    #[error("The tweet has already been liked")]
    LikeAlreadyExists,
    #[error("Not found")]
    NotFound,
    #[error("Method not allowed")]
    MethodNotAllowed,
    #[error("Payload too large")]
    PayloadTooLarge,
    #[error("Internal error")]
    InternalServerError,
}

impl ApiErrorCode {
    pub fn internal<E: std::fmt::Display>(error: E) -> ApiErrorCode {
        warn!("Internal error: {}", error);
        ApiErrorCode::InternalServerError
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiErrorCode::AuthTokenInvalid | ApiErrorCode::AuthUnauthorized => {
                StatusCode::UNAUTHORIZED
            }
            ApiErrorCode::LikeAlreadyExists => StatusCode::CONFLICT,
            ApiErrorCode::NotFound => StatusCode::NOT_FOUND,
            ApiErrorCode::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            ApiErrorCode::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiErrorCode::InternalServerError => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl reject::Reject for ApiErrorCode {}

impl From<AuthError> for ApiErrorCode {
    fn from(error: AuthError) -> Self {
        match error {
            AuthError::TokenInvalid | AuthError::TokenExpired => ApiErrorCode::AuthTokenInvalid,
            AuthError::Store(e) => ApiErrorCode::internal(e),
            AuthError::InternalError(e) => ApiErrorCode::internal(e),
        }
    }
}

impl From<LikeError> for ApiErrorCode {
    fn from(error: LikeError) -> Self {
        match error {
            LikeError::AlreadyExists => ApiErrorCode::LikeAlreadyExists,
            LikeError::Store(e) => ApiErrorCode::internal(e),
        }
    }
}
