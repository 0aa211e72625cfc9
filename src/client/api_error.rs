use crate::domain_port::TransportError;
use serde::Deserialize;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Unauthorized,
    TokenInvalid,
    Conflict,
    NotFound,
    Transient,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct FieldError {
    #[serde(default)]
    pub field: Option<String>,
    pub message: String,
}

#[derive(Debug, Clone, thiserror::Error)]
pub enum ApiError {
    #[error("{message}")]
    Status {
        status: u16,
        code: Option<String>,
        message: String,
        errors: Vec<FieldError>,
    },
    #[error(transparent)]
    Transport(#[from] TransportError),
    #[error("unexpected response body")]
    MalformedBody,
}

impl ApiError {
    /// Reads `{error:{code,message}}`, `{message}` or `{errors:[...]}` bodies.
    pub fn from_response(status: u16, body: &str) -> Self {
        let envelope: ErrorEnvelope = serde_json::from_str(body).unwrap_or_default();
        let (code, detail_message) = match envelope.error {
            Some(detail) => (detail.code, detail.message),
            None => (None, None),
        };
        let message = detail_message
            .or(envelope.message)
            .unwrap_or_else(|| reason_phrase(status));

        ApiError::Status {
            status,
            code,
            message,
            errors: envelope.errors.map(FieldErrors::into_vec).unwrap_or_default(),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            ApiError::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn code(&self) -> Option<&str> {
        match self {
            ApiError::Status { code, .. } => code.as_deref(),
            _ => None,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        let ApiError::Status {
            status, errors, ..
        } = self
        else {
            return ErrorKind::Transient;
        };
        match (*status, self.code()) {
            (401 | 422, Some("AUTH_TOKEN_INVALID")) => ErrorKind::TokenInvalid,
            (422, _) => ErrorKind::Validation,
            _ if !errors.is_empty() => ErrorKind::Validation,
            (401, _) => ErrorKind::Unauthorized,
            (409, _) => ErrorKind::Conflict,
            (404, _) => ErrorKind::NotFound,
            _ => ErrorKind::Transient,
        }
    }
}

fn reason_phrase(status: u16) -> String {
    reqwest::StatusCode::from_u16(status)
        .ok()
        .and_then(|s| s.canonical_reason())
        .map(str::to_owned)
        .unwrap_or_else(|| format!("HTTP {status}"))
}

#[derive(Debug, Default, Deserialize)]
struct ErrorEnvelope {
    #[serde(default)]
    error: Option<ErrorDetail>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    errors: Option<FieldErrors>,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum FieldErrors {
    Many(Vec<FieldError>),
    One(FieldError),
}

impl FieldErrors {
    fn into_vec(self) -> Vec<FieldError> {
        match self {
            FieldErrors::Many(errors) => errors,
            FieldErrors::One(error) => vec![error],
        }
    }
}
