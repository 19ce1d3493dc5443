use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized,
    Forbidden,
    NotFound,
    BadRequest(String),
    /// A collaborator (database or upstream credentials) is not configured.
    Unavailable(&'static str),
    BadGateway {
        error: &'static str,
        details: String,
    },
    Internal(anyhow::Error),
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        ApiError::Internal(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, error, details) = match self {
            ApiError::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "missing user identity".to_string(),
                None,
            ),
            ApiError::Forbidden => (StatusCode::FORBIDDEN, "forbidden".to_string(), None),
            ApiError::NotFound => (StatusCode::NOT_FOUND, "not found".to_string(), None),
            ApiError::BadRequest(details) => (
                StatusCode::BAD_REQUEST,
                "invalid request".to_string(),
                Some(details),
            ),
            ApiError::Unavailable(what) => (
                StatusCode::SERVICE_UNAVAILABLE,
                format!("{what} is not configured"),
                None,
            ),
            ApiError::BadGateway { error, details } => {
                (StatusCode::BAD_GATEWAY, error.to_string(), Some(details))
            }
            ApiError::Internal(err) => {
                sentry_anyhow::capture_anyhow(&err);
                tracing::error!(error = %format!("{err:#}"), "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal error".to_string(),
                    None,
                )
            }
        };

        let body = match details {
            Some(details) => json!({ "error": error, "details": details }),
            None => json!({ "error": error }),
        };
        (status, Json(body)).into_response()
    }
}
