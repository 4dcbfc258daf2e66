use axum::http::{header, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

use crate::core::model::Attempt;
use crate::error::{LyricaError, LyricsError};
use crate::server::response::{attempt_views, now_timestamp, ErrorBody, ErrorEnvelope};

pub type ApiResult<T> = Result<T, ApiError>;

/// Errors as the HTTP boundary reports them.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error("{0}")]
    BadRequest(String),

    #[error("{message}")]
    NoMatch { message: String, attempts: Vec<Attempt> },

    #[error("Rate limit exceeded. Please wait {retry_after_secs} seconds before retrying.")]
    RateLimited { retry_after_secs: u64 },

    #[error("unauthorized")]
    Unauthorized,

    #[error("Admin endpoints are disabled: no admin key configured")]
    AdminDisabled,

    #[error("Not found")]
    RouteNotFound,

    #[error("Internal server error")]
    Internal(String),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::NoMatch { .. } | ApiError::RouteNotFound => StatusCode::NOT_FOUND,
            ApiError::RateLimited { .. } => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Unauthorized => StatusCode::FORBIDDEN,
            ApiError::AdminDisabled => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<LyricaError> for ApiError {
    fn from(err: LyricaError) -> Self {
        match err {
            LyricaError::Validation(msg) => ApiError::BadRequest(msg),
            LyricaError::Lyrics(LyricsError::InvalidSequence { reason }) => {
                ApiError::BadRequest(format!("Invalid sequence: {}", reason))
            }
            LyricaError::Lyrics(LyricsError::NotFound {
                artist,
                title,
                attempts,
            }) => ApiError::NoMatch {
                message: format!("No lyrics found for '{}' by '{}'", title, artist),
                attempts,
            },
            other => ApiError::Internal(other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if let ApiError::Internal(detail) = &self {
            error!("Request failed: {}", detail);
        }

        let retry_after = match &self {
            ApiError::RateLimited { retry_after_secs } => Some(*retry_after_secs),
            _ => None,
        };
        let message = self.to_string();
        let attempts = match self {
            ApiError::NoMatch { attempts, .. } => Some(attempt_views(&attempts)),
            _ => None,
        };

        let body = Json(ErrorEnvelope {
            status: "error",
            error: ErrorBody {
                message,
                timestamp: now_timestamp(),
                retry_after,
            },
            attempts,
        });

        let mut response = (status, body).into_response();
        if let Some(secs) = retry_after {
            response
                .headers_mut()
                .insert(header::RETRY_AFTER, HeaderValue::from(secs));
        }
        response
    }
}
