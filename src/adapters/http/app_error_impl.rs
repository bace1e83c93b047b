use crate::app_error::{AppError, ErrorCode};
use axum::Json;
use axum::{
    extract::rejection::PathRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
};

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        match &self {
            AppError::Upstream(_) | AppError::Internal(_) => {
                tracing::error!(error = ?self, "Request failed");
            }
            _ => tracing::debug!(error = ?self, "Request rejected"),
        }

        match self {
            AppError::Unauthorized => error_resp(
                StatusCode::UNAUTHORIZED,
                ErrorCode::Unauthorized,
                Some("unauthorized".into()),
            ),
            AppError::Forbidden => error_resp(
                StatusCode::FORBIDDEN,
                ErrorCode::Forbidden,
                Some("forbidden".into()),
            ),
            AppError::InvalidInput(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::InvalidInput, Some(msg))
            }
            AppError::NotFound => error_resp(StatusCode::NOT_FOUND, ErrorCode::NotFound, None),
            AppError::RateLimited => {
                error_resp(StatusCode::TOO_MANY_REQUESTS, ErrorCode::RateLimited, None)
            }
            AppError::DataRejected(msg) => {
                error_resp(StatusCode::BAD_REQUEST, ErrorCode::DataRejected, Some(msg))
            }
            AppError::Upstream(msg) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::UpstreamError,
                Some(msg),
            ),
            // Details stay in the server log.
            AppError::Internal(_) => error_resp(
                StatusCode::INTERNAL_SERVER_ERROR,
                ErrorCode::InternalError,
                Some("server error".into()),
            ),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::InvalidInput(rejection.body_text())
    }
}

fn error_resp(status: StatusCode, code: ErrorCode, message: Option<String>) -> Response {
    let body = match message {
        Some(msg) => serde_json::json!({ "code": code.as_str(), "message": msg }),
        None => serde_json::json!({ "code": code.as_str() }),
    };
    (status, Json(body)).into_response()
}
