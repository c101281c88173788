use axum::{
    response::{IntoResponse, Response},
    http::StatusCode,
};
use serde_json::json;
use axum::Json;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    /// Empty or unparseable upload, or a request parameter out of range.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// Requested sheet(s) absent, or nothing left to process after filtering.
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("DataFrame error: {0}")]
    DataFrame(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Message without the category prefix, as returned to HTTP clients.
    pub fn detail(&self) -> String {
        match self {
            AppError::InvalidInput(msg)
            | AppError::NotFound(msg)
            | AppError::DataFrame(msg)
            | AppError::Internal(msg) => msg.clone(),
            AppError::Io(err) => err.to_string(),
        }
    }
}

impl From<polars::error::PolarsError> for AppError {
    fn from(err: polars::error::PolarsError) -> Self {
        AppError::DataFrame(err.to_string())
    }
}

impl From<calamine::Error> for AppError {
    fn from(err: calamine::Error) -> Self {
        AppError::InvalidInput(format!("Invalid Excel file: {}", err))
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::DataFrame(_) | AppError::Io(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        };

        if status.is_server_error() {
            tracing::error!("Request failed: {}", self);
        } else {
            tracing::warn!("Request rejected: {}", self);
        }

        let body = Json(json!({
            "error": self.detail()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_mapping() {
        let resp = AppError::InvalidInput("Empty upload received".into()).into_response();
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);

        let resp = AppError::NotFound("Sheet(s) not found: Sheet3".into()).into_response();
        assert_eq!(resp.status(), StatusCode::NOT_FOUND);

        let resp = AppError::Internal("processing queue is shut down".into()).into_response();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_detail_strips_prefix() {
        let err = AppError::NotFound("Sheet(s) not found: A, B".into());
        assert_eq!(err.detail(), "Sheet(s) not found: A, B");
        assert_eq!(err.to_string(), "Not found: Sheet(s) not found: A, B");
    }
}
