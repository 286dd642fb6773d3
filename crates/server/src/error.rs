//! One error type for the whole HTTP surface, mapped onto status codes and
//! the standard response envelope.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use services::services::{ordering::OrderingError, scope_guard::ScopeError};
use thiserror::Error;
use utils::response::ApiResponse;

#[derive(Debug, Error)]
pub enum ApiError {
    #[error("not found")]
    NotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("unauthorized")]
    Unauthorized,
    #[error(transparent)]
    Scope(#[from] ScopeError),
    #[error(transparent)]
    Ordering(#[from] OrderingError),
    #[error(transparent)]
    Database(#[from] sqlx::Error),
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized => StatusCode::UNAUTHORIZED,
            ApiError::Scope(ScopeError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Scope(ScopeError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Ordering(OrderingError::NotFound) => StatusCode::NOT_FOUND,
            ApiError::Ordering(OrderingError::Validation(_)) => StatusCode::BAD_REQUEST,
            // A database error surviving the move retry loop means the
            // transaction kept losing serialization; surface as a conflict
            // the client can resubmit.
            ApiError::Ordering(OrderingError::Database(e)) if db::is_retryable_error(e) => {
                StatusCode::CONFLICT
            }
            ApiError::Ordering(OrderingError::Database(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::Database(sqlx::Error::RowNotFound) => StatusCode::NOT_FOUND,
            ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = if status.is_server_error() {
            tracing::error!(error = %self, "request failed");
            "internal server error".to_string()
        } else {
            self.to_string()
        };
        (status, Json(ApiResponse::<()>::error(message))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn scope_not_found_maps_to_404() {
        assert_eq!(
            ApiError::Scope(ScopeError::NotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn ordering_validation_maps_to_400() {
        let error = ApiError::Ordering(OrderingError::Validation("nope".to_string()));
        assert_eq!(error.status_code(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn missing_row_maps_to_404() {
        assert_eq!(
            ApiError::Database(sqlx::Error::RowNotFound).status_code(),
            StatusCode::NOT_FOUND
        );
    }

    #[test]
    fn server_errors_hide_the_message() {
        let response = ApiError::Database(sqlx::Error::PoolClosed).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
