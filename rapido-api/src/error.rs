use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        FromRequest,
    },
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rapido_order::{CustomerError, OrderError};
use rapido_shared::IdError;
use serde_json::json;

#[derive(Debug)]
pub enum AppError {
    ValidationError(String),
    NotFoundError(String),
    ConflictError(String),
    InternalServerError(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message) = match self {
            AppError::ValidationError(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::NotFoundError(msg) => (StatusCode::NOT_FOUND, msg),
            AppError::ConflictError(msg) => (StatusCode::CONFLICT, msg),
            AppError::InternalServerError(msg) => {
                tracing::error!("Internal Server Error: {}", msg);
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal Server Error".to_string())
            }
        };

        let body = Json(json!({
            "error": error_message,
        }));

        (status, body).into_response()
    }
}

impl From<OrderError> for AppError {
    fn from(err: OrderError) -> Self {
        match err {
            OrderError::Validation(msg) => AppError::ValidationError(msg),
            OrderError::NotFound(msg) => AppError::NotFoundError(msg),
            OrderError::Conflict(msg) => AppError::ConflictError(msg),
            OrderError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<CustomerError> for AppError {
    fn from(err: CustomerError) -> Self {
        match err {
            CustomerError::Validation(msg) => AppError::ValidationError(msg),
            CustomerError::NotFound(msg) => AppError::NotFoundError(msg),
            CustomerError::Conflict(msg) => AppError::ConflictError(msg),
            CustomerError::Storage(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<rapido_core::StoreError> for AppError {
    fn from(err: rapido_core::StoreError) -> Self {
        match err {
            rapido_core::StoreError::NotFound => AppError::NotFoundError(err.to_string()),
            rapido_core::StoreError::Conflict(msg) => AppError::ConflictError(msg),
            rapido_core::StoreError::Backend(msg) => AppError::InternalServerError(msg),
        }
    }
}

impl From<IdError> for AppError {
    fn from(err: IdError) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

// Always 400, including the 415/422 cases axum would pick.
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::ValidationError(rejection.body_text())
    }
}

/// `Json` extractor whose rejection renders as an `AppError` body.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
