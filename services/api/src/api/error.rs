//! API error responses.
//!
//! Lifecycle failures map to 5xx; precondition failures (wrong or terminal
//! state) map to 409 because the caller raced another transition.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use dispatch_kitchen::{KitchenError, OrderError};
use serde::Serialize;

/// JSON error body.
#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub error: String,
    pub code: String,
}

/// An error response carrying a status and a JSON body.
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub body: ErrorBody,
}

impl ApiError {
    fn new(status: StatusCode, code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ErrorBody {
                error: message.into(),
                code: code.into(),
            },
        }
    }

    pub fn bad_request(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, code, message)
    }

    pub fn not_found(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::NOT_FOUND, code, message)
    }

    pub fn conflict(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::CONFLICT, code, message)
    }

    pub fn internal(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self::new(StatusCode::INTERNAL_SERVER_ERROR, code, message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

impl From<KitchenError> for ApiError {
    fn from(err: KitchenError) -> Self {
        let message = err.to_string();
        match err {
            KitchenError::Order(OrderError::WrongState { .. }) => {
                Self::conflict("wrong_state", message)
            }
            KitchenError::Order(OrderError::Terminal { .. }) => {
                Self::conflict("terminal_state", message)
            }
            KitchenError::Order(OrderError::Expired { .. }) => {
                Self::internal("order_expired", message)
            }
            KitchenError::Order(OrderError::Shelf(_)) => Self::internal("shelf_error", message),
            KitchenError::Unsupported { .. } => Self::internal("unsupported_temperature", message),
            KitchenError::NoShelf { .. } => Self::internal("no_shelf_available", message),
        }
    }
}
