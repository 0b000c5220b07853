//! API error types with HTTP response mapping.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use checkout::CheckoutError;
use domain::{CartError, OrderError};
use store::StoreError;

/// API-level error type that maps to HTTP responses.
#[derive(Debug)]
pub enum ApiError {
    /// Missing or malformed credentials.
    Unauthorized(String),
    /// Resource not found.
    NotFound(String),
    /// Bad request from the client.
    BadRequest(String),
    /// Cart operation error.
    Cart(CartError),
    /// Order read error.
    Order(OrderError),
    /// Checkout pipeline error.
    Checkout(CheckoutError),
    /// Internal server error.
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Cart(err) => cart_error_to_response(err),
            ApiError::Order(err) => order_error_to_response(err),
            ApiError::Checkout(err) => checkout_error_to_response(err),
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
        };

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}

fn cart_error_to_response(err: CartError) -> (StatusCode, String) {
    match &err {
        CartError::ProductNotFound(_) | CartError::ItemNotFound(_) | CartError::NoActiveCart(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CartError::InvalidQuantity { .. } => (StatusCode::BAD_REQUEST, err.to_string()),
        CartError::Store(store_err) => store_error_to_response(store_err, &err),
    }
}

fn order_error_to_response(err: OrderError) -> (StatusCode, String) {
    match &err {
        OrderError::NotFound(_) => (StatusCode::NOT_FOUND, err.to_string()),
        OrderError::AccessDenied(_) => (StatusCode::FORBIDDEN, err.to_string()),
        OrderError::Store(store_err) => store_error_to_response(store_err, &err),
    }
}

fn checkout_error_to_response(err: CheckoutError) -> (StatusCode, String) {
    match &err {
        CheckoutError::AddressNotFound(_) | CheckoutError::ProductNotFound(_) => {
            (StatusCode::NOT_FOUND, err.to_string())
        }
        CheckoutError::AddressNotOwned(_) => (StatusCode::FORBIDDEN, err.to_string()),
        CheckoutError::NoActiveCart(_) | CheckoutError::CartEmpty(_) => {
            (StatusCode::BAD_REQUEST, err.to_string())
        }
        CheckoutError::InsufficientStock { .. } => (StatusCode::CONFLICT, err.to_string()),
        CheckoutError::Store(store_err) => store_error_to_response(store_err, &err),
    }
}

fn store_error_to_response(store_err: &StoreError, err: &dyn std::fmt::Display) -> (StatusCode, String) {
    match store_err {
        StoreError::DuplicateActiveCart(_)
        | StoreError::DuplicateCartItem { .. }
        | StoreError::InsufficientStock { .. }
        | StoreError::CartNotActive(_) => (StatusCode::CONFLICT, err.to_string()),
        _ => {
            tracing::error!(error = %err, "storage failure");
            (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
        }
    }
}

impl From<CartError> for ApiError {
    fn from(err: CartError) -> Self {
        ApiError::Cart(err)
    }
}

impl From<OrderError> for ApiError {
    fn from(err: OrderError) -> Self {
        ApiError::Order(err)
    }
}

impl From<CheckoutError> for ApiError {
    fn from(err: CheckoutError) -> Self {
        ApiError::Checkout(err)
    }
}
