//! Central error type for the serving surfaces

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use types::now_millis;

/// Errors surfaced by the query and push surfaces.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Unknown symbol: {0}")]
    SymbolNotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Internal server error")]
    Internal(#[from] anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AppError::SymbolNotFound(symbol) => (
                StatusCode::NOT_FOUND,
                format!("no order book for symbol: {symbol}"),
            ),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            AppError::Internal(err) => {
                tracing::error!(error = %err, "unhandled error in request handler");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
        };

        let body = Json(json!({
            "success": false,
            "error": message,
            "timestamp": now_millis(),
        }));

        (status, body).into_response()
    }
}
