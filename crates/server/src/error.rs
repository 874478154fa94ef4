//! Unified error handling for the sync server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;
use woo_civi_sync::WooError;

/// Application-level error type for the sync server.
///
/// Only requests that cannot produce a result at all end up here; sync
/// failures inside a handler are reported and absorbed by the handler.
/// CiviCRM failures are always absorbed, so only WooCommerce lookups and
/// request validation can fail a request.
#[derive(Debug, Error)]
pub enum AppError {
    /// WooCommerce API operation failed.
    #[error("WooCommerce error: {0}")]
    Woo(#[from] WooError),

    /// Bad request from client.
    #[error("Bad request: {0}")]
    BadRequest(String),
}

impl AppError {
    const fn status(&self) -> StatusCode {
        match self {
            Self::Woo(WooError::NotFound(_)) => StatusCode::NOT_FOUND,
            Self::Woo(_) => StatusCode::BAD_GATEWAY,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Log server errors with Sentry
        if status.is_server_error() {
            let event_id = sentry::capture_error(&self);
            tracing::error!(
                error = %self,
                sentry_event_id = %event_id,
                "Sync request error"
            );
        }

        // Don't expose internal error details to clients
        let message = if status.is_server_error() {
            "External service error".to_string()
        } else {
            self.to_string()
        };

        (status, message).into_response()
    }
}
