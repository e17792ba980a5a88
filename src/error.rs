// region:    --- Imports
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use rust_decimal::Decimal;
use thiserror::Error;
use tracing::error;

// endregion: --- Imports

pub type Result<T> = std::result::Result<T, LedgerError>;

/// Why a bid was refused.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BidRejection {
    #[error("listing is closed")]
    ListingClosed,
    #[error("bid price must be higher than the starting bid of {starting_bid}")]
    NotAboveStartingBid { starting_bid: Decimal },
    #[error("bid price must be higher than the current bid of {current}")]
    NotAboveCurrentBid { current: Decimal },
}

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("invalid bid: {0}")]
    InvalidBid(#[from] BidRejection),

    #[error("permission denied: only the creator may close this listing")]
    PermissionDenied,

    #[error("{entity} {id} not found")]
    NotFound { entity: &'static str, id: i64 },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("conflict: {0}")]
    Conflict(String),

    #[error("missing or malformed x-user-id header")]
    Unauthenticated,

    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl LedgerError {
    pub fn not_found(entity: &'static str, id: i64) -> Self {
        LedgerError::NotFound { entity, id }
    }

    /// Stable machine-readable code placed in error bodies.
    pub fn code(&self) -> &'static str {
        match self {
            LedgerError::InvalidBid(_) => "INVALID_BID",
            LedgerError::PermissionDenied => "PERMISSION_DENIED",
            LedgerError::NotFound { .. } => "NOT_FOUND",
            LedgerError::InvalidInput(_) => "INVALID_INPUT",
            LedgerError::Conflict(_) => "CONFLICT",
            LedgerError::Unauthenticated => "UNAUTHENTICATED",
            LedgerError::Database(_) => "INTERNAL",
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            LedgerError::InvalidBid(_) | LedgerError::InvalidInput(_) => StatusCode::BAD_REQUEST,
            LedgerError::PermissionDenied => StatusCode::FORBIDDEN,
            LedgerError::NotFound { .. } => StatusCode::NOT_FOUND,
            LedgerError::Conflict(_) => StatusCode::CONFLICT,
            LedgerError::Unauthenticated => StatusCode::UNAUTHORIZED,
            LedgerError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<JsonRejection> for LedgerError {
    fn from(rejection: JsonRejection) -> Self {
        LedgerError::InvalidInput(rejection.body_text())
    }
}

impl From<PathRejection> for LedgerError {
    fn from(rejection: PathRejection) -> Self {
        LedgerError::InvalidInput(rejection.body_text())
    }
}

impl IntoResponse for LedgerError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("{:<12} --> {}", "Error", self);
        }
        let body = serde_json::json!({
            "error": self.to_string(),
            "code": self.code(),
        });

        (status, Json(body)).into_response()
    }
}
