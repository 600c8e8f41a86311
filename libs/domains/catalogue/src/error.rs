use axum::response::{IntoResponse, Response};
use axum_helpers::AppError;
use database::DatabaseError;
use thiserror::Error;

/// Errors surfaced by the catalogue service.
///
/// Store failures are tagged with the operation that triggered them and are
/// never retried here. Unknown sort keys and out-of-range pages are
/// normalised instead of being reported.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CatalogueError {
    #[error("Sock not found: {0}")]
    NotFound(String),

    #[error("Store unavailable during {operation}: {message}")]
    StoreUnavailable {
        operation: &'static str,
        message: String,
    },

    #[error("{operation} was cancelled")]
    Cancelled { operation: &'static str },

    #[error("{operation} exceeded its deadline")]
    DeadlineExceeded { operation: &'static str },
}

pub type CatalogueResult<T> = Result<T, CatalogueError>;

impl CatalogueError {
    /// Tag a store failure with the service operation that hit it.
    pub fn from_store(operation: &'static str, err: StoreError) -> Self {
        match err {
            StoreError::Unavailable(message) => CatalogueError::StoreUnavailable {
                operation,
                message,
            },
            StoreError::Cancelled => CatalogueError::Cancelled { operation },
            StoreError::DeadlineExceeded => CatalogueError::DeadlineExceeded { operation },
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, CatalogueError::NotFound(_))
    }

    /// Short label used for log fields and metric labels.
    pub fn kind(&self) -> &'static str {
        match self {
            CatalogueError::NotFound(_) => "not_found",
            CatalogueError::StoreUnavailable { .. } => "store_unavailable",
            CatalogueError::Cancelled { .. } => "cancelled",
            CatalogueError::DeadlineExceeded { .. } => "deadline_exceeded",
        }
    }
}

/// Errors reported by a [`SockStore`](crate::repository::SockStore).
///
/// "Not found" is not an error at this layer: lookups return `Option`.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("request cancelled")]
    Cancelled,

    #[error("deadline exceeded")]
    DeadlineExceeded,
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<sea_orm::DbErr> for StoreError {
    fn from(err: sea_orm::DbErr) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        StoreError::Unavailable(format!("malformed record: {}", err))
    }
}

impl From<std::io::Error> for StoreError {
    fn from(err: std::io::Error) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

impl From<DatabaseError> for StoreError {
    fn from(err: DatabaseError) -> Self {
        StoreError::Unavailable(err.to_string())
    }
}

/// Convert CatalogueError to AppError for standardized error responses
impl From<CatalogueError> for AppError {
    fn from(err: CatalogueError) -> Self {
        match err {
            CatalogueError::NotFound(id) => AppError::NotFound(format!("Sock {} not found", id)),
            CatalogueError::StoreUnavailable { operation, message } => {
                AppError::ServiceUnavailable(format!("{}: {}", operation, message))
            }
            CatalogueError::Cancelled { operation } => {
                AppError::ServiceUnavailable(format!("{} was cancelled", operation))
            }
            CatalogueError::DeadlineExceeded { operation } => {
                AppError::GatewayTimeout(format!("{} exceeded its deadline", operation))
            }
        }
    }
}

impl IntoResponse for CatalogueError {
    fn into_response(self) -> Response {
        let app_error: AppError = self.into();
        app_error.into_response()
    }
}
