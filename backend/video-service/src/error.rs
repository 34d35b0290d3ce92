use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use s3_utils::BlobStoreError;
use serde::Serialize;
use thiserror::Error;
use video_cache::CacheError;
use video_core::{InvalidResolution, PayloadError};

use crate::db::StoreError;

pub type Result<T> = std::result::Result<T, AppError>;

/// Failures of the cache-aside repository.
///
/// `Clone` so that every caller coalesced onto one load receives the same error.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RepositoryError {
    /// The id or its file is absent from the metadata store.
    #[error("Not found: {0}")]
    NotFound(String),

    /// The cache backend failed; a miss is never reported this way.
    #[error("Cache error: {0}")]
    Cache(String),

    /// The blob store could not sign a URL.
    #[error("Upstream dependency error: {0}")]
    UpstreamDependency(String),

    /// A cached payload could not be decoded, or a value could not be encoded.
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// The metadata store failed for a reason other than not-found.
    #[error("Database error: {0}")]
    Database(String),
}

impl From<CacheError> for RepositoryError {
    fn from(err: CacheError) -> Self {
        RepositoryError::Cache(err.to_string())
    }
}

impl From<PayloadError> for RepositoryError {
    fn from(err: PayloadError) -> Self {
        RepositoryError::Serialization(err.to_string())
    }
}

impl From<StoreError> for RepositoryError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::NotFound(id) => RepositoryError::NotFound(format!("video {id}")),
            StoreError::Database(e) => RepositoryError::Database(e.to_string()),
        }
    }
}

impl From<BlobStoreError> for RepositoryError {
    fn from(err: BlobStoreError) -> Self {
        RepositoryError::UpstreamDependency(err.to_string())
    }
}

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Cache error: {0}")]
    CacheError(String),

    #[error("Upstream error: {0}")]
    UpstreamError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Database error: {0}")]
    DatabaseError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: u16,
}

impl ResponseError for AppError {
    fn error_response(&self) -> HttpResponse {
        let code = self.status_code();
        let message = match self {
            AppError::NotFound(msg) | AppError::ValidationError(msg) => msg.clone(),
            _ => self.to_string(),
        };

        HttpResponse::build(code).json(ErrorResponse {
            error: message,
            code: code.as_u16(),
        })
    }

    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::ValidationError(_) => StatusCode::BAD_REQUEST,
            AppError::UpstreamError(_) => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<RepositoryError> for AppError {
    fn from(err: RepositoryError) -> Self {
        match err {
            RepositoryError::NotFound(msg) => AppError::NotFound(msg),
            RepositoryError::Cache(msg) => AppError::CacheError(msg),
            RepositoryError::UpstreamDependency(msg) => AppError::UpstreamError(msg),
            RepositoryError::Serialization(msg) => AppError::SerializationError(msg),
            RepositoryError::Database(msg) => AppError::DatabaseError(msg),
        }
    }
}

impl From<InvalidResolution> for AppError {
    fn from(err: InvalidResolution) -> Self {
        AppError::ValidationError(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            AppError::NotFound("video v1".into()).status_code(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::ValidationError("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            AppError::UpstreamError("s3".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::CacheError("down".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_repository_errors_keep_their_kind() {
        assert!(matches!(
            AppError::from(RepositoryError::NotFound("video x".into())),
            AppError::NotFound(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::UpstreamDependency("s3".into())),
            AppError::UpstreamError(_)
        ));
        assert!(matches!(
            AppError::from(RepositoryError::Serialization("bad".into())),
            AppError::SerializationError(_)
        ));
    }

    #[test]
    fn test_store_not_found_maps_to_not_found() {
        let err = RepositoryError::from(StoreError::NotFound("missing".into()));
        assert_eq!(err, RepositoryError::NotFound("video missing".into()));
    }
}
