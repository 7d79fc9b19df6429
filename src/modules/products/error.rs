use std::fmt::Display;

use catalog_db::DbError;
use catalog_http::AppError;
use thiserror::Error;

use super::validation::ValidationError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PersistenceKind {
    NotFound,
    Conflict,
    Unavailable,
    Other,
}

/// Any failure coming back from the data backend, with a readable message.
#[derive(Debug, Clone, Error, PartialEq)]
#[error("{message}")]
pub struct PersistenceError {
    pub kind: PersistenceKind,
    pub message: String,
}

impl PersistenceError {
    pub fn not_found(id: &str) -> Self {
        Self {
            kind: PersistenceKind::NotFound,
            message: format!("product {} not found", id),
        }
    }

    /// Wrap a backend error, prefixing what was being attempted.
    pub fn from_db(err: DbError, action: impl Display) -> Self {
        let kind = match &err {
            DbError::NotFound { .. } => PersistenceKind::NotFound,
            DbError::Constraint(_) => PersistenceKind::Conflict,
            DbError::Transport(_) => PersistenceKind::Unavailable,
            DbError::Query(_) | DbError::Decode(_) => PersistenceKind::Other,
        };
        Self {
            kind,
            message: format!("{}: {}", action, err),
        }
    }

    pub fn decode(err: impl Display) -> Self {
        Self {
            kind: PersistenceKind::Other,
            message: format!("malformed product record: {}", err),
        }
    }
}

/// Outcome of a form-driven operation: rejected locally, or by the backend.
#[derive(Debug, Clone, Error, PartialEq)]
pub enum ProductError {
    #[error(transparent)]
    Validation(#[from] ValidationError),

    #[error(transparent)]
    Persistence(#[from] PersistenceError),
}

impl From<PersistenceError> for AppError {
    fn from(err: PersistenceError) -> Self {
        match err.kind {
            PersistenceKind::NotFound => AppError::not_found(err.message),
            PersistenceKind::Conflict => AppError::conflict(vec![], err.message),
            PersistenceKind::Unavailable => AppError::service_unavailable(err.message),
            PersistenceKind::Other => AppError::Internal(anyhow::anyhow!(err.message)),
        }
    }
}

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        let details = vec![serde_json::json!({
            "field": err.field(),
            "error": err.to_string(),
        })];
        AppError::validation(details, err.to_string())
    }
}

impl From<ProductError> for AppError {
    fn from(err: ProductError) -> Self {
        match err {
            ProductError::Validation(err) => err.into(),
            ProductError::Persistence(err) => err.into(),
        }
    }
}
