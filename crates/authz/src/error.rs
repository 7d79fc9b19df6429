use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AuthError {
    #[error("invalid email or password")]
    InvalidCredentials,

    #[error("an account with this email already exists")]
    EmailTaken,

    #[error("{0}")]
    InvalidInput(String),

    #[error("not signed in or session expired")]
    Unauthenticated,

    #[error("auth backend failure: {0}")]
    Backend(String),
}

impl From<catalog_db::DbError> for AuthError {
    fn from(err: catalog_db::DbError) -> Self {
        match err {
            catalog_db::DbError::Constraint(_) => AuthError::EmailTaken,
            other => AuthError::Backend(other.to_string()),
        }
    }
}
