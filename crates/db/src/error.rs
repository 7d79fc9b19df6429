use thiserror::Error;

/// Failures surfaced by a [`Store`](crate::Store) backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum DbError {
    #[error("no row with id '{id}' in table '{table}'")]
    NotFound { table: String, id: String },

    #[error("constraint violation: {0}")]
    Constraint(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("backend unreachable: {0}")]
    Transport(String),

    #[error("malformed row: {0}")]
    Decode(String),
}

impl DbError {
    pub fn not_found(table: &str, id: &str) -> Self {
        Self::NotFound {
            table: table.to_string(),
            id: id.to_string(),
        }
    }
}
