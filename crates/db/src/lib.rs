//! Data service boundary.
//!
//! Everything above this crate talks to persistence through [`Store`] and the
//! backend-neutral [`Query`] builder. Two backends ship here: [`MemoryStore`]
//! for local runs and tests, and [`RestStore`] for hosted PostgREST endpoints.

use std::sync::Arc;

use async_trait::async_trait;
use catalog_kernel::settings::{DatabaseBackend, DatabaseSettings};

pub mod error;
pub mod memory;
pub mod query;
pub mod rest;

pub use error::DbError;
pub use memory::MemoryStore;
pub use query::{escape_like, Filter, Order, Query, Row};
pub use rest::RestStore;

/// Narrow persistence interface: filtered reads plus single-row mutations.
///
/// Backends own id generation; `insert` returns the stored row including `id`.
#[async_trait]
pub trait Store: Send + Sync {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, DbError>;

    async fn insert(&self, table: &str, row: Row) -> Result<Row, DbError>;

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, DbError>;

    async fn delete(&self, table: &str, id: &str) -> Result<(), DbError>;
}

/// Build the configured backend.
pub fn connect(settings: &DatabaseSettings) -> Result<Arc<dyn Store>, DbError> {
    match settings.backend {
        DatabaseBackend::Memory => {
            tracing::info!(target: "catalog-db", "using in-memory store");
            Ok(Arc::new(
                MemoryStore::new().with_unique(&settings.users_table, "email"),
            ))
        }
        DatabaseBackend::Rest => {
            let url = settings.url.clone().ok_or_else(|| {
                DbError::Transport("database.url is not configured".to_string())
            })?;
            tracing::info!(target: "catalog-db", %url, "using REST store");
            Ok(Arc::new(RestStore::new(url, settings.api_key.clone())))
        }
    }
}
