//! In-process store used for local runs and tests.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::{Timestamp, Uuid};

use crate::{DbError, Query, Row, Store};

#[derive(Default)]
struct Table {
    rows: Vec<Row>,
    unique: Vec<String>,
}

impl Table {
    fn position(&self, id: &str) -> Option<usize> {
        self.rows
            .iter()
            .position(|row| row.get("id").and_then(Value::as_str) == Some(id))
    }

    /// Reject `candidate` if it collides with another row on a unique column.
    fn check_unique(&self, candidate: &Row, skip: Option<usize>) -> Result<(), DbError> {
        for column in &self.unique {
            let Some(value) = candidate.get(column) else {
                continue;
            };
            let clash = self
                .rows
                .iter()
                .enumerate()
                .any(|(index, row)| Some(index) != skip && row.get(column) == Some(value));
            if clash {
                return Err(DbError::Constraint(format!(
                    "duplicate value for unique column '{}'",
                    column
                )));
            }
        }
        Ok(())
    }
}

/// Tables kept in insertion order behind an async lock.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<HashMap<String, Table>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Declare a unique column. Must be called before rows are inserted.
    pub fn with_unique(self, table: &str, column: &str) -> Self {
        let mut tables = self.tables.into_inner();
        tables
            .entry(table.to_string())
            .or_default()
            .unique
            .push(column.to_string());
        Self {
            tables: RwLock::new(tables),
        }
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, DbError> {
        let tables = self.tables.read().await;
        let mut rows: Vec<Row> = tables
            .get(query.table())
            .map(|table| {
                table
                    .rows
                    .iter()
                    .filter(|row| query.matches(row))
                    .cloned()
                    .collect()
            })
            .unwrap_or_default();

        query.sort(&mut rows);
        tracing::debug!(table = query.table(), rows = rows.len(), "memory select");
        Ok(rows)
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, DbError> {
        let id = Uuid::new_v7(Timestamp::now(uuid::NoContext)).to_string();
        row.insert("id".to_string(), Value::String(id));

        let mut tables = self.tables.write().await;
        let entry = tables.entry(table.to_string()).or_default();
        entry.check_unique(&row, None)?;
        entry.rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, DbError> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| DbError::not_found(table, id))?;
        let index = entry
            .position(id)
            .ok_or_else(|| DbError::not_found(table, id))?;

        let mut updated = entry.rows[index].clone();
        for (column, value) in patch {
            if column != "id" {
                updated.insert(column, value);
            }
        }
        entry.check_unique(&updated, Some(index))?;
        entry.rows[index] = updated.clone();
        Ok(updated)
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), DbError> {
        let mut tables = self.tables.write().await;
        let entry = tables
            .get_mut(table)
            .ok_or_else(|| DbError::not_found(table, id))?;
        let index = entry
            .position(id)
            .ok_or_else(|| DbError::not_found(table, id))?;
        entry.rows.remove(index);
        Ok(())
    }
}
