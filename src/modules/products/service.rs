use std::sync::Arc;

use catalog_db::{Query, Row, Store};
use chrono::{SecondsFormat, Utc};
use serde::Serialize;
use serde_json::Value;

use super::error::PersistenceError;
use super::filter::ProductFilter;
use super::models::{Product, ProductDraft, ProductPatch};

/// The only component that issues product queries.
///
/// Every method is a single request against the [`Store`]; there is no
/// caching, retry or conflict detection. Concurrent writers race and the last
/// write wins.
pub struct ProductService {
    store: Arc<dyn Store>,
    table: String,
}

impl ProductService {
    pub fn new(store: Arc<dyn Store>, table: impl Into<String>) -> Self {
        Self {
            store,
            table: table.into(),
        }
    }

    /// Insert a new product stamped with the current time.
    #[tracing::instrument(skip_all, fields(name = %draft.name))]
    pub async fn create_product(&self, draft: ProductDraft) -> Result<Product, PersistenceError> {
        let mut row = to_row(&draft)?;
        row.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)),
        );

        let stored = self
            .store
            .insert(&self.table, row)
            .await
            .map_err(|err| PersistenceError::from_db(err, "failed to create product"))?;

        let product = from_row(stored)?;
        tracing::info!(product_id = %product.id, "product created");
        Ok(product)
    }

    /// Products matching every present filter field, newest first.
    #[tracing::instrument(skip_all)]
    pub async fn get_products(
        &self,
        filter: Option<&ProductFilter>,
    ) -> Result<Vec<Product>, PersistenceError> {
        let query = filter
            .map(|f| f.to_query(&self.table))
            .unwrap_or_else(|| ProductFilter::default().to_query(&self.table));

        let rows = self
            .store
            .select(&query)
            .await
            .map_err(|err| PersistenceError::from_db(err, "failed to load products"))?;

        tracing::debug!(count = rows.len(), "products loaded");
        rows.into_iter().map(from_row).collect()
    }

    #[tracing::instrument(skip(self))]
    pub async fn get_product_by_id(&self, id: &str) -> Result<Product, PersistenceError> {
        let query = Query::from(self.table.as_str()).eq("id", id);
        let rows = self.store.select(&query).await.map_err(|err| {
            PersistenceError::from_db(err, format!("failed to load product {}", id))
        })?;

        match rows.into_iter().next() {
            Some(row) => from_row(row),
            None => Err(PersistenceError::not_found(id)),
        }
    }

    /// Write the fields present in `patch`. An empty patch reads the record back unchanged.
    #[tracing::instrument(skip(self, patch))]
    pub async fn update_product(
        &self,
        id: &str,
        patch: ProductPatch,
    ) -> Result<Product, PersistenceError> {
        if patch.is_empty() {
            return self.get_product_by_id(id).await;
        }

        let row = to_row(&patch)?;
        let stored = self
            .store
            .update(&self.table, id, row)
            .await
            .map_err(|err| {
                PersistenceError::from_db(err, format!("failed to update product {}", id))
            })?;

        tracing::info!(product_id = %id, "product updated");
        from_row(stored)
    }

    /// Irreversible.
    #[tracing::instrument(skip(self))]
    pub async fn delete_product(&self, id: &str) -> Result<(), PersistenceError> {
        self.store.delete(&self.table, id).await.map_err(|err| {
            PersistenceError::from_db(err, format!("failed to delete product {}", id))
        })?;

        tracing::info!(product_id = %id, "product deleted");
        Ok(())
    }
}

fn to_row<T: Serialize>(value: &T) -> Result<Row, PersistenceError> {
    match serde_json::to_value(value).map_err(PersistenceError::decode)? {
        Value::Object(row) => Ok(row),
        other => Err(PersistenceError::decode(format!(
            "expected an object, got {}",
            other
        ))),
    }
}

fn from_row(row: Row) -> Result<Product, PersistenceError> {
    serde_json::from_value(Value::Object(row)).map_err(PersistenceError::decode)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::products::error::PersistenceKind;
    use crate::modules::products::models::Category;
    use catalog_db::MemoryStore;

    fn service() -> ProductService {
        ProductService::new(Arc::new(MemoryStore::new()), "products")
    }

    fn draft(name: &str, category: Category, price: f64, rating: f64) -> ProductDraft {
        ProductDraft {
            name: name.to_string(),
            description: format!("{} description", name),
            category,
            price,
            rating,
        }
    }

    #[tokio::test]
    async fn create_then_fetch_round_trips() {
        let service = service();
        let input = draft("Headphones", Category::Electronics, 99.5, 4.2);

        let created = service.create_product(input.clone()).await.unwrap();
        assert!(!created.id.is_empty());

        let fetched = service.get_product_by_id(&created.id).await.unwrap();
        assert_eq!(fetched, created);
        assert_eq!(ProductDraft::from(&fetched), input);
    }

    #[tokio::test]
    async fn listing_is_newest_first() {
        let service = service();
        for name in ["first", "second", "third"] {
            service
                .create_product(draft(name, Category::Home, 1.0, 1.0))
                .await
                .unwrap();
            tokio::time::sleep(std::time::Duration::from_millis(2)).await;
        }

        let names: Vec<String> = service
            .get_products(None)
            .await
            .unwrap()
            .into_iter()
            .map(|p| p.name)
            .collect();
        assert_eq!(names, vec!["third", "second", "first"]);
    }

    #[tokio::test]
    async fn combined_filter_is_a_conjunction() {
        let service = service();
        for (price, rating) in [(5.0, 3.0), (12.0, 4.5), (18.0, 5.0), (25.0, 2.0), (15.0, 4.0)] {
            service
                .create_product(draft(&format!("Book {}", price), Category::Books, price, rating))
                .await
                .unwrap();
        }
        service
            .create_product(draft("Radio", Category::Electronics, 15.0, 5.0))
            .await
            .unwrap();

        let filter = ProductFilter {
            category: Some(Category::Books),
            min_price: Some(10.0),
            max_price: Some(20.0),
            min_rating: Some(4.0),
            search_query: None,
        };
        let mut found: Vec<(f64, f64)> = service
            .get_products(Some(&filter))
            .await
            .unwrap()
            .into_iter()
            .map(|p| (p.price, p.rating))
            .collect();
        found.sort_by(|a, b| a.0.total_cmp(&b.0));

        // The 18.0 book is rated 5.0, so it satisfies every bound as well.
        assert_eq!(found, vec![(12.0, 4.5), (15.0, 4.0), (18.0, 5.0)]);
    }

    #[tokio::test]
    async fn search_matches_name_or_description_case_insensitively() {
        let service = service();
        let mut lamp = draft("Lamp", Category::Home, 10.0, 3.0);
        lamp.description = "Warm DESK light".to_string();
        service.create_product(lamp).await.unwrap();
        service
            .create_product(draft("Desk", Category::Home, 80.0, 4.0))
            .await
            .unwrap();
        service
            .create_product(draft("Chair", Category::Home, 40.0, 4.0))
            .await
            .unwrap();

        let filter = ProductFilter {
            search_query: Some("desk".to_string()),
            ..ProductFilter::default()
        };
        let products = service.get_products(Some(&filter)).await.unwrap();
        let mut names: Vec<&str> = products.iter().map(|p| p.name.as_str()).collect();
        names.sort();
        assert_eq!(names, vec!["Desk", "Lamp"]);
        assert!(products.iter().all(|p| filter.matches(p)));
    }

    #[tokio::test]
    async fn update_writes_only_patched_fields() {
        let service = service();
        let created = service
            .create_product(draft("Scarf", Category::Clothing, 15.0, 3.5))
            .await
            .unwrap();

        let patch = ProductPatch {
            price: Some(12.0),
            ..ProductPatch::default()
        };
        let updated = service.update_product(&created.id, patch).await.unwrap();

        assert_eq!(updated.price, 12.0);
        assert_eq!(updated.name, created.name);
        assert_eq!(updated.id, created.id);
        assert_eq!(updated.created_at, created.created_at);
    }

    #[tokio::test]
    async fn update_of_missing_product_names_the_id() {
        let service = service();
        let patch = ProductPatch {
            rating: Some(3.0),
            ..ProductPatch::default()
        };
        let err = service.update_product("ghost", patch).await.unwrap_err();
        assert_eq!(err.kind, PersistenceKind::NotFound);
        assert!(err.message.contains("ghost"));
    }

    #[tokio::test]
    async fn delete_removes_from_listing_and_lookup() {
        let service = service();
        let keep = service
            .create_product(draft("Keep", Category::Books, 1.0, 1.0))
            .await
            .unwrap();
        let gone = service
            .create_product(draft("Gone", Category::Books, 1.0, 1.0))
            .await
            .unwrap();

        service.delete_product(&gone.id).await.unwrap();

        let remaining = service.get_products(None).await.unwrap();
        assert_eq!(remaining, vec![keep]);

        let err = service.get_product_by_id(&gone.id).await.unwrap_err();
        assert_eq!(err.kind, PersistenceKind::NotFound);

        let err = service.delete_product(&gone.id).await.unwrap_err();
        assert!(err.message.contains(&gone.id));
    }
}
