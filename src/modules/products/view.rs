//! State behind an interactive product list with create/edit/delete forms.
//!
//! The view owns the two-phase filter, the currently displayed products and
//! the loading flag. Every successful mutation is followed by a full re-fetch
//! with the committed filter; failures leave the displayed list untouched.
//! A mutation that went through is reported as such even when the re-fetch
//! after it fails; that failure is kept in [`CatalogView::last_error`].

use std::sync::Arc;

use super::error::ProductError;
use super::filter_state::{FilterEdit, FilterState};
use super::models::{Product, ProductPatch};
use super::service::ProductService;
use super::validation::ProductForm;

pub struct CatalogView {
    service: Arc<ProductService>,
    filters: FilterState,
    products: Vec<Product>,
    loading: bool,
    fetches: u64,
    last_error: Option<ProductError>,
}

impl CatalogView {
    pub fn new(service: Arc<ProductService>) -> Self {
        Self {
            service,
            filters: FilterState::new(),
            products: Vec::new(),
            loading: false,
            fetches: 0,
            last_error: None,
        }
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    pub fn products(&self) -> &[Product] {
        &self.products
    }

    pub fn is_loading(&self) -> bool {
        self.loading
    }

    /// Number of list requests issued so far.
    pub fn fetch_count(&self) -> u64 {
        self.fetches
    }

    /// Why the most recent re-fetch failed, cleared by the next one that succeeds.
    pub fn last_error(&self) -> Option<&ProductError> {
        self.last_error.as_ref()
    }

    /// Change the draft filter. Never fetches.
    pub fn edit_filter(&mut self, edit: FilterEdit) {
        self.filters.edit(edit);
    }

    pub fn clear_filter(&mut self) {
        self.filters.clear_draft();
    }

    /// Commit the draft and fetch once with it.
    pub async fn apply_filters(&mut self) -> Result<&[Product], ProductError> {
        self.filters.commit();
        self.refresh().await
    }

    /// Re-fetch with the committed filter, replacing the displayed list wholesale.
    pub async fn refresh(&mut self) -> Result<&[Product], ProductError> {
        self.loading = true;
        self.fetches += 1;
        let result = self
            .service
            .get_products(Some(self.filters.committed()))
            .await;
        self.loading = false;

        match result {
            Ok(products) => {
                self.last_error = None;
                self.products = products;
                Ok(&self.products)
            }
            Err(err) => {
                let err = ProductError::from(err);
                self.last_error = Some(err.clone());
                Err(err)
            }
        }
    }

    async fn refresh_after_mutation(&mut self) {
        if let Err(err) = self.refresh().await {
            tracing::warn!(%err, "list refresh after mutation failed");
        }
    }

    pub async fn load(&self, id: &str) -> Result<Product, ProductError> {
        Ok(self.service.get_product_by_id(id).await?)
    }

    /// Validate, create, then refresh.
    pub async fn submit_create(&mut self, form: &ProductForm) -> Result<Product, ProductError> {
        let draft = form.validate()?;
        let created = self.service.create_product(draft).await?;
        self.refresh_after_mutation().await;
        Ok(created)
    }

    /// Validate the edited form and send only the fields that changed.
    pub async fn submit_edit(
        &mut self,
        original: &Product,
        form: &ProductForm,
    ) -> Result<Product, ProductError> {
        let draft = form.validate()?;
        let patch = ProductPatch::diff(original, &draft);
        let updated = self.service.update_product(&original.id, patch).await?;
        self.refresh_after_mutation().await;
        Ok(updated)
    }

    /// Delete after the caller has obtained confirmation, then refresh.
    pub async fn confirm_delete(&mut self, id: &str) -> Result<(), ProductError> {
        self.service.delete_product(id).await?;
        self.refresh_after_mutation().await;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::products::models::Category;
    use crate::modules::products::validation::ValidationError;
    use async_trait::async_trait;
    use catalog_db::{DbError, MemoryStore, Query, Row, Store};
    use std::sync::atomic::{AtomicBool, Ordering};

    /// Writes go through; reads fail while `reads_down` is set.
    #[derive(Default)]
    struct FlakyReads {
        inner: MemoryStore,
        reads_down: AtomicBool,
    }

    #[async_trait]
    impl Store for FlakyReads {
        async fn select(&self, query: &Query) -> Result<Vec<Row>, DbError> {
            if self.reads_down.load(Ordering::SeqCst) {
                return Err(DbError::Transport("connection reset".to_string()));
            }
            self.inner.select(query).await
        }

        async fn insert(&self, table: &str, row: Row) -> Result<Row, DbError> {
            self.inner.insert(table, row).await
        }

        async fn update(&self, table: &str, id: &str, patch: Row) -> Result<Row, DbError> {
            self.inner.update(table, id, patch).await
        }

        async fn delete(&self, table: &str, id: &str) -> Result<(), DbError> {
            self.inner.delete(table, id).await
        }
    }

    fn view() -> CatalogView {
        let service = ProductService::new(Arc::new(MemoryStore::new()), "products");
        CatalogView::new(Arc::new(service))
    }

    fn form(name: &str, category: &str, price: &str, rating: &str) -> ProductForm {
        ProductForm {
            name: name.to_string(),
            description: format!("{} for testing", name),
            category: category.to_string(),
            price: price.to_string(),
            rating: rating.to_string(),
        }
    }

    #[tokio::test]
    async fn draft_edits_do_not_fetch_until_applied() {
        let mut view = view();
        view.submit_create(&form("Novel", "Books", "12", "4.5"))
            .await
            .unwrap();
        view.submit_create(&form("Toaster", "Home", "30", "4"))
            .await
            .unwrap();
        let before = view.fetch_count();

        view.edit_filter(FilterEdit::Category(Some(Category::Books)));
        view.edit_filter(FilterEdit::MinPrice(Some(10.0)));
        assert_eq!(view.fetch_count(), before);
        assert_eq!(view.products().len(), 2);

        let shown = view.apply_filters().await.unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].name, "Novel");
        assert_eq!(view.fetch_count(), before + 1);
        assert!(!view.is_loading());
    }

    #[tokio::test]
    async fn invalid_form_never_reaches_the_service() {
        let mut view = view();
        let err = view
            .submit_create(&form("Kettle", "Home", "-1", "3"))
            .await
            .unwrap_err();
        assert_eq!(err, ProductError::Validation(ValidationError::InvalidPrice));
        assert_eq!(view.fetch_count(), 0);
        assert!(view.refresh().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn edit_sends_changes_and_refreshes() {
        let mut view = view();
        let created = view
            .submit_create(&form("Jacket", "Clothing", "80", "4"))
            .await
            .unwrap();

        let mut edit = ProductForm::from_product(&created);
        edit.rating = "5".to_string();
        let updated = view.submit_edit(&created, &edit).await.unwrap();

        assert_eq!(updated.rating, 5.0);
        assert_eq!(view.products()[0].rating, 5.0);

        edit.rating = "5.1".to_string();
        let err = view.submit_edit(&created, &edit).await.unwrap_err();
        assert_eq!(err, ProductError::Validation(ValidationError::InvalidRating));
        assert_eq!(view.products()[0].rating, 5.0);
    }

    #[tokio::test]
    async fn delete_refreshes_list_and_failure_keeps_it() {
        let mut view = view();
        let created = view
            .submit_create(&form("Mug", "Home", "8", "3"))
            .await
            .unwrap();
        assert_eq!(view.products().len(), 1);

        view.confirm_delete(&created.id).await.unwrap();
        assert!(view.products().is_empty());

        let err = view.confirm_delete(&created.id).await.unwrap_err();
        assert!(matches!(err, ProductError::Persistence(_)));
        assert!(view.load(&created.id).await.is_err());
    }

    #[tokio::test]
    async fn mutation_succeeds_even_when_refresh_fails() {
        let store = Arc::new(FlakyReads::default());
        let service = Arc::new(ProductService::new(store.clone(), "products"));
        let mut view = CatalogView::new(service.clone());

        let kept = view
            .submit_create(&form("Lamp", "Home", "25", "4"))
            .await
            .unwrap();
        assert!(view.last_error().is_none());

        store.reads_down.store(true, Ordering::SeqCst);
        let created = view
            .submit_create(&form("Sofa", "Home", "400", "5"))
            .await
            .unwrap();
        assert_eq!(created.name, "Sofa");
        assert!(matches!(
            view.last_error(),
            Some(ProductError::Persistence(_))
        ));
        assert_eq!(view.products().len(), 1);

        view.confirm_delete(&kept.id).await.unwrap();
        assert!(view.last_error().is_some());

        store.reads_down.store(false, Ordering::SeqCst);
        let shown = view.refresh().await.unwrap();
        assert_eq!(shown.len(), 1);
        assert_eq!(shown[0].id, created.id);
        assert!(view.last_error().is_none());
    }
}
