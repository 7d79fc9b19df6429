use std::sync::Arc;

use axum::extract::rejection::{JsonRejection, PathRejection, QueryRejection};
use axum::extract::{FromRef, Path, Query, State};
use axum::http::StatusCode;
use axum::routing::get;
use axum::{Json, Router};
use catalog_http::{AppError, AuthHandle, CurrentUser};

use super::filter::ProductFilter;
use super::models::{Product, ProductDraft, ProductPatch};
use super::service::ProductService;
use super::validation::{validate_draft, validate_patch};

#[derive(Clone)]
pub struct ProductsState {
    pub service: Arc<ProductService>,
    pub auth: AuthHandle,
}

impl FromRef<ProductsState> for AuthHandle {
    fn from_ref(state: &ProductsState) -> Self {
        state.auth.clone()
    }
}

pub fn router(state: ProductsState) -> Router {
    Router::new()
        .route("/", get(list_products).post(create_product))
        .route(
            "/{id}",
            get(get_product).patch(update_product).delete(delete_product),
        )
        .with_state(state)
}

async fn list_products(
    State(state): State<ProductsState>,
    _caller: CurrentUser,
    query: Result<Query<ProductFilter>, QueryRejection>,
) -> Result<Json<Vec<Product>>, AppError> {
    let Query(filter) = query?;
    let products = state.service.get_products(Some(&filter)).await?;
    Ok(Json(products))
}

async fn create_product(
    State(state): State<ProductsState>,
    caller: CurrentUser,
    payload: Result<Json<ProductDraft>, JsonRejection>,
) -> Result<(StatusCode, Json<Product>), AppError> {
    let Json(draft) = payload?;
    let draft = validate_draft(draft)?;
    let product = state.service.create_product(draft).await?;
    tracing::debug!(user_id = %caller.user.id, product_id = %product.id, "created via api");
    Ok((StatusCode::CREATED, Json(product)))
}

async fn get_product(
    State(state): State<ProductsState>,
    _caller: CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = path?;
    Ok(Json(state.service.get_product_by_id(&id).await?))
}

async fn update_product(
    State(state): State<ProductsState>,
    _caller: CurrentUser,
    path: Result<Path<String>, PathRejection>,
    payload: Result<Json<ProductPatch>, JsonRejection>,
) -> Result<Json<Product>, AppError> {
    let Path(id) = path?;
    let Json(patch) = payload?;
    let patch = validate_patch(patch)?;
    Ok(Json(state.service.update_product(&id, patch).await?))
}

async fn delete_product(
    State(state): State<ProductsState>,
    _caller: CurrentUser,
    path: Result<Path<String>, PathRejection>,
) -> Result<StatusCode, AppError> {
    let Path(id) = path?;
    state.service.delete_product(&id).await?;
    Ok(StatusCode::NO_CONTENT)
}
