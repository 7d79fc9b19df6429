//! Product catalog: models, filtering, validation, the data service and the
//! list/form view state, plus the `/api/products` routes.

pub mod error;
pub mod filter;
pub mod filter_state;
pub mod models;
pub mod routes;
pub mod service;
pub mod validation;
pub mod view;

use std::sync::Arc;

use async_trait::async_trait;
use axum::Router;
use catalog_http::AuthHandle;
use catalog_kernel::{InitCtx, Module};
use strum::IntoEnumIterator;

pub use error::{PersistenceError, ProductError};
pub use filter::ProductFilter;
pub use filter_state::{FilterEdit, FilterState};
pub use models::{Category, Product, ProductDraft, ProductPatch};
pub use routes::ProductsState;
pub use service::ProductService;
pub use validation::{ProductForm, ValidationError};
pub use view::CatalogView;

pub struct ProductsModule {
    state: ProductsState,
}

impl ProductsModule {
    pub fn new(service: Arc<ProductService>, auth: AuthHandle) -> Self {
        Self {
            state: ProductsState { service, auth },
        }
    }
}

#[async_trait]
impl Module for ProductsModule {
    fn name(&self) -> &'static str {
        "products"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            table = %ctx.settings.database.products_table,
            "products module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        routes::router(self.state.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let categories: Vec<String> = Category::iter().map(|c| c.to_string()).collect();
        let error = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/ErrorResponse" }
                    }
                }
            })
        };
        let product = |description: &str| {
            serde_json::json!({
                "description": description,
                "content": {
                    "application/json": {
                        "schema": { "$ref": "#/components/schemas/Product" }
                    }
                }
            })
        };
        let id_param = serde_json::json!({
            "name": "id", "in": "path", "required": true, "schema": { "type": "string" }
        });
        let number_query = |name: &str| {
            serde_json::json!({
                "name": name, "in": "query", "required": false, "schema": { "type": "number" }
            })
        };

        Some(serde_json::json!({
            "paths": {
                "/": {
                    "get": {
                        "summary": "List products, newest first",
                        "tags": ["Products"],
                        "security": [{ "bearer": [] }],
                        "parameters": [
                            {
                                "name": "category", "in": "query", "required": false,
                                "schema": { "type": "string", "enum": categories }
                            },
                            number_query("minPrice"),
                            number_query("maxPrice"),
                            number_query("minRating"),
                            {
                                "name": "searchQuery", "in": "query", "required": false,
                                "schema": { "type": "string" }
                            }
                        ],
                        "responses": {
                            "200": {
                                "description": "Matching products",
                                "content": {
                                    "application/json": {
                                        "schema": {
                                            "type": "array",
                                            "items": { "$ref": "#/components/schemas/Product" }
                                        }
                                    }
                                }
                            },
                            "401": error("Not signed in"),
                            "503": error("Data backend unreachable")
                        }
                    },
                    "post": {
                        "summary": "Create a product",
                        "tags": ["Products"],
                        "security": [{ "bearer": [] }],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ProductDraft" }
                                }
                            }
                        },
                        "responses": {
                            "201": product("Created product"),
                            "401": error("Not signed in"),
                            "422": error("Validation error")
                        }
                    }
                },
                "/{id}": {
                    "get": {
                        "summary": "Fetch one product",
                        "tags": ["Products"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param.clone()],
                        "responses": {
                            "200": product("The product"),
                            "404": error("No product with this id")
                        }
                    },
                    "patch": {
                        "summary": "Update some fields of a product",
                        "tags": ["Products"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param.clone()],
                        "requestBody": {
                            "required": true,
                            "content": {
                                "application/json": {
                                    "schema": { "$ref": "#/components/schemas/ProductPatch" }
                                }
                            }
                        },
                        "responses": {
                            "200": product("Updated product"),
                            "404": error("No product with this id"),
                            "422": error("Validation error")
                        }
                    },
                    "delete": {
                        "summary": "Delete a product",
                        "tags": ["Products"],
                        "security": [{ "bearer": [] }],
                        "parameters": [id_param],
                        "responses": {
                            "204": { "description": "Deleted" },
                            "404": error("No product with this id")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Product": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "name": { "type": "string" },
                            "description": { "type": "string" },
                            "category": { "type": "string", "enum": categories },
                            "price": { "type": "number", "minimum": 0 },
                            "rating": { "type": "number", "minimum": 0, "maximum": 5 },
                            "created_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "name", "description", "category", "price", "rating", "created_at"]
                    },
                    "ProductDraft": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "description": { "type": "string" },
                            "category": { "type": "string", "enum": categories },
                            "price": { "type": "number", "minimum": 0 },
                            "rating": { "type": "number", "minimum": 0, "maximum": 5 }
                        },
                        "required": ["name", "description", "category", "price", "rating"],
                        "additionalProperties": false
                    },
                    "ProductPatch": {
                        "type": "object",
                        "properties": {
                            "name": { "type": "string" },
                            "description": { "type": "string" },
                            "category": { "type": "string", "enum": categories },
                            "price": { "type": "number", "minimum": 0 },
                            "rating": { "type": "number", "minimum": 0, "maximum": 5 }
                        },
                        "additionalProperties": false
                    }
                }
            }
        }))
    }
}

pub fn create_module(service: Arc<ProductService>, auth: AuthHandle) -> Arc<dyn Module> {
    Arc::new(ProductsModule::new(service, auth))
}
