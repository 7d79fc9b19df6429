use catalog_db::{escape_like, Filter, Query};
use serde::{Deserialize, Serialize};

use super::models::{Category, Product};

/// Client-side description of which products to list. Never persisted.
///
/// Every present field narrows the result; absent fields impose nothing.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductFilter {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_rating: Option<f64>,
    /// Case-insensitive substring of name or description. Empty means no constraint.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub search_query: Option<String>,
}

impl ProductFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none()
            && self.min_price.is_none()
            && self.max_price.is_none()
            && self.min_rating.is_none()
            && self.search_term().is_none()
    }

    pub fn search_term(&self) -> Option<&str> {
        self.search_query.as_deref().filter(|text| !text.is_empty())
    }

    /// Listing query: conjunction of every present field, newest first.
    pub fn to_query(&self, table: &str) -> Query {
        let mut query = Query::from(table);

        if let Some(category) = self.category {
            query = query.eq("category", category.as_ref());
        }
        if let Some(min_price) = self.min_price {
            query = query.gte("price", min_price);
        }
        if let Some(max_price) = self.max_price {
            query = query.lte("price", max_price);
        }
        if let Some(min_rating) = self.min_rating {
            query = query.gte("rating", min_rating);
        }
        if let Some(text) = self.search_term() {
            let pattern = format!("%{}%", escape_like(text));
            query = query.or(vec![
                Filter::ilike("name", pattern.clone()),
                Filter::ilike("description", pattern),
            ]);
        }

        query.order("created_at", true)
    }

    /// Same semantics as [`to_query`](Self::to_query), evaluated locally.
    pub fn matches(&self, product: &Product) -> bool {
        self.category.map_or(true, |c| c == product.category)
            && self.min_price.map_or(true, |min| product.price >= min)
            && self.max_price.map_or(true, |max| product.price <= max)
            && self.min_rating.map_or(true, |min| product.rating >= min)
            && self.search_term().map_or(true, |text| {
                let needle = text.to_lowercase();
                product.name.to_lowercase().contains(&needle)
                    || product.description.to_lowercase().contains(&needle)
            })
    }
}
