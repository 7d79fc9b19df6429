use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumIter, EnumString};

/// Fixed set of catalog categories.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
    AsRefStr,
)]
#[strum(ascii_case_insensitive)]
#[serde(try_from = "String")]
pub enum Category {
    Electronics,
    Clothing,
    Books,
    Home,
}

/// Incoming JSON and query strings accept any letter case, like `FromStr`.
impl TryFrom<String> for Category {
    type Error = strum::ParseError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.trim().parse()
    }
}

/// A stored catalog item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Product {
    /// Assigned by the backend on insert.
    pub id: String,
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: f64,
    /// Between 0 and 5 inclusive.
    pub rating: f64,
    /// Assigned on creation; newest first is the only listing order.
    pub created_at: DateTime<Utc>,
}

/// Fields a caller supplies to create a product.
///
/// `id` and `created_at` are absent by construction and rejected when sent.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProductDraft {
    pub name: String,
    pub description: String,
    pub category: Category,
    pub price: f64,
    pub rating: f64,
}

/// Partial update. Only present fields are written.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct ProductPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<Category>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub price: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rating: Option<f64>,
}

impl ProductPatch {
    pub fn is_empty(&self) -> bool {
        self == &ProductPatch::default()
    }

    /// Fields of `draft` that differ from `original`.
    pub fn diff(original: &Product, draft: &ProductDraft) -> Self {
        fn changed<T: PartialEq + Clone>(before: &T, after: &T) -> Option<T> {
            (before != after).then(|| after.clone())
        }

        Self {
            name: changed(&original.name, &draft.name),
            description: changed(&original.description, &draft.description),
            category: changed(&original.category, &draft.category),
            price: changed(&original.price, &draft.price),
            rating: changed(&original.rating, &draft.rating),
        }
    }
}

impl From<&Product> for ProductDraft {
    fn from(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category,
            price: product.price,
            rating: product.rating,
        }
    }
}
