//! Pre-submission checks for product input.
//!
//! Rules run in a fixed order and the first failure wins: name, description,
//! category, price, rating. Nothing here touches the network.

use thiserror::Error;

use super::models::{Category, Product, ProductDraft, ProductPatch};

pub const MAX_RATING: f64 = 5.0;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Name is required")]
    NameRequired,

    #[error("Description is required")]
    DescriptionRequired,

    #[error("Category is required")]
    CategoryRequired,

    #[error("Unknown category '{0}'")]
    UnknownCategory(String),

    #[error("Price must be a number greater than or equal to 0")]
    InvalidPrice,

    #[error("Rating must be a number between 0 and 5")]
    InvalidRating,
}

impl ValidationError {
    pub fn field(&self) -> &'static str {
        match self {
            ValidationError::NameRequired => "name",
            ValidationError::DescriptionRequired => "description",
            ValidationError::CategoryRequired | ValidationError::UnknownCategory(_) => "category",
            ValidationError::InvalidPrice => "price",
            ValidationError::InvalidRating => "rating",
        }
    }
}

/// Raw form input, exactly as typed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductForm {
    pub name: String,
    pub description: String,
    pub category: String,
    pub price: String,
    pub rating: String,
}

impl ProductForm {
    /// Prefill for editing an existing product.
    pub fn from_product(product: &Product) -> Self {
        Self {
            name: product.name.clone(),
            description: product.description.clone(),
            category: product.category.to_string(),
            price: product.price.to_string(),
            rating: product.rating.to_string(),
        }
    }

    pub fn validate(&self) -> Result<ProductDraft, ValidationError> {
        check_name(&self.name)?;
        check_description(&self.description)?;
        let category = parse_category(&self.category)?;
        let price = parse_number(&self.price).ok_or(ValidationError::InvalidPrice)?;
        check_price(price)?;
        let rating = parse_number(&self.rating).ok_or(ValidationError::InvalidRating)?;
        check_rating(rating)?;

        Ok(ProductDraft {
            name: self.name.trim().to_string(),
            description: self.description.trim().to_string(),
            category,
            price,
            rating,
        })
    }
}

/// Typed input gets the same checks as the form, minus parsing. Text fields
/// come back trimmed, so what is stored is what was checked.
pub fn validate_draft(mut draft: ProductDraft) -> Result<ProductDraft, ValidationError> {
    draft.name = draft.name.trim().to_string();
    draft.description = draft.description.trim().to_string();
    check_name(&draft.name)?;
    check_description(&draft.description)?;
    check_price(draft.price)?;
    check_rating(draft.rating)?;
    Ok(draft)
}

/// Checks only the fields a patch carries, trimming text fields it keeps.
pub fn validate_patch(mut patch: ProductPatch) -> Result<ProductPatch, ValidationError> {
    if let Some(name) = patch.name.as_mut() {
        *name = name.trim().to_string();
        check_name(name)?;
    }
    if let Some(description) = patch.description.as_mut() {
        *description = description.trim().to_string();
        check_description(description)?;
    }
    if let Some(price) = patch.price {
        check_price(price)?;
    }
    if let Some(rating) = patch.rating {
        check_rating(rating)?;
    }
    Ok(patch)
}

fn check_name(name: &str) -> Result<(), ValidationError> {
    if name.trim().is_empty() {
        return Err(ValidationError::NameRequired);
    }
    Ok(())
}

fn check_description(description: &str) -> Result<(), ValidationError> {
    if description.trim().is_empty() {
        return Err(ValidationError::DescriptionRequired);
    }
    Ok(())
}

fn parse_category(raw: &str) -> Result<Category, ValidationError> {
    let raw = raw.trim();
    if raw.is_empty() {
        return Err(ValidationError::CategoryRequired);
    }
    raw.parse()
        .map_err(|_| ValidationError::UnknownCategory(raw.to_string()))
}

fn parse_number(raw: &str) -> Option<f64> {
    raw.trim().parse::<f64>().ok().filter(|value| value.is_finite())
}

fn check_price(price: f64) -> Result<(), ValidationError> {
    if !price.is_finite() || price < 0.0 {
        return Err(ValidationError::InvalidPrice);
    }
    Ok(())
}

fn check_rating(rating: f64) -> Result<(), ValidationError> {
    if !(0.0..=MAX_RATING).contains(&rating) {
        return Err(ValidationError::InvalidRating);
    }
    Ok(())
}
