//! Draft and committed filters.
//!
//! Edits only ever replace the draft. The committed filter changes on an
//! explicit [`FilterState::commit`], and only the committed filter is used to
//! fetch.

use super::filter::ProductFilter;
use super::models::Category;

/// One field-level edit of the draft filter. `None` clears the field.
#[derive(Debug, Clone, PartialEq)]
pub enum FilterEdit {
    Category(Option<Category>),
    MinPrice(Option<f64>),
    MaxPrice(Option<f64>),
    MinRating(Option<f64>),
    Search(Option<String>),
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct FilterState {
    draft: ProductFilter,
    committed: ProductFilter,
}

impl FilterState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn draft(&self) -> &ProductFilter {
        &self.draft
    }

    pub fn committed(&self) -> &ProductFilter {
        &self.committed
    }

    /// True when committing would change what gets fetched.
    pub fn is_dirty(&self) -> bool {
        self.draft != self.committed
    }

    pub fn edit(&mut self, edit: FilterEdit) {
        let mut next = self.draft.clone();
        match edit {
            FilterEdit::Category(value) => next.category = value,
            FilterEdit::MinPrice(value) => next.min_price = value,
            FilterEdit::MaxPrice(value) => next.max_price = value,
            FilterEdit::MinRating(value) => next.min_rating = value,
            FilterEdit::Search(value) => next.search_query = value,
        }
        self.draft = next;
    }

    /// Copy the draft into the committed slot and return it for fetching.
    pub fn commit(&mut self) -> &ProductFilter {
        self.committed = self.draft.clone();
        &self.committed
    }

    /// Clear the draft only; the committed filter stays until the next commit.
    pub fn clear_draft(&mut self) {
        self.draft = ProductFilter::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn edits_touch_only_the_draft() {
        let mut state = FilterState::new();
        state.edit(FilterEdit::Category(Some(Category::Books)));
        state.edit(FilterEdit::MinPrice(Some(10.0)));

        assert_eq!(state.draft().category, Some(Category::Books));
        assert_eq!(state.draft().min_price, Some(10.0));
        assert_eq!(state.committed(), &ProductFilter::default());
        assert!(state.is_dirty());
    }

    #[test]
    fn commit_copies_draft() {
        let mut state = FilterState::new();
        state.edit(FilterEdit::Search(Some("lamp".to_string())));
        let committed = state.commit().clone();

        assert_eq!(committed.search_query.as_deref(), Some("lamp"));
        assert!(!state.is_dirty());

        state.edit(FilterEdit::Search(None));
        assert_eq!(state.committed().search_query.as_deref(), Some("lamp"));
    }

    #[test]
    fn clearing_draft_keeps_committed() {
        let mut state = FilterState::new();
        state.edit(FilterEdit::MinRating(Some(4.0)));
        state.commit();
        state.clear_draft();

        assert!(state.draft().is_empty());
        assert_eq!(state.committed().min_rating, Some(4.0));
    }
}
