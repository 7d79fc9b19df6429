//! Backend-neutral query description.
//!
//! A [`Query`] is a table name, a conjunction of [`Filter`]s and an optional
//! [`Order`]. Backends either evaluate it directly ([`Filter::matches`]) or
//! translate it into their own dialect.

use std::cmp::Ordering;

use serde_json::Value;

/// A stored record. Column names map to JSON values.
pub type Row = serde_json::Map<String, Value>;

/// A single predicate over one row.
#[derive(Debug, Clone, PartialEq)]
pub enum Filter {
    Eq(String, Value),
    Gte(String, Value),
    Lte(String, Value),
    /// Case-insensitive SQL `LIKE`: `%` matches any run, `_` one character, `\` escapes.
    ILike(String, String),
    /// At least one of the inner filters must hold.
    Or(Vec<Filter>),
}

impl Filter {
    pub fn eq(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Eq(column.into(), value.into())
    }

    pub fn gte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Gte(column.into(), value.into())
    }

    pub fn lte(column: impl Into<String>, value: impl Into<Value>) -> Self {
        Self::Lte(column.into(), value.into())
    }

    pub fn ilike(column: impl Into<String>, pattern: impl Into<String>) -> Self {
        Self::ILike(column.into(), pattern.into())
    }

    /// Evaluate the predicate. Missing columns and mismatched types never match.
    pub fn matches(&self, row: &Row) -> bool {
        match self {
            Filter::Eq(column, expected) => row
                .get(column)
                .is_some_and(|actual| compare(actual, expected) == Some(Ordering::Equal)),
            Filter::Gte(column, bound) => row.get(column).is_some_and(|actual| {
                matches!(
                    compare(actual, bound),
                    Some(Ordering::Greater | Ordering::Equal)
                )
            }),
            Filter::Lte(column, bound) => row.get(column).is_some_and(|actual| {
                matches!(compare(actual, bound), Some(Ordering::Less | Ordering::Equal))
            }),
            Filter::ILike(column, pattern) => row
                .get(column)
                .and_then(Value::as_str)
                .is_some_and(|text| like_matches(pattern, text)),
            Filter::Or(filters) => filters.iter().any(|filter| filter.matches(row)),
        }
    }
}

/// Sort instruction applied after filtering.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    pub column: String,
    pub descending: bool,
}

/// Query builder for a single table. Filters combine conjunctively.
#[derive(Debug, Clone, PartialEq)]
pub struct Query {
    table: String,
    filters: Vec<Filter>,
    order: Option<Order>,
}

impl Query {
    pub fn from(table: impl Into<String>) -> Self {
        Self {
            table: table.into(),
            filters: Vec::new(),
            order: None,
        }
    }

    pub fn filter(mut self, filter: Filter) -> Self {
        self.filters.push(filter);
        self
    }

    pub fn eq(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::eq(column, value))
    }

    pub fn gte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::gte(column, value))
    }

    pub fn lte(self, column: &str, value: impl Into<Value>) -> Self {
        self.filter(Filter::lte(column, value))
    }

    pub fn ilike(self, column: &str, pattern: impl Into<String>) -> Self {
        self.filter(Filter::ilike(column, pattern))
    }

    pub fn or(self, filters: Vec<Filter>) -> Self {
        self.filter(Filter::Or(filters))
    }

    pub fn order(mut self, column: &str, descending: bool) -> Self {
        self.order = Some(Order {
            column: column.to_string(),
            descending,
        });
        self
    }

    pub fn table(&self) -> &str {
        &self.table
    }

    pub fn filters(&self) -> &[Filter] {
        &self.filters
    }

    pub fn ordering(&self) -> Option<&Order> {
        self.order.as_ref()
    }

    pub fn matches(&self, row: &Row) -> bool {
        self.filters.iter().all(|filter| filter.matches(row))
    }

    /// Stable sort by the requested column; rows lacking the column sort last.
    pub fn sort(&self, rows: &mut [Row]) {
        let Some(order) = &self.order else {
            return;
        };

        rows.sort_by(|a, b| {
            let ordering = match (a.get(&order.column), b.get(&order.column)) {
                (Some(x), Some(y)) => compare(x, y).unwrap_or(Ordering::Equal),
                (Some(_), None) => return Ordering::Less,
                (None, Some(_)) => return Ordering::Greater,
                (None, None) => Ordering::Equal,
            };
            if order.descending {
                ordering.reverse()
            } else {
                ordering
            }
        });
    }
}

/// Compare two JSON scalars of the same kind.
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => x.as_f64()?.partial_cmp(&y.as_f64()?),
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        (Value::Null, Value::Null) => Some(Ordering::Equal),
        _ => None,
    }
}

/// Escape `%`, `_` and `\` so `text` matches literally inside a LIKE pattern.
pub fn escape_like(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum Token {
    Any,
    One,
    Lit(char),
}

fn tokenize(pattern: &str) -> Vec<Token> {
    let mut tokens = Vec::new();
    let mut chars = pattern.chars();
    while let Some(c) = chars.next() {
        let token = match c {
            '%' => Token::Any,
            '_' => Token::One,
            '\\' => Token::Lit(chars.next().unwrap_or('\\')),
            other => Token::Lit(other),
        };
        tokens.push(token);
    }
    tokens
}

fn chars_equal_ignore_case(a: char, b: char) -> bool {
    a == b || a.to_lowercase().eq(b.to_lowercase())
}

/// Case-insensitive LIKE match with single-star backtracking.
pub fn like_matches(pattern: &str, text: &str) -> bool {
    let tokens = tokenize(pattern);
    let text: Vec<char> = text.chars().collect();

    let (mut t, mut p) = (0usize, 0usize);
    let mut backtrack: Option<(usize, usize)> = None;

    while t < text.len() {
        match tokens.get(p) {
            Some(Token::Any) => {
                backtrack = Some((p, t));
                p += 1;
            }
            Some(Token::One) => {
                p += 1;
                t += 1;
            }
            Some(Token::Lit(c)) if chars_equal_ignore_case(*c, text[t]) => {
                p += 1;
                t += 1;
            }
            _ => match backtrack {
                Some((star_p, star_t)) => {
                    p = star_p + 1;
                    t = star_t + 1;
                    backtrack = Some((star_p, star_t + 1));
                }
                None => return false,
            },
        }
    }

    tokens[p..].iter().all(|token| *token == Token::Any)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn row(value: Value) -> Row {
        value.as_object().cloned().unwrap()
    }

    #[test]
    fn like_is_case_insensitive_substring() {
        assert!(like_matches("%phone%", "Smart PHONE case"));
        assert!(like_matches("%", ""));
        assert!(!like_matches("%tablet%", "Smart phone"));
        assert!(like_matches("b_ok", "Book"));
        assert!(!like_matches("b_ok", "Brook"));
    }

    #[test]
    fn escaped_wildcards_match_literally() {
        let pattern = format!("%{}%", escape_like("100%"));
        assert!(like_matches(&pattern, "now 100% cotton"));
        assert!(!like_matches(&pattern, "now 1000 cotton"));

        let pattern = format!("%{}%", escape_like("a_b"));
        assert!(like_matches(&pattern, "xa_by"));
        assert!(!like_matches(&pattern, "xacby"));
    }

    #[test]
    fn range_filters_compare_numbers_inclusively() {
        let r = row(json!({"price": 10.0}));
        assert!(Filter::gte("price", 10).matches(&r));
        assert!(Filter::lte("price", 10).matches(&r));
        assert!(!Filter::gte("price", 10.5).matches(&r));
    }

    #[test]
    fn missing_or_mismatched_columns_never_match() {
        let r = row(json!({"price": "cheap"}));
        assert!(!Filter::gte("price", 1).matches(&r));
        assert!(!Filter::eq("category", "Books").matches(&r));
    }

    #[test]
    fn or_requires_any_branch() {
        let r = row(json!({"name": "Lamp", "description": "Warm desk light"}));
        let filter = Filter::Or(vec![
            Filter::ilike("name", "%desk%"),
            Filter::ilike("description", "%desk%"),
        ]);
        assert!(filter.matches(&r));

        let filter = Filter::Or(vec![
            Filter::ilike("name", "%chair%"),
            Filter::ilike("description", "%chair%"),
        ]);
        assert!(!filter.matches(&r));
    }

    #[test]
    fn sort_descending_keeps_ties_stable() {
        let mut rows = vec![
            row(json!({"id": "a", "created_at": "2024-01-01"})),
            row(json!({"id": "b", "created_at": "2024-03-01"})),
            row(json!({"id": "c", "created_at": "2024-01-01"})),
        ];
        Query::from("products")
            .order("created_at", true)
            .sort(&mut rows);

        let ids: Vec<&str> = rows.iter().map(|r| r["id"].as_str().unwrap()).collect();
        assert_eq!(ids, vec!["b", "a", "c"]);
    }
}
