//! Store backed by a hosted PostgREST-compatible endpoint.

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde_json::Value;

use crate::{DbError, Filter, Query, Row, Store};

/// Talks to `{base_url}/{table}` using PostgREST query syntax.
#[derive(Clone)]
pub struct RestStore {
    client: Client,
    base_url: String,
    api_key: Option<String>,
}

impl RestStore {
    pub fn new(base_url: impl Into<String>, api_key: Option<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
        }
    }

    fn endpoint(&self, table: &str) -> String {
        format!("{}/{}", self.base_url, table)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.header("apikey", key).bearer_auth(key),
            None => request,
        }
    }

    async fn send(&self, request: RequestBuilder) -> Result<Response, DbError> {
        let response = self
            .authorize(request)
            .send()
            .await
            .map_err(|err| DbError::Transport(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body).unwrap_or_else(|| status.to_string());
        tracing::warn!(status = status.as_u16(), %message, "rest backend rejected request");

        Err(match status {
            StatusCode::CONFLICT => DbError::Constraint(message),
            _ => DbError::Query(message),
        })
    }

    async fn representation(&self, request: RequestBuilder) -> Result<Vec<Row>, DbError> {
        let response = self
            .send(request.header("Prefer", "return=representation"))
            .await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|err| DbError::Decode(err.to_string()))
    }
}

#[async_trait]
impl Store for RestStore {
    async fn select(&self, query: &Query) -> Result<Vec<Row>, DbError> {
        let mut params = vec![("select".to_string(), "*".to_string())];
        params.extend(render_params(query));

        let response = self
            .send(self.client.get(self.endpoint(query.table())).query(&params))
            .await?;
        response
            .json::<Vec<Row>>()
            .await
            .map_err(|err| DbError::Decode(err.to_string()))
    }

    async fn insert(&self, table: &str, mut row: Row) -> Result<Row, DbError> {
        row.remove("id");
        let request = self.client.post(self.endpoint(table)).json(&row);
        self.representation(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::Decode("insert returned no representation".to_string()))
    }

    async fn update(&self, table: &str, id: &str, mut patch: Row) -> Result<Row, DbError> {
        patch.remove("id");
        let request = self
            .client
            .patch(self.endpoint(table))
            .query(&[("id", format!("eq.{}", id))])
            .json(&patch);
        self.representation(request)
            .await?
            .into_iter()
            .next()
            .ok_or_else(|| DbError::not_found(table, id))
    }

    async fn delete(&self, table: &str, id: &str) -> Result<(), DbError> {
        let request = self
            .client
            .delete(self.endpoint(table))
            .query(&[("id", format!("eq.{}", id))]);
        if self.representation(request).await?.is_empty() {
            return Err(DbError::not_found(table, id));
        }
        Ok(())
    }
}

/// Translate a [`Query`] into PostgREST query parameters.
pub fn render_params(query: &Query) -> Vec<(String, String)> {
    let mut params = Vec::new();
    for filter in query.filters() {
        match filter {
            Filter::Or(branches) => {
                let inner: Vec<String> = branches.iter().map(render_nested).collect();
                params.push(("or".to_string(), format!("({})", inner.join(","))));
            }
            other => {
                if let Some((column, operator, value)) = split(other) {
                    params.push((column.to_string(), format!("{}.{}", operator, value)));
                }
            }
        }
    }

    if let Some(order) = query.ordering() {
        let direction = if order.descending { "desc" } else { "asc" };
        params.push(("order".to_string(), format!("{}.{}", order.column, direction)));
    }

    params
}

fn render_nested(filter: &Filter) -> String {
    match filter {
        Filter::Or(branches) => {
            let inner: Vec<String> = branches.iter().map(render_nested).collect();
            format!("or({})", inner.join(","))
        }
        other => match split(other) {
            Some((column, operator, value)) => {
                format!("{}.{}.{}", column, operator, quote(&value))
            }
            None => String::new(),
        },
    }
}

/// Column, operator and operand of a leaf filter. `None` for `Or`.
fn split(filter: &Filter) -> Option<(&str, &'static str, String)> {
    let parts = match filter {
        Filter::Eq(column, Value::Null) => (column.as_str(), "is", "null".to_string()),
        Filter::Eq(column, value) => (column.as_str(), "eq", scalar(value)),
        Filter::Gte(column, value) => (column.as_str(), "gte", scalar(value)),
        Filter::Lte(column, value) => (column.as_str(), "lte", scalar(value)),
        Filter::ILike(column, pattern) => (column.as_str(), "ilike", pattern.clone()),
        Filter::Or(_) => return None,
    };
    Some(parts)
}

fn scalar(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

const RESERVED: &[char] = &[',', '.', ':', '(', ')', '"', '\\'];

/// Values inside logic trees must be double-quoted when they contain reserved characters.
fn quote(value: &str) -> String {
    if value.contains(RESERVED) {
        let escaped = value.replace('\\', "\\\\").replace('"', "\\\"");
        format!("\"{}\"", escaped)
    } else {
        value.to_string()
    }
}

fn error_message(body: &str) -> Option<String> {
    let parsed: Value = serde_json::from_str(body).ok()?;
    parsed
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn param<'a>(params: &'a [(String, String)], key: &str) -> Vec<&'a str> {
        params
            .iter()
            .filter(|(k, _)| k == key)
            .map(|(_, v)| v.as_str())
            .collect()
    }

    #[test]
    fn renders_conjunctive_filters_and_order() {
        let query = Query::from("products")
            .eq("category", "Books")
            .gte("price", 10)
            .lte("price", 20.5)
            .gte("rating", 4)
            .order("created_at", true);

        let params = render_params(&query);
        assert_eq!(param(&params, "category"), vec!["eq.Books"]);
        assert_eq!(param(&params, "price"), vec!["gte.10", "lte.20.5"]);
        assert_eq!(param(&params, "rating"), vec!["gte.4"]);
        assert_eq!(param(&params, "order"), vec!["created_at.desc"]);
    }

    #[test]
    fn renders_or_group_with_quoting() {
        let query = Query::from("products").or(vec![
            Filter::ilike("name", "%lamp%"),
            Filter::ilike("description", "%a,b%"),
        ]);

        let params = render_params(&query);
        assert_eq!(
            param(&params, "or"),
            vec!["(name.ilike.%lamp%,description.ilike.\"%a,b%\")"]
        );
    }

    #[test]
    fn null_equality_uses_is() {
        let params = render_params(&Query::from("products").eq("deleted_at", Value::Null));
        assert_eq!(param(&params, "deleted_at"), vec!["is.null"]);
    }

    #[test]
    fn extracts_backend_error_message() {
        let body = r#"{"code":"23505","message":"duplicate key value","details":null}"#;
        assert_eq!(error_message(body).as_deref(), Some("duplicate key value"));
        assert_eq!(error_message("not json"), None);
    }

    #[test]
    fn trims_trailing_slash_from_base_url() {
        let store = RestStore::new("http://localhost:3000/rest/v1/", None);
        assert_eq!(
            store.endpoint("products"),
            "http://localhost:3000/rest/v1/products"
        );
    }
}
