//! Browser pages: sign-in, sign-up, and the product list behind them.
//!
//! `/` requires a valid `catalog_session` cookie and redirects to `/login`
//! otherwise. The list page renders the committed filter from its query
//! string; create, edit and delete go through `/api/products` from the page
//! script. Each row carries an edit form prefilled from the product, and
//! saving it sends only the fields whose value changed.

use std::fmt::Write as _;
use std::sync::Arc;

use async_trait::async_trait;
use axum::extract::{Query, State};
use axum::http::HeaderMap;
use axum::response::{Html, IntoResponse, Redirect, Response};
use axum::routing::get;
use axum::Router;
use catalog_http::auth::{cookie, SESSION_COOKIE};
use catalog_http::AppError;
use catalog_kernel::Module;
use serde::Deserialize;
use strum::IntoEnumIterator;

use super::products::{Category, ProductFilter, ProductsState};

pub struct WebModule {
    state: ProductsState,
}

impl WebModule {
    pub fn new(state: ProductsState) -> Self {
        Self { state }
    }
}

#[async_trait]
impl Module for WebModule {
    fn name(&self) -> &'static str {
        "web"
    }

    fn pages(&self) -> Router {
        Router::new()
            .route("/", get(catalog_page))
            .route("/login", get(|| async { Html(auth_page(AuthPage::Login)) }))
            .route("/signup", get(|| async { Html(auth_page(AuthPage::Signup)) }))
            .with_state(self.state.clone())
    }
}

pub fn create_module(state: ProductsState) -> Arc<dyn Module> {
    Arc::new(WebModule::new(state))
}

/// The filter form as a browser submits it: every field present, possibly blank.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FilterForm {
    category: Option<String>,
    min_price: Option<String>,
    max_price: Option<String>,
    min_rating: Option<String>,
    search_query: Option<String>,
}

impl FilterForm {
    /// Blank or unparsable fields impose no constraint.
    fn into_filter(self) -> ProductFilter {
        fn number(raw: Option<String>) -> Option<f64> {
            raw.and_then(|v| v.trim().parse::<f64>().ok())
                .filter(|v| v.is_finite())
        }
        ProductFilter {
            category: self.category.and_then(|v| v.trim().parse().ok()),
            min_price: number(self.min_price),
            max_price: number(self.max_price),
            min_rating: number(self.min_rating),
            search_query: self.search_query.filter(|v| !v.is_empty()),
        }
    }
}

async fn catalog_page(
    State(state): State<ProductsState>,
    headers: HeaderMap,
    Query(form): Query<FilterForm>,
) -> Result<Response, AppError> {
    let filter = form.into_filter();
    let Some(token) = cookie(&headers, SESSION_COOKIE).filter(|t| !t.is_empty()) else {
        return Ok(Redirect::to("/login").into_response());
    };
    let user = match state.auth.0.authenticate(token).await {
        Ok(user) => user,
        Err(err) => {
            tracing::debug!(%err, "stale session cookie");
            return Ok(Redirect::to("/login").into_response());
        }
    };

    let products = state.service.get_products(Some(&filter)).await?;

    let mut rows = String::new();
    for product in &products {
        let _ = write!(
            rows,
            "<tr><td>{name}</td><td>{description}</td><td>{category}</td><td>{price:.2}</td><td>{rating:.1}</td>\
             <td><details><summary>Edit</summary><form class=\"edit\" data-id=\"{id}\">\
             <input name=\"name\" value=\"{name}\" required>\
             <input name=\"description\" value=\"{description}\" required>\
             <select name=\"category\">{options}</select>\
             <input name=\"price\" type=\"number\" step=\"any\" min=\"0\" value=\"{price}\" required>\
             <input name=\"rating\" type=\"number\" step=\"any\" min=\"0\" max=\"5\" value=\"{rating}\" required>\
             <button type=\"submit\">Save</button></form></details>\
             <button data-id=\"{id}\" class=\"delete\">Delete</button></td></tr>",
            name = escape(&product.name),
            description = escape(&product.description),
            category = product.category,
            price = product.price,
            rating = product.rating,
            options = category_options(Some(product.category)),
            id = escape(&product.id),
        );
    }
    if products.is_empty() {
        rows.push_str("<tr><td colspan=\"6\">No products match.</td></tr>");
    }

    let body = format!(
        r#"<header><span>{email}</span> <button id="logout">Log out</button></header>
<form method="get" action="/">
  <select name="category"><option value="">All categories</option>{category_options}</select>
  <input name="minPrice" type="number" step="any" min="0" placeholder="Min price" value="{min_price}">
  <input name="maxPrice" type="number" step="any" min="0" placeholder="Max price" value="{max_price}">
  <input name="minRating" type="number" step="any" min="0" max="5" placeholder="Min rating" value="{min_rating}">
  <input name="searchQuery" placeholder="Search" value="{search}">
  <button type="submit">Apply</button>
</form>
<table>
  <thead><tr><th>Name</th><th>Description</th><th>Category</th><th>Price</th><th>Rating</th><th></th></tr></thead>
  <tbody>{rows}</tbody>
</table>
<h2>New product</h2>
<form id="create">
  <input name="name" placeholder="Name" required>
  <input name="description" placeholder="Description" required>
  <select name="category" required>{create_options}</select>
  <input name="price" type="number" step="any" min="0" placeholder="Price" required>
  <input name="rating" type="number" step="any" min="0" max="5" placeholder="Rating" required>
  <button type="submit">Create</button>
</form>
<p id="error"></p>
<script>
const error = document.getElementById("error");
async function send(method, url, body) {{
  const res = await fetch(url, {{ method, headers: {{ "Content-Type": "application/json" }}, body: body && JSON.stringify(body) }});
  if (!res.ok) {{ error.textContent = (await res.json()).error.message; return false; }}
  return true;
}}
document.getElementById("create").addEventListener("submit", async (e) => {{
  e.preventDefault();
  const f = new FormData(e.target);
  const ok = await send("POST", "/api/products", {{
    name: f.get("name"), description: f.get("description"), category: f.get("category"),
    price: Number(f.get("price")), rating: Number(f.get("rating"))
  }});
  if (ok) location.reload();
}});
document.querySelectorAll("form.edit").forEach((form) => form.addEventListener("submit", async (e) => {{
  e.preventDefault();
  const patch = {{}};
  for (const field of form.elements) {{
    if (!field.name) continue;
    const initial = field.tagName === "SELECT"
      ? [...field.options].find((o) => o.defaultSelected)?.value
      : field.defaultValue;
    if (field.value === initial) continue;
    patch[field.name] = field.type === "number" ? Number(field.value) : field.value;
  }}
  if (Object.keys(patch).length === 0) return;
  if (await send("PATCH", "/api/products/" + form.dataset.id, patch)) location.reload();
}}));
document.querySelectorAll("button.delete").forEach((b) => b.addEventListener("click", async () => {{
  if (confirm("Delete this product?") && await send("DELETE", "/api/products/" + b.dataset.id)) location.reload();
}}));
document.getElementById("logout").addEventListener("click", async () => {{
  await fetch("/api/auth/logout", {{ method: "POST" }});
  location.href = "/login";
}});
</script>"#,
        email = escape(&user.email),
        category_options = category_options(filter.category),
        create_options = category_options(None),
        min_price = number_value(filter.min_price),
        max_price = number_value(filter.max_price),
        min_rating = number_value(filter.min_rating),
        search = escape(filter.search_query.as_deref().unwrap_or("")),
    );

    Ok(Html(layout("Products", &body)).into_response())
}

#[derive(Clone, Copy)]
enum AuthPage {
    Login,
    Signup,
}

fn auth_page(page: AuthPage) -> String {
    let (title, endpoint, other_href, other_label) = match page {
        AuthPage::Login => ("Log in", "/api/auth/login", "/signup", "Create an account"),
        AuthPage::Signup => ("Sign up", "/api/auth/signup", "/login", "Already registered? Log in"),
    };
    let body = format!(
        r#"<h1>{title}</h1>
<form id="auth">
  <input name="email" type="email" placeholder="Email" required>
  <input name="password" type="password" minlength="6" placeholder="Password" required>
  <button type="submit">{title}</button>
</form>
<p id="error"></p>
<a href="{other_href}">{other_label}</a>
<script>
document.getElementById("auth").addEventListener("submit", async (e) => {{
  e.preventDefault();
  const f = new FormData(e.target);
  const res = await fetch("{endpoint}", {{
    method: "POST",
    headers: {{ "Content-Type": "application/json" }},
    body: JSON.stringify({{ email: f.get("email"), password: f.get("password") }})
  }});
  if (res.ok) {{ location.href = "/"; return; }}
  document.getElementById("error").textContent = (await res.json()).error.message;
}});
</script>"#
    );
    layout(title, &body)
}

fn layout(title: &str, body: &str) -> String {
    format!(
        "<!doctype html>\n<html><head><meta charset=\"utf-8\"><title>{} · Catalog</title></head>\n<body>\n{}\n</body></html>",
        escape(title),
        body
    )
}

fn category_options(selected: Option<Category>) -> String {
    Category::iter()
        .map(|category| {
            let marker = if Some(category) == selected { " selected" } else { "" };
            format!("<option value=\"{0}\"{1}>{0}</option>", category, marker)
        })
        .collect()
}

fn number_value(value: Option<f64>) -> String {
    value.map(|v| v.to_string()).unwrap_or_default()
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            other => out.push(other),
        }
    }
    out
}
