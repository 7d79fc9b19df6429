//! Token authentication for handlers: `Authorization: Bearer` first, then the
//! session cookie set by the browser sign-in pages.

use std::sync::Arc;

use axum::extract::{FromRef, FromRequestParts};
use axum::http::{header, request::Parts, HeaderMap};
use catalog_authz::{AuthProvider, User};

use crate::error::AppError;

/// Cookie carrying the access token for browser page routes.
pub const SESSION_COOKIE: &str = "catalog_session";

/// Shared handle to the auth provider, extracted from router state.
#[derive(Clone)]
pub struct AuthHandle(pub Arc<dyn AuthProvider>);

/// Authenticated caller resolved from the request's access token.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub user: User,
    pub access_token: String,
}

impl<S> FromRequestParts<S> for CurrentUser
where
    S: Send + Sync,
    AuthHandle: FromRef<S>,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let token = access_token(&parts.headers)
            .ok_or_else(|| AppError::unauthorized("missing access token"))?
            .to_string();

        let AuthHandle(provider) = AuthHandle::from_ref(state);
        let user = provider.authenticate(&token).await?;

        Ok(CurrentUser {
            user,
            access_token: token,
        })
    }
}

/// Bearer token if present, otherwise the session cookie.
pub fn access_token(headers: &HeaderMap) -> Option<&str> {
    bearer_token(headers).or_else(|| cookie(headers, SESSION_COOKIE).filter(|v| !v.is_empty()))
}

pub fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

/// Value of the named cookie, if the request carries one.
pub fn cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value)
}
