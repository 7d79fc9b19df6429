//! Account endpoints under `/api/auth`.
//!
//! Sign-up and log-in answer with the session as JSON and also set the
//! `catalog_session` cookie so the browser pages can authenticate.

use async_trait::async_trait;
use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use axum::routing::{get, post};
use axum::{Json, Router};
use catalog_authz::{Session, User};
use catalog_http::auth::SESSION_COOKIE;
use catalog_http::{AppError, AuthHandle, CurrentUser};
use catalog_kernel::{InitCtx, Module};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;

#[derive(Debug, Deserialize)]
pub struct CredentialsBody {
    pub email: String,
    pub password: String,
}

pub struct AuthModule {
    auth: AuthHandle,
}

impl AuthModule {
    pub fn new(auth: AuthHandle) -> Self {
        Self { auth }
    }
}

#[async_trait]
impl Module for AuthModule {
    fn name(&self) -> &'static str {
        "auth"
    }

    async fn init(&self, ctx: &InitCtx<'_>) -> anyhow::Result<()> {
        tracing::info!(
            module = self.name(),
            session_ttl_minutes = ctx.settings.auth.session_ttl_minutes,
            "auth module initialized"
        );
        Ok(())
    }

    fn routes(&self) -> Router {
        Router::new()
            .route("/signup", post(sign_up))
            .route("/login", post(log_in))
            .route("/logout", post(log_out))
            .route("/session", get(current_session))
            .with_state(self.auth.clone())
    }

    fn openapi(&self) -> Option<serde_json::Value> {
        let credentials = serde_json::json!({
            "required": true,
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Credentials" }
                }
            }
        });
        let session = serde_json::json!({
            "description": "Signed in; also sets the catalog_session cookie",
            "content": {
                "application/json": {
                    "schema": { "$ref": "#/components/schemas/Session" }
                }
            }
        });
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

        Some(serde_json::json!({
            "paths": {
                "/signup": {
                    "post": {
                        "summary": "Create an account and sign in",
                        "tags": ["Auth"],
                        "requestBody": credentials.clone(),
                        "responses": {
                            "200": session.clone(),
                            "409": error("Email already registered"),
                            "422": error("Malformed email or short password")
                        }
                    }
                },
                "/login": {
                    "post": {
                        "summary": "Sign in with email and password",
                        "tags": ["Auth"],
                        "requestBody": credentials,
                        "responses": {
                            "200": session,
                            "401": error("Invalid credentials")
                        }
                    }
                },
                "/logout": {
                    "post": {
                        "summary": "Revoke the current session",
                        "tags": ["Auth"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "204": { "description": "Signed out; the cookie is cleared" },
                            "401": error("Not signed in")
                        }
                    }
                },
                "/session": {
                    "get": {
                        "summary": "Who is signed in",
                        "tags": ["Auth"],
                        "security": [{ "bearer": [] }],
                        "responses": {
                            "200": {
                                "description": "The signed-in user",
                                "content": {
                                    "application/json": {
                                        "schema": { "$ref": "#/components/schemas/User" }
                                    }
                                }
                            },
                            "401": error("Not signed in")
                        }
                    }
                }
            },
            "components": {
                "schemas": {
                    "Credentials": {
                        "type": "object",
                        "properties": {
                            "email": { "type": "string", "format": "email" },
                            "password": { "type": "string", "minLength": 6 }
                        },
                        "required": ["email", "password"]
                    },
                    "User": {
                        "type": "object",
                        "properties": {
                            "id": { "type": "string" },
                            "email": { "type": "string" },
                            "created_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["id", "email", "created_at"]
                    },
                    "Session": {
                        "type": "object",
                        "properties": {
                            "access_token": { "type": "string" },
                            "user": { "$ref": "#/components/schemas/User" },
                            "expires_at": { "type": "string", "format": "date-time" }
                        },
                        "required": ["access_token", "user", "expires_at"]
                    }
                }
            }
        }))
    }
}

async fn sign_up(
    State(AuthHandle(provider)): State<AuthHandle>,
    payload: Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let session = provider.sign_up(&body.email, &body.password).await?;
    tracing::info!(user_id = %session.user.id, "account created");
    with_cookie(session)
}

async fn log_in(
    State(AuthHandle(provider)): State<AuthHandle>,
    payload: Result<Json<CredentialsBody>, JsonRejection>,
) -> Result<impl IntoResponse, AppError> {
    let Json(body) = payload?;
    let session = provider.sign_in(&body.email, &body.password).await?;
    with_cookie(session)
}

async fn log_out(
    State(AuthHandle(provider)): State<AuthHandle>,
    caller: CurrentUser,
) -> Result<impl IntoResponse, AppError> {
    provider.sign_out(&caller.access_token).await?;
    let mut headers = HeaderMap::new();
    headers.insert(
        header::SET_COOKIE,
        HeaderValue::from_str(&session_cookie("", 0))
            .map_err(|err| AppError::Internal(err.into()))?,
    );
    Ok((StatusCode::NO_CONTENT, headers))
}

async fn current_session(caller: CurrentUser) -> Json<User> {
    Json(caller.user)
}

fn with_cookie(session: Session) -> Result<impl IntoResponse, AppError> {
    let max_age = (session.expires_at - Utc::now()).num_seconds().max(0);
    let cookie = HeaderValue::from_str(&session_cookie(&session.access_token, max_age))
        .map_err(|err| AppError::Internal(err.into()))?;

    let mut headers = HeaderMap::new();
    headers.insert(header::SET_COOKIE, cookie);
    Ok((headers, Json(session)))
}

fn session_cookie(token: &str, max_age: i64) -> String {
    format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        SESSION_COOKIE, token, max_age
    )
}

pub fn create_module(auth: AuthHandle) -> Arc<dyn Module> {
    Arc::new(AuthModule::new(auth))
}
