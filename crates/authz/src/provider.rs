use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use catalog_db::{Query, Row, Store};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::RwLock;
use validator::Validate;

use crate::password::{hash_password, verify_password};
use crate::token::{self, TokenConfig};
use crate::AuthError;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Session {
    pub access_token: String,
    pub user: User,
    pub expires_at: DateTime<Utc>,
}

/// Sign-up, sign-in, sign-out and token resolution.
#[async_trait]
pub trait AuthProvider: Send + Sync {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError>;

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError>;

    /// Resolve a bearer token to the user it was issued for.
    async fn authenticate(&self, access_token: &str) -> Result<User, AuthError>;

    /// Rebuild the session for a token issued earlier and still valid.
    async fn resume(&self, access_token: &str) -> Result<Session, AuthError>;
}

#[derive(Debug, Validate)]
struct Credentials {
    #[validate(email)]
    email: String,
    #[validate(length(min = 6))]
    password: String,
}

#[derive(Debug, Deserialize)]
struct UserRecord {
    id: String,
    email: String,
    password_hash: String,
    created_at: DateTime<Utc>,
}

impl From<UserRecord> for User {
    fn from(record: UserRecord) -> Self {
        User {
            id: record.id,
            email: record.email,
            created_at: record.created_at,
        }
    }
}

/// Accounts kept in a table of the configured [`Store`].
pub struct StoreAuthProvider {
    store: Arc<dyn Store>,
    table: String,
    tokens: TokenConfig,
    /// Signed-out token ids with their `exp`, dropped once the token could no
    /// longer validate anyway.
    revoked: RwLock<HashMap<String, i64>>,
}

impl StoreAuthProvider {
    pub fn new(store: Arc<dyn Store>, table: impl Into<String>, tokens: TokenConfig) -> Self {
        Self {
            store,
            table: table.into(),
            tokens,
            revoked: RwLock::new(HashMap::new()),
        }
    }

    async fn find_one(&self, column: &str, value: &str) -> Result<Option<UserRecord>, AuthError> {
        let rows = self
            .store
            .select(&Query::from(self.table.as_str()).eq(column, value))
            .await?;
        rows.into_iter().next().map(decode).transpose()
    }

    fn open_session(&self, user: User) -> Result<Session, AuthError> {
        let (access_token, expires_at) = token::issue(&user.id, &user.email, &self.tokens)
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        Ok(Session {
            access_token,
            user,
            expires_at,
        })
    }

    async fn claims(&self, access_token: &str) -> Result<token::Claims, AuthError> {
        let claims =
            token::validate(access_token, &self.tokens).map_err(|_| AuthError::Unauthenticated)?;
        if self.revoked.read().await.contains_key(&claims.jti) {
            return Err(AuthError::Unauthenticated);
        }
        Ok(claims)
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn check_credentials(email: &str, password: &str) -> Result<(), AuthError> {
    let credentials = Credentials {
        email: email.to_string(),
        password: password.to_string(),
    };
    match credentials.validate() {
        Ok(()) => Ok(()),
        Err(errors) if errors.field_errors().contains_key("email") => Err(
            AuthError::InvalidInput("a valid email address is required".to_string()),
        ),
        Err(_) => Err(AuthError::InvalidInput(
            "password must be at least 6 characters".to_string(),
        )),
    }
}

fn decode(row: Row) -> Result<UserRecord, AuthError> {
    serde_json::from_value(Value::Object(row))
        .map_err(|err| AuthError::Backend(format!("malformed user row: {}", err)))
}

#[async_trait]
impl AuthProvider for StoreAuthProvider {
    async fn sign_up(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        check_credentials(&email, password)?;

        if self.find_one("email", &email).await?.is_some() {
            return Err(AuthError::EmailTaken);
        }

        let password_hash =
            hash_password(password).map_err(|err| AuthError::Backend(err.to_string()))?;

        let mut row = Row::new();
        row.insert("email".to_string(), Value::String(email));
        row.insert("password_hash".to_string(), Value::String(password_hash));
        row.insert(
            "created_at".to_string(),
            Value::String(Utc::now().to_rfc3339()),
        );

        let record = decode(self.store.insert(&self.table, row).await?)?;
        tracing::info!(user_id = %record.id, "account created");
        self.open_session(record.into())
    }

    async fn sign_in(&self, email: &str, password: &str) -> Result<Session, AuthError> {
        let email = normalize_email(email);
        let record = self
            .find_one("email", &email)
            .await?
            .ok_or(AuthError::InvalidCredentials)?;

        let matches = verify_password(password, &record.password_hash)
            .map_err(|err| AuthError::Backend(err.to_string()))?;
        if !matches {
            tracing::debug!("sign-in rejected");
            return Err(AuthError::InvalidCredentials);
        }

        tracing::info!(user_id = %record.id, "signed in");
        self.open_session(record.into())
    }

    async fn sign_out(&self, access_token: &str) -> Result<(), AuthError> {
        let claims = self.claims(access_token).await?;
        let now = Utc::now().timestamp();
        let mut revoked = self.revoked.write().await;
        revoked.retain(|_, exp| *exp + token::LEEWAY_SECS >= now);
        revoked.insert(claims.jti.clone(), claims.exp);
        drop(revoked);
        tracing::info!(user_id = %claims.sub, "signed out");
        Ok(())
    }

    async fn authenticate(&self, access_token: &str) -> Result<User, AuthError> {
        let claims = self.claims(access_token).await?;
        self.find_one("id", &claims.sub)
            .await?
            .map(User::from)
            .ok_or(AuthError::Unauthenticated)
    }

    async fn resume(&self, access_token: &str) -> Result<Session, AuthError> {
        let claims = self.claims(access_token).await?;
        let user = self
            .find_one("id", &claims.sub)
            .await?
            .map(User::from)
            .ok_or(AuthError::Unauthenticated)?;
        let expires_at =
            DateTime::from_timestamp(claims.exp, 0).ok_or(AuthError::Unauthenticated)?;
        Ok(Session {
            access_token: access_token.to_string(),
            user,
            expires_at,
        })
    }
}
