//! Client-side session holder.
//!
//! An [`AuthContext`] is created once at a client's composition root and
//! handed to whatever needs to know who is signed in. It is cheap to clone;
//! clones share the same session.

use std::sync::Arc;

use tokio::sync::RwLock;

use crate::{AuthError, AuthProvider, Session, User};

#[derive(Debug, Clone, Default)]
struct AuthState {
    session: Option<Session>,
    loading: bool,
}

#[derive(Clone)]
pub struct AuthContext {
    provider: Arc<dyn AuthProvider>,
    state: Arc<RwLock<AuthState>>,
}

impl AuthContext {
    pub fn new(provider: Arc<dyn AuthProvider>) -> Self {
        Self {
            provider,
            state: Arc::new(RwLock::new(AuthState::default())),
        }
    }

    pub async fn user(&self) -> Option<User> {
        self.state
            .read()
            .await
            .session
            .as_ref()
            .map(|session| session.user.clone())
    }

    pub async fn session(&self) -> Option<Session> {
        self.state.read().await.session.clone()
    }

    /// True while a sign-in or sign-up call is in flight.
    pub async fn is_loading(&self) -> bool {
        self.state.read().await.loading
    }

    pub async fn sign_in(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.set_loading(true).await;
        let outcome = self.provider.sign_in(email, password).await;
        self.settle(outcome).await
    }

    pub async fn sign_up(&self, email: &str, password: &str) -> Result<User, AuthError> {
        self.set_loading(true).await;
        let outcome = self.provider.sign_up(email, password).await;
        self.settle(outcome).await
    }

    /// Adopt a previously issued token, e.g. one kept by the client between runs.
    pub async fn restore(&self, access_token: &str) -> Result<User, AuthError> {
        self.set_loading(true).await;
        let outcome = self.provider.resume(access_token).await;
        self.settle(outcome).await
    }

    /// Revoke the current session and forget it. A no-op when signed out.
    pub async fn sign_out(&self) -> Result<(), AuthError> {
        let session = self.state.write().await.session.take();
        match session {
            Some(session) => self.provider.sign_out(&session.access_token).await,
            None => Ok(()),
        }
    }

    async fn set_loading(&self, loading: bool) {
        self.state.write().await.loading = loading;
    }

    async fn settle(&self, outcome: Result<Session, AuthError>) -> Result<User, AuthError> {
        let mut state = self.state.write().await;
        state.loading = false;
        let session = outcome?;
        let user = session.user.clone();
        state.session = Some(session);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{StoreAuthProvider, TokenConfig};
    use catalog_db::MemoryStore;
    use chrono::Duration;

    fn context() -> AuthContext {
        let store = Arc::new(MemoryStore::new().with_unique("users", "email"));
        let provider = StoreAuthProvider::new(
            store,
            "users",
            TokenConfig {
                secret: "test-secret".to_string(),
                ttl: Duration::minutes(30),
            },
        );
        AuthContext::new(Arc::new(provider))
    }

    #[tokio::test]
    async fn starts_signed_out() {
        let ctx = context();
        assert!(ctx.user().await.is_none());
        assert!(!ctx.is_loading().await);
        assert!(ctx.sign_out().await.is_ok());
    }

    #[tokio::test]
    async fn sign_up_populates_and_sign_out_clears() {
        let ctx = context();
        let user = ctx.sign_up("ada@example.com", "hunter22").await.unwrap();
        assert_eq!(ctx.user().await, Some(user));
        assert!(!ctx.is_loading().await);

        let clone = ctx.clone();
        clone.sign_out().await.unwrap();
        assert!(ctx.user().await.is_none());
    }

    #[tokio::test]
    async fn restore_adopts_a_live_token_only() {
        let ctx = context();
        ctx.sign_up("grace@example.com", "hopper1").await.unwrap();
        let token = ctx.session().await.unwrap().access_token;

        let other = AuthContext::new(ctx.provider.clone());
        let user = other.restore(&token).await.unwrap();
        assert_eq!(user.email, "grace@example.com");

        ctx.sign_out().await.unwrap();
        let fresh = AuthContext::new(ctx.provider.clone());
        assert_eq!(
            fresh.restore(&token).await.unwrap_err(),
            AuthError::Unauthenticated
        );
        assert!(fresh.user().await.is_none());
    }

    #[tokio::test]
    async fn failed_sign_in_keeps_state_and_clears_loading() {
        let ctx = context();
        let err = ctx.sign_in("ada@example.com", "hunter22").await.unwrap_err();
        assert_eq!(err, AuthError::InvalidCredentials);
        assert!(ctx.session().await.is_none());
        assert!(!ctx.is_loading().await);
    }
}
