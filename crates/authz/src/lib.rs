//! Authentication for the catalog: account storage, session tokens, and the
//! client-side [`AuthContext`].

pub mod context;
pub mod error;
pub mod password;
pub mod provider;
pub mod token;

pub use context::AuthContext;
pub use error::AuthError;
pub use provider::{AuthProvider, Session, StoreAuthProvider, User};
pub use token::TokenConfig;
