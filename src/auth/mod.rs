//! Authentication Module
//! Mission: Bearer token issuance, validation, expiry, and revocation

pub mod api;
pub mod errors;
pub mod jwt;
pub mod mailer;
pub mod middleware;
pub mod models;
pub mod token_store;
pub mod user_store;

pub use api::AuthState;
pub use errors::AuthFailure;
pub use jwt::{TokenIssuer, TokenValidator};
pub use mailer::Mailer;
pub use middleware::{auth_middleware, optional_auth_middleware};
pub use token_store::TokenStore;
pub use user_store::UserStore;
