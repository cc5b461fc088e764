//! Admin Auth Library
//!
//! Stateless administrator authentication: credential registration with
//! Argon2id hashing, HS256 bearer tokens, and a per-request gate that turns
//! a token into an explicit request identity.
//!
//! ## Modules
//!
//! - [`domain`] - Core domain types (principals)
//! - [`infra`] - Principal stores (PostgreSQL, in-memory)
//! - [`auth`] - Hashing, credentials, tokens and the request gate
//! - [`api`] - REST API routes and error responses
//! - [`server`] - Configuration and HTTP bootstrap

pub mod api;
pub mod auth;
pub mod domain;
pub mod infra;
pub mod server;

// Re-export commonly used types
pub use domain::{NewPrincipal, Principal, PrincipalId, PrincipalView};

pub use auth::{
    AuthError, CredentialHasher, CredentialService, RequestIdentity, TokenError, TokenService,
};

pub use infra::{PrincipalStore, StoreError};
