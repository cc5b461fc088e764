//! Authentication and authorization for admin-auth
//!
//! Administrators authenticate once with an identity key (email) and secret,
//! receive a short-lived signed bearer token, and present it on every
//! subsequent request. No server-side session exists: a token is valid purely
//! as a function of its own content, the signing key and the wall clock.
//!
//! # Components
//!
//! - [`CredentialHasher`]: Argon2id hashing and constant-time verification
//! - [`CredentialService`]: registration and login against a
//!   [`PrincipalStore`](crate::infra::PrincipalStore)
//! - [`TokenService`]: HS256 JWT issuance and validation
//! - [`RequestGate`] / [`auth_middleware`]: per-request interception that
//!   establishes the [`RequestIdentity`]
//!
//! # Authorization Model
//!
//! There is a single implicit role. A handler is authorized when the request
//! carries an authenticated identity; see [`RequestIdentity::require_admin`].
//!
//! # Configuration
//!
//! - `JWT_SECRET`: HMAC signing key, at least 32 bytes
//! - `JWT_EXPIRATION_MS`: token lifetime in milliseconds (default one day)
//! - `HASH_MEMORY_KIB` / `HASH_ITERATIONS`: Argon2 work factor

mod credentials;
mod jwt;
mod middleware;
mod password;

pub use credentials::*;
pub use jwt::*;
pub use middleware::*;
pub use password::*;

use crate::domain::{Principal, PrincipalId};
use crate::infra::StoreError;

/// Authenticated administrator attached to a request
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedAdmin {
    /// Principal ID
    pub principal_id: PrincipalId,

    /// Identity key (token subject)
    pub identity_key: String,

    /// Display name
    pub display_name: String,
}

impl From<&Principal> for AuthenticatedAdmin {
    fn from(principal: &Principal) -> Self {
        Self {
            principal_id: principal.id,
            identity_key: principal.identity_key.clone(),
            display_name: principal.display_name.clone(),
        }
    }
}

/// Per-request identity context.
///
/// Built fresh by the request gate for every inbound request and handed to
/// handlers explicitly through request extensions. Empty means the request
/// is unauthenticated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequestIdentity {
    admin: Option<AuthenticatedAdmin>,
}

impl RequestIdentity {
    /// Unauthenticated identity
    pub fn anonymous() -> Self {
        Self { admin: None }
    }

    /// Authenticated identity
    pub fn authenticated(admin: AuthenticatedAdmin) -> Self {
        Self { admin: Some(admin) }
    }

    pub fn is_authenticated(&self) -> bool {
        self.admin.is_some()
    }

    pub fn admin(&self) -> Option<&AuthenticatedAdmin> {
        self.admin.as_ref()
    }

    /// Validated token subject, if any
    pub fn subject(&self) -> Option<&str> {
        self.admin.as_ref().map(|a| a.identity_key.as_str())
    }

    /// Route-level authorization: the request must carry an administrator
    pub fn require_admin(&self) -> Result<&AuthenticatedAdmin, AuthError> {
        self.admin.as_ref().ok_or(AuthError::MissingAuth)
    }
}

/// Reason a bearer token was rejected.
///
/// Distinguishable internally for diagnostics; callers see a uniform
/// unauthorized response.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
pub enum TokenError {
    #[error("malformed token")]
    Malformed,

    #[error("bad signature")]
    BadSignature,

    #[error("token expired")]
    Expired,
}

/// Authentication error
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("missing authentication")]
    MissingAuth,

    #[error("identity key already registered")]
    DuplicateIdentity,

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("invalid token: {0}")]
    InvalidToken(#[from] TokenError),

    #[error("principal not found")]
    PrincipalNotFound,

    #[error("invalid {field}: {message}")]
    InvalidInput {
        field: &'static str,
        message: String,
    },

    #[error("configuration error: {0}")]
    Configuration(String),

    #[error("credential hashing failed: {0}")]
    Hashing(String),

    #[error("credential store error: {0}")]
    Store(#[from] StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}
