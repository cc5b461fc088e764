//! Administrator principal records.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Principal identifier, assigned by the store at creation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PrincipalId(pub Uuid);

impl PrincipalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    pub fn from_uuid(id: Uuid) -> Self {
        Self(id)
    }
}

impl Default for PrincipalId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for PrincipalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// A stored administrator.
///
/// `identity_key` (the email) is unique across all principals and is the
/// subject carried by issued tokens. `secret_hash` is a PHC-formatted Argon2
/// hash and never leaves the process: it is redacted from `Debug` output and
/// the type is not `Serialize`.
#[derive(Clone)]
pub struct Principal {
    pub id: PrincipalId,
    pub display_name: String,
    pub identity_key: String,
    pub secret_hash: String,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Principal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Principal")
            .field("id", &self.id)
            .field("display_name", &self.display_name)
            .field("identity_key", &self.identity_key)
            .field("secret_hash", &"<redacted>")
            .field("created_at", &self.created_at)
            .finish()
    }
}

/// Fields supplied when registering a principal; the store assigns the id.
#[derive(Clone)]
pub struct NewPrincipal {
    pub display_name: String,
    pub identity_key: String,
    pub secret_hash: String,
}

impl NewPrincipal {
    /// Materialize into a stored record with a fresh id.
    pub fn into_principal(self) -> Principal {
        Principal {
            id: PrincipalId::new(),
            display_name: self.display_name,
            identity_key: self.identity_key,
            secret_hash: self.secret_hash,
            created_at: Utc::now(),
        }
    }
}

impl fmt::Debug for NewPrincipal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NewPrincipal")
            .field("display_name", &self.display_name)
            .field("identity_key", &self.identity_key)
            .field("secret_hash", &"<redacted>")
            .finish()
    }
}

/// Outward-facing view of a principal (no secret material)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PrincipalView {
    pub id: Uuid,
    pub display_name: String,
    pub identity_key: String,
}

impl From<&Principal> for PrincipalView {
    fn from(principal: &Principal) -> Self {
        Self {
            id: principal.id.0,
            display_name: principal.display_name.clone(),
            identity_key: principal.identity_key.clone(),
        }
    }
}
