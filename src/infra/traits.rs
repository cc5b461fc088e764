//! Trait definitions for the credential store collaborator

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;

use crate::domain::{NewPrincipal, Principal};

use super::Result;

/// Credential store: maps an identity key (email) to a stored principal.
///
/// Invariant: at most one principal exists per identity key. Implementations
/// must enforce this at insert time and report a violation as
/// [`StoreError::Duplicate`](super::StoreError::Duplicate), never by
/// overwriting the existing record.
#[cfg_attr(test, automock)]
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Look up a principal by its exact (case-sensitive) identity key
    async fn find_by_identity_key(&self, identity_key: &str) -> Result<Option<Principal>>;

    /// Persist a new principal and return the stored record
    async fn insert(&self, principal: NewPrincipal) -> Result<Principal>;
}
