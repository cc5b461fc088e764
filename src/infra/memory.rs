//! In-memory principal store
//!
//! Used when no `DATABASE_URL` is configured and throughout the test suite.
//! Uniqueness is enforced under the write lock, so a lost registration race
//! yields [`StoreError::Duplicate`] exactly like the Postgres constraint.

use async_trait::async_trait;
use std::collections::hash_map::Entry;
use std::collections::HashMap;
use tokio::sync::RwLock;

use super::{PrincipalStore, Result, StoreError};
use crate::domain::{NewPrincipal, Principal};

/// Principal store backed by a `HashMap` keyed on identity key
#[derive(Default)]
pub struct InMemoryPrincipalStore {
    principals: RwLock<HashMap<String, Principal>>,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remove a principal (external administrative deletion)
    pub async fn remove(&self, identity_key: &str) -> Option<Principal> {
        self.principals.write().await.remove(identity_key)
    }

    /// Number of stored principals
    pub async fn len(&self) -> usize {
        self.principals.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.principals.read().await.is_empty()
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_by_identity_key(&self, identity_key: &str) -> Result<Option<Principal>> {
        Ok(self.principals.read().await.get(identity_key).cloned())
    }

    async fn insert(&self, principal: NewPrincipal) -> Result<Principal> {
        let mut principals = self.principals.write().await;
        match principals.entry(principal.identity_key.clone()) {
            Entry::Occupied(_) => Err(StoreError::Duplicate),
            Entry::Vacant(slot) => Ok(slot.insert(principal.into_principal()).clone()),
        }
    }
}
