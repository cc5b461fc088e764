//! Credential registration and login
//!
//! Registration performs a lookup before inserting. Two concurrent
//! registrations for the same identity key can both pass that lookup; the
//! store's uniqueness constraint keeps at most one record and the loser's
//! insert is reported as the same [`AuthError::DuplicateIdentity`].

use std::sync::Arc;
use tracing::{debug, info, warn};

use super::{AuthError, SecretHasher};
use crate::domain::{NewPrincipal, Principal};
use crate::infra::{PrincipalStore, StoreError};

/// Registers principals and authenticates login attempts
pub struct CredentialService {
    store: Arc<dyn PrincipalStore>,
    hasher: Arc<dyn SecretHasher>,
}

impl CredentialService {
    pub fn new(store: Arc<dyn PrincipalStore>, hasher: Arc<dyn SecretHasher>) -> Self {
        Self { store, hasher }
    }

    /// Register a new principal.
    ///
    /// Fails with [`AuthError::DuplicateIdentity`] if the identity key is
    /// already taken. Only the hash of `secret` is stored.
    pub async fn register(
        &self,
        identity_key: &str,
        display_name: &str,
        secret: &str,
    ) -> Result<Principal, AuthError> {
        validate_registration(identity_key, display_name, secret)?;

        if self.store.find_by_identity_key(identity_key).await?.is_some() {
            debug!(identity_key, "Registration rejected: identity key exists");
            return Err(AuthError::DuplicateIdentity);
        }

        let secret_hash = self.hash_secret(secret).await?;

        let principal = self
            .store
            .insert(NewPrincipal {
                display_name: display_name.trim().to_string(),
                identity_key: identity_key.to_string(),
                secret_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::Duplicate => {
                    debug!(identity_key, "Registration lost race on identity key");
                    AuthError::DuplicateIdentity
                }
                other => AuthError::Store(other),
            })?;

        info!(principal_id = %principal.id, identity_key, "Administrator registered");
        Ok(principal)
    }

    /// Authenticate a login attempt.
    ///
    /// Unknown identity keys and wrong secrets both yield
    /// [`AuthError::InvalidCredentials`]. An unknown key is verified against
    /// the hasher's dummy hash so both paths cost one verification.
    pub async fn authenticate(
        &self,
        identity_key: &str,
        secret: &str,
    ) -> Result<Principal, AuthError> {
        let principal = self.store.find_by_identity_key(identity_key).await?;

        let hash = match &principal {
            Some(p) => p.secret_hash.clone(),
            None => self.hasher.dummy_hash(),
        };
        let verified = self.verify_secret(secret, &hash).await?;

        match principal {
            Some(principal) if verified => {
                info!(principal_id = %principal.id, "Administrator logged in");
                Ok(principal)
            }
            _ => {
                warn!(identity_key, "Login failed");
                Err(AuthError::InvalidCredentials)
            }
        }
    }

    /// Look up a principal by identity key
    pub async fn find(&self, identity_key: &str) -> Result<Option<Principal>, AuthError> {
        Ok(self.store.find_by_identity_key(identity_key).await?)
    }

    async fn hash_secret(&self, secret: &str) -> Result<String, AuthError> {
        let hasher = self.hasher.clone();
        let secret = secret.to_string();
        tokio::task::spawn_blocking(move || hasher.hash(&secret))
            .await
            .map_err(|e| AuthError::Internal(format!("hashing task failed: {e}")))?
    }

    async fn verify_secret(&self, secret: &str, hash: &str) -> Result<bool, AuthError> {
        let hasher = self.hasher.clone();
        let secret = secret.to_string();
        let hash = hash.to_string();
        tokio::task::spawn_blocking(move || hasher.verify(&secret, &hash))
            .await
            .map_err(|e| AuthError::Internal(format!("verification task failed: {e}")))
    }
}

/// Validate registration input
fn validate_registration(
    identity_key: &str,
    display_name: &str,
    secret: &str,
) -> Result<(), AuthError> {
    if !looks_like_email(identity_key) {
        return Err(AuthError::InvalidInput {
            field: "identityKey",
            message: "must be an email address".to_string(),
        });
    }
    if display_name.trim().is_empty() {
        return Err(AuthError::InvalidInput {
            field: "displayName",
            message: "must not be empty".to_string(),
        });
    }
    if secret.is_empty() {
        return Err(AuthError::InvalidInput {
            field: "secret",
            message: "must not be empty".to_string(),
        });
    }
    Ok(())
}

fn looks_like_email(value: &str) -> bool {
    if value.chars().any(char::is_whitespace) {
        return false;
    }
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.is_empty()
                && !domain.contains('@')
                && !domain.starts_with('.')
                && !domain.ends_with('.')
        }
        None => false,
    }
}
