//! Credential hashing
//!
//! Secrets are hashed with Argon2id into PHC strings
//! (`$argon2id$v=19$m=...,t=...,p=...$salt$hash`). Each hash carries its own
//! random salt and cost parameters, so verification keeps working after the
//! configured work factor changes.

use argon2::password_hash::SaltString;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};
#[cfg(test)]
use mockall::automock;
use rand::Rng;

use super::AuthError;

/// Salt length in bytes
const SALT_LEN: usize = 16;

/// Secret the dummy hash is computed from; never matches a login
const DUMMY_SECRET: &str = "admin-auth:no-such-principal";

/// Hashing seam used by the credential service
#[cfg_attr(test, automock)]
pub trait SecretHasher: Send + Sync {
    /// Hash a secret with a fresh random salt
    fn hash(&self, secret: &str) -> Result<String, AuthError>;

    /// Verify a secret against a stored PHC hash
    fn verify(&self, secret: &str, hash: &str) -> bool;

    /// A well-formed hash at the configured cost that no principal owns.
    ///
    /// Verified against when the identity key is unknown, so both login
    /// failure paths pay for one verification.
    fn dummy_hash(&self) -> String;
}

/// One-way, salted secret hasher
#[derive(Clone)]
pub struct CredentialHasher {
    argon2: Argon2<'static>,
    dummy_hash: String,
}

impl CredentialHasher {
    /// Hasher with the Argon2 default work factor (19 MiB, 2 iterations)
    pub fn new() -> Self {
        Self::from_argon2(Argon2::default())
    }

    fn from_argon2(argon2: Argon2<'static>) -> Self {
        let mut hasher = Self {
            argon2,
            dummy_hash: String::new(),
        };
        // An empty dummy never verifies, so a failed hash here only costs timing uniformity
        hasher.dummy_hash = hasher.hash(DUMMY_SECRET).unwrap_or_default();
        hasher
    }

    /// Hasher with an explicit memory cost (KiB) and iteration count
    pub fn with_cost(memory_kib: u32, iterations: u32) -> Result<Self, AuthError> {
        let params = Params::new(memory_kib, iterations, Params::DEFAULT_P_COST, None)
            .map_err(|e| AuthError::Configuration(format!("invalid hash parameters: {e}")))?;

        Ok(Self::from_argon2(Argon2::new(
            Algorithm::Argon2id,
            Version::V0x13,
            params,
        )))
    }

    /// Load the work factor from `HASH_MEMORY_KIB` / `HASH_ITERATIONS`.
    ///
    /// Falls back to the Argon2 defaults when neither is set.
    pub fn from_env() -> Result<Self, AuthError> {
        let memory = std::env::var("HASH_MEMORY_KIB").ok();
        let iterations = std::env::var("HASH_ITERATIONS").ok();

        if memory.is_none() && iterations.is_none() {
            return Ok(Self::new());
        }

        let memory_kib = match memory {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| AuthError::Configuration(format!("invalid HASH_MEMORY_KIB: {v}")))?,
            None => Params::DEFAULT_M_COST,
        };
        let iterations = match iterations {
            Some(v) => v
                .trim()
                .parse()
                .map_err(|_| AuthError::Configuration(format!("invalid HASH_ITERATIONS: {v}")))?,
            None => Params::DEFAULT_T_COST,
        };

        Self::with_cost(memory_kib, iterations)
    }

    /// Hash a secret with a fresh random salt
    pub fn hash(&self, secret: &str) -> Result<String, AuthError> {
        let salt_bytes: [u8; SALT_LEN] = rand::thread_rng().gen();
        let salt =
            SaltString::encode_b64(&salt_bytes).map_err(|e| AuthError::Hashing(e.to_string()))?;

        self.argon2
            .hash_password(secret.as_bytes(), &salt)
            .map(|hash| hash.to_string())
            .map_err(|e| AuthError::Hashing(e.to_string()))
    }

    /// Verify a secret against a stored PHC hash.
    ///
    /// Digest comparison is constant time. A wrong secret and an unparseable
    /// stored hash both yield `false`.
    pub fn verify(&self, secret: &str, hash: &str) -> bool {
        match PasswordHash::new(hash) {
            Ok(parsed) => self
                .argon2
                .verify_password(secret.as_bytes(), &parsed)
                .is_ok(),
            Err(_) => false,
        }
    }
}

impl SecretHasher for CredentialHasher {
    fn hash(&self, secret: &str) -> Result<String, AuthError> {
        CredentialHasher::hash(self, secret)
    }

    fn verify(&self, secret: &str, hash: &str) -> bool {
        CredentialHasher::verify(self, secret, hash)
    }

    fn dummy_hash(&self) -> String {
        self.dummy_hash.clone()
    }
}

impl Default for CredentialHasher {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast_hasher() -> CredentialHasher {
        CredentialHasher::with_cost(1024, 1).unwrap()
    }

    #[test]
    fn test_hash_and_verify() {
        let hasher = fast_hasher();
        let hash = hasher.hash("s3cret").unwrap();

        assert!(hash.starts_with("$argon2id$"));
        assert!(hasher.verify("s3cret", &hash));
        assert!(!hasher.verify("wrong", &hash));
    }

    #[test]
    fn test_hash_is_salted() {
        let hasher = fast_hasher();
        let first = hasher.hash("s3cret").unwrap();
        let second = hasher.hash("s3cret").unwrap();

        assert_ne!(first, second);
        assert!(hasher.verify("s3cret", &first));
        assert!(hasher.verify("s3cret", &second));
    }

    #[test]
    fn test_hash_does_not_contain_secret() {
        let hash = fast_hasher().hash("plaintext-secret").unwrap();
        assert!(!hash.contains("plaintext-secret"));
    }

    #[test]
    fn test_verify_garbage_hash_is_false() {
        let hasher = fast_hasher();
        assert!(!hasher.verify("s3cret", "not-a-phc-string"));
        assert!(!hasher.verify("s3cret", ""));
    }

    #[test]
    fn test_verify_uses_parameters_embedded_in_hash() {
        let hash = fast_hasher().hash("s3cret").unwrap();
        let stronger = CredentialHasher::with_cost(2048, 2).unwrap();

        assert!(stronger.verify("s3cret", &hash));
    }

    #[test]
    fn test_dummy_hash_is_well_formed_and_uses_configured_cost() {
        let hasher = fast_hasher();
        let dummy = SecretHasher::dummy_hash(&hasher);

        let parsed = PasswordHash::new(&dummy).unwrap();
        assert_eq!(parsed.algorithm.as_str(), "argon2id");
        assert!(dummy.contains("m=1024,t=1"));
        assert!(!hasher.verify("", &dummy));
        assert!(!hasher.verify("s3cret", &dummy));
    }

    #[test]
    fn test_invalid_cost_rejected() {
        assert!(matches!(
            CredentialHasher::with_cost(1, 0),
            Err(AuthError::Configuration(_))
        ));
    }
}
