//! JWT issuance and validation
//!
//! Tokens are compact HS256 JWS strings carrying `sub`, `iat` and `exp`.
//! Validation is evaluated fresh on every use, in a fixed order:
//! well-formed -> signature valid -> not expired. There is no revoked state.
//!
//! `iat`/`exp` are the registered NumericDate (seconds) claims. Expiry is
//! enforced on the private `exp_ms` claim, so `expires_at` is exactly
//! `issued_at + lifetime` to the millisecond and a zero-lifetime token is
//! expired as soon as it is issued.

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use super::{AuthError, TokenError};

/// Minimum HMAC key length for HS256
pub const MIN_SIGNING_KEY_BYTES: usize = 32;

/// Default token lifetime (one day)
pub const DEFAULT_TOKEN_LIFETIME_MS: i64 = 86_400_000;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// JWT claims
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (identity key)
    pub sub: String,

    /// Issued at (Unix timestamp)
    pub iat: i64,

    /// Expiration time (Unix timestamp, rounded up to the second)
    pub exp: i64,

    /// Expiration time in Unix milliseconds
    pub exp_ms: i64,
}

/// A freshly issued token
#[derive(Debug, Clone)]
pub struct IssuedToken {
    /// Compact encoded token
    pub token: String,
    pub subject: String,
    pub issued_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

/// Token service configuration
#[derive(Clone)]
pub struct JwtConfig {
    /// HMAC signing key
    pub secret: Vec<u8>,

    /// Token lifetime
    pub lifetime: Duration,
}

impl JwtConfig {
    pub fn new(secret: impl Into<Vec<u8>>, lifetime: Duration) -> Self {
        Self {
            secret: secret.into(),
            lifetime,
        }
    }

    /// Load configuration from `JWT_SECRET` and `JWT_EXPIRATION_MS`
    pub fn from_env() -> Result<Self, AuthError> {
        let secret = std::env::var("JWT_SECRET")
            .map_err(|_| AuthError::Configuration("JWT_SECRET is required".to_string()))?;

        let lifetime = match std::env::var("JWT_EXPIRATION_MS") {
            Ok(raw) => raw
                .trim()
                .parse::<i64>()
                .ok()
                .and_then(Duration::try_milliseconds)
                .ok_or_else(|| {
                    AuthError::Configuration(format!("invalid JWT_EXPIRATION_MS: {raw}"))
                })?,
            Err(_) => Duration::milliseconds(DEFAULT_TOKEN_LIFETIME_MS),
        };

        Ok(Self::new(secret, lifetime))
    }
}

impl std::fmt::Debug for JwtConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("JwtConfig")
            .field("secret", &format_args!("<{} bytes>", self.secret.len()))
            .field("lifetime", &self.lifetime)
            .finish()
    }
}

/// JWT issuer and validator
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    lifetime: Duration,
}

impl TokenService {
    /// Create a token service.
    ///
    /// Rejects keys shorter than [`MIN_SIGNING_KEY_BYTES`], negative
    /// lifetimes, and lifetimes that overflow the calendar when added to
    /// the current time.
    pub fn new(config: &JwtConfig) -> Result<Self, AuthError> {
        if config.secret.len() < MIN_SIGNING_KEY_BYTES {
            return Err(AuthError::Configuration(format!(
                "signing key is {} bytes; HS256 requires at least {MIN_SIGNING_KEY_BYTES}",
                config.secret.len()
            )));
        }
        if config.lifetime < Duration::zero() {
            return Err(AuthError::Configuration(
                "token lifetime must not be negative".to_string(),
            ));
        }
        if Utc::now().checked_add_signed(config.lifetime).is_none() {
            return Err(AuthError::Configuration(format!(
                "token lifetime of {} ms is out of range",
                config.lifetime.num_milliseconds()
            )));
        }

        // Expiry is checked here with an explicit clock, not by jsonwebtoken.
        let mut validation = Validation::new(ALGORITHM);
        validation.validate_exp = false;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["sub", "iat", "exp"]);

        info!(
            key_bytes = config.secret.len(),
            lifetime_ms = config.lifetime.num_milliseconds(),
            "Token service configured"
        );

        Ok(Self {
            encoding_key: EncodingKey::from_secret(&config.secret),
            decoding_key: DecodingKey::from_secret(&config.secret),
            validation,
            lifetime: config.lifetime,
        })
    }

    /// Configured token lifetime
    pub fn lifetime(&self) -> Duration {
        self.lifetime
    }

    /// Issue a token for `subject` valid from now for the configured lifetime
    pub fn issue(&self, subject: &str) -> Result<IssuedToken, AuthError> {
        self.issue_at(subject, Utc::now())
    }

    /// Issue a token as if the current time were `now`
    pub fn issue_at(&self, subject: &str, now: DateTime<Utc>) -> Result<IssuedToken, AuthError> {
        let out_of_range = || AuthError::Internal("token expiry out of range".to_string());

        let issued_at =
            DateTime::<Utc>::from_timestamp_millis(now.timestamp_millis()).ok_or_else(out_of_range)?;
        let exp_ms = issued_at
            .checked_add_signed(self.lifetime)
            .ok_or_else(out_of_range)?
            .timestamp_millis();
        let expires_at = DateTime::<Utc>::from_timestamp_millis(exp_ms).ok_or_else(out_of_range)?;

        let claims = Claims {
            sub: subject.to_string(),
            iat: issued_at.timestamp(),
            exp: exp_ms.div_euclid(1000) + i64::from(exp_ms.rem_euclid(1000) != 0),
            exp_ms,
        };

        let token = encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AuthError::Internal(format!("token encoding failed: {e}")))?;

        Ok(IssuedToken {
            token,
            subject: claims.sub,
            issued_at,
            expires_at,
        })
    }

    /// Validate a token and return its subject
    pub fn validate(&self, token: &str) -> Result<String, TokenError> {
        self.validate_at(token, Utc::now())
    }

    /// Validate a token as if the current time were `now`
    pub fn validate_at(&self, token: &str, now: DateTime<Utc>) -> Result<String, TokenError> {
        let claims = self.decode_verified(token)?;

        if now.timestamp_millis() >= claims.exp_ms {
            return Err(TokenError::Expired);
        }

        Ok(claims.sub)
    }

    /// Decode and verify the signature without checking expiry
    fn decode_verified(&self, token: &str) -> Result<Claims, TokenError> {
        decode::<Claims>(token, &self.decoding_key, &self.validation)
            .map(|data| data.claims)
            .map_err(|e| match e.kind() {
                ErrorKind::InvalidSignature => TokenError::BadSignature,
                kind => {
                    debug!(error = ?kind, "Token failed to decode");
                    TokenError::Malformed
                }
            })
    }
}
