//! Shared request and response types for REST API handlers.
//!
//! Request types carrying a secret deliberately do not derive `Debug`.

use serde::{Deserialize, Serialize};

use crate::domain::PrincipalView;

// ============================================================================
// Auth types
// ============================================================================

/// Request body for administrator registration.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRequest {
    pub identity_key: String,
    pub display_name: String,
    pub secret: String,
}

/// Request body for login.
#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub identity_key: String,
    pub secret: String,
}

/// Response for a successful login.
#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginResponse {
    pub token: String,
    pub principal: PrincipalView,
    /// Token lifetime in milliseconds
    pub expires_in_ms: i64,
}
