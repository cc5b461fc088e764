//! Handlers that require an authenticated administrator.

use axum::extract::{Extension, State};
use axum::Json;

use crate::api::error::ApiError;
use crate::auth::{AuthError, RequestIdentityExt};
use crate::domain::PrincipalView;
use crate::server::AppState;

/// GET /admin/me - The calling administrator.
pub async fn current_admin(
    State(state): State<AppState>,
    Extension(RequestIdentityExt(identity)): Extension<RequestIdentityExt>,
) -> Result<Json<PrincipalView>, ApiError> {
    let admin = identity.require_admin()?;

    // Re-read so the response reflects the stored record
    let principal = state
        .credentials
        .find(&admin.identity_key)
        .await?
        .ok_or(AuthError::PrincipalNotFound)?;

    Ok(Json(PrincipalView::from(&principal)))
}
