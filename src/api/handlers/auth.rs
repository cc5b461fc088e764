//! Registration and login handlers.

use axum::extract::rejection::JsonRejection;
use axum::extract::State;
use axum::Json;

use crate::api::error::ApiError;
use crate::api::types::{LoginRequest, LoginResponse, RegisterRequest};
use crate::domain::PrincipalView;
use crate::server::AppState;

/// POST /auth/register - Register a new administrator.
pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<RegisterRequest>, JsonRejection>,
) -> Result<Json<PrincipalView>, ApiError> {
    let Json(request) = payload?;

    let principal = state
        .credentials
        .register(
            &request.identity_key,
            &request.display_name,
            &request.secret,
        )
        .await?;

    Ok(Json(PrincipalView::from(&principal)))
}

/// POST /auth/login - Exchange credentials for a bearer token.
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<LoginResponse>, ApiError> {
    let Json(request) = payload?;

    let principal = state
        .credentials
        .authenticate(&request.identity_key, &request.secret)
        .await?;

    let issued = state.tokens.issue(&principal.identity_key)?;

    Ok(Json(LoginResponse {
        token: issued.token,
        principal: PrincipalView::from(&principal),
        expires_in_ms: state.tokens.lifetime().num_milliseconds(),
    }))
}
