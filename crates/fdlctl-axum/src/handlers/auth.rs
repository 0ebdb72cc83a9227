//! Login handler - password for token exchange.

use axum::Json;
use axum::extract::State;

use crate::dto::{LoginRequest, LoginResponse};
use crate::error::HttpError;
use crate::state::AppState;

/// Exchange the shared panel password for a signed bearer token.
pub async fn login(
    State(state): State<AppState>,
    Json(req): Json<LoginRequest>,
) -> Result<Json<LoginResponse>, HttpError> {
    let token = state.auth.login(&req.password)?;
    Ok(Json(LoginResponse { token }))
}
