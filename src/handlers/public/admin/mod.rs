// handlers/public/admin/mod.rs - POST /admin/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::auth::admin::AdminAuthError;
use crate::auth::Role;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
pub struct AdminLoginRequest {
    pub email: String,
    pub password: String,
}

/// POST /admin/login - token for the school administrator
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<AdminLoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;

    let email = state
        .admin
        .authenticate(&request.email, &request.password)
        .map_err(|e| match e {
            AdminAuthError::NotConfigured => ApiError::service_unavailable("Admin login is not configured"),
            AdminAuthError::InvalidCredentials => {
                tracing::warn!("Failed admin login attempt");
                ApiError::unauthorized("Invalid credentials")
            }
            AdminAuthError::MalformedHash(e) => {
                tracing::error!("ADMIN_PASSWORD_HASH is not a valid PHC string: {}", e);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
        })?;

    let token = state.tokens.issue(email, None, Role::Admin).map_err(|e| {
        tracing::error!("Admin token generation failed: {}", e);
        ApiError::internal_server_error("An error occurred while processing your request")
    })?;

    tracing::info!("Admin logged in");
    Ok(Json(json!({
        "success": true,
        "token": token,
        "expiresIn": state.tokens.expiry_hours() * 3600
    })))
}
