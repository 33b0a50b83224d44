// handlers/public/staff/login.rs - POST /staff/login handler

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoginRequest {
    pub staff_id: String,
    pub password: Option<String>,
}

/// POST /staff/login - authenticate a verified staff member
///
/// The first login of a verified account sets its password. Later logins
/// check it.
///
/// Expected Output:
/// ```json
/// {
///   "success": true,
///   "token": "eyJhbGciOiJIUzI1NiI...",
///   "expiresIn": 604800,
///   "firstLogin": true,
///   "staff": { "staffId": "4821093517@classcify.in", "status": "active", ... }
/// }
/// ```
pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let staff_id = request.staff_id.trim();
    if staff_id.is_empty() {
        return Err(ApiError::field_error("staffId", "staffId is required"));
    }

    let outcome = state.staff.login(staff_id, request.password.as_deref()).await?;

    Ok(Json(json!({
        "success": true,
        "token": outcome.token,
        "expiresIn": state.tokens.expiry_hours() * 3600,
        "firstLogin": outcome.activated,
        "staff": outcome.record
    })))
}
