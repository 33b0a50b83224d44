// handlers/public/staff/otp.rs - POST /staff/send-otp, POST /staff/verify

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
pub struct SendOtpRequest {
    pub draft_id: String,
    /// Local number, without country code.
    pub phone: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct VerifyRequest {
    pub draft_id: String,
    pub otp: String,
}

/// POST /staff/send-otp - text a one-time code to the phone on a draft
///
/// Rate limited per phone number. Nothing is stored unless the SMS provider
/// accepted the message.
pub async fn otp_send(
    State(state): State<AppState>,
    payload: Result<Json<SendOtpRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let phone = request.phone.trim();

    if let Some(limiter) = &state.otp_limiter {
        limiter.check(phone)?;
    }

    state.staff.issue_otp(&request.draft_id, phone).await?;

    Ok(Json(json!({ "success": true })))
}

/// POST /staff/verify - exchange the code for a staff id
///
/// Response: `{ "success": true, "staff": StaffRecord }`
pub async fn otp_verify(
    State(state): State<AppState>,
    payload: Result<Json<VerifyRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    if request.otp.trim().is_empty() {
        return Err(ApiError::field_error("otp", "OTP is required"));
    }

    let record = state.staff.verify_otp(&request.draft_id, &request.otp).await?;

    Ok(Json(json!({
        "success": true,
        "staff": record
    })))
}
