// handlers/protected/staff/mod.rs - Staff self-service (staff token required)

use axum::{extract::State, Extension};
use serde::Serialize;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::staff::StaffRecord;

#[derive(Debug, Serialize)]
pub struct CoursesResponse {
    pub classrooms: Vec<String>,
}

/// GET /staff/me - the caller's own record
pub async fn me(State(state): State<AppState>, Extension(user): Extension<AuthUser>) -> ApiResult<StaffRecord> {
    let record = state.staff.get_by_id(user.record_id()?).await?;
    Ok(ApiResponse::success(record))
}

/// GET /staff/courses - classrooms assigned to the caller
pub async fn courses(
    State(state): State<AppState>,
    Extension(user): Extension<AuthUser>,
) -> ApiResult<CoursesResponse> {
    let classrooms = state.staff.courses(user.record_id()?).await?;
    Ok(ApiResponse::success(CoursesResponse { classrooms }))
}
