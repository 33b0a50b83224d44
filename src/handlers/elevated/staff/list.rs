// handlers/elevated/staff/list.rs - GET /admin/staff handler

use axum::{extract::State, Extension};

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::staff::StaffRecord;

/// Verified and active staff, newest first. Drafts are not listed.
pub async fn staff_list(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
) -> ApiResult<Vec<StaffRecord>> {
    let staff = state.staff.list_staff().await?;
    tracing::debug!(admin = %admin.subject, count = staff.len(), "Listed staff");
    Ok(ApiResponse::success(staff))
}
