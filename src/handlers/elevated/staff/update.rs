// handlers/elevated/staff/update.rs - PUT /admin/staff/:id handler

use axum::{
    extract::{
        rejection::{JsonRejection, PathRejection},
        Path, State,
    },
    Extension, Json,
};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};
use crate::staff::{StaffPatch, StaffRecord};

/// Merge profile groups into a record in any state. Lifecycle fields
/// (status, staff id, password) can't be set here.
pub async fn staff_update(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
    payload: Result<Json<StaffPatch>, JsonRejection>,
) -> ApiResult<StaffRecord> {
    let Path(id) = id?;
    let Json(patch) = payload?;

    let record = state.staff.update_staff(id, &patch).await?;
    tracing::info!(admin = %admin.subject, record_id = %id, "Admin updated staff profile");
    Ok(ApiResponse::success(record))
}
