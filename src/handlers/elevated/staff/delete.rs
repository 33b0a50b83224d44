// handlers/elevated/staff/delete.rs - DELETE /admin/staff/:id handler

use axum::{
    extract::{rejection::PathRejection, Path, State},
    Extension,
};
use serde_json::{json, Value};
use uuid::Uuid;

use crate::app::AppState;
use crate::middleware::{ApiResponse, ApiResult, AuthUser};

pub async fn staff_delete(
    State(state): State<AppState>,
    Extension(admin): Extension<AuthUser>,
    id: Result<Path<Uuid>, PathRejection>,
) -> ApiResult<Value> {
    let Path(id) = id?;
    state.staff.delete_staff(id).await?;
    tracing::info!(admin = %admin.subject, record_id = %id, "Admin deleted staff record");
    Ok(ApiResponse::success(json!({ "id": id, "deleted": true })))
}
