// handlers/public/staff/draft.rs - POST /staff/draft, GET /staff/draft/:draft_id

use axum::{
    extract::{rejection::JsonRejection, Path, State},
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

use crate::app::AppState;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::staff::{StaffPatch, StaffRecord};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DraftRequest {
    /// Omitted on the first step of the wizard.
    pub draft_id: Option<String>,
    #[serde(default)]
    pub data: StaffPatch,
}

/// POST /staff/draft - create or merge a registration draft
///
/// Response: `{ "success": true, "draftId": "..." }`
pub async fn draft_save(
    State(state): State<AppState>,
    payload: Result<Json<DraftRequest>, JsonRejection>,
) -> Result<Json<Value>, ApiError> {
    let Json(request) = payload?;
    let draft_id = state.staff.save_draft(request.draft_id, &request.data).await?;

    Ok(Json(json!({
        "success": true,
        "draftId": draft_id
    })))
}

/// GET /staff/draft/:draft_id - resume a saved draft
pub async fn draft_get(State(state): State<AppState>, Path(draft_id): Path<String>) -> ApiResult<StaffRecord> {
    let record = state.staff.get_draft(&draft_id).await?;
    Ok(ApiResponse::success(record))
}
