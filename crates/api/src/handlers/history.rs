//! Handlers for a record's audit history.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use inspecta_core::types::DbId;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::DataResponse;
use crate::state::AppState;

/// GET /api/v1/records/{id}/history
///
/// Newest first, each entry with the editor's display name.
pub async fn list_history(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let entries = state.edits.history(record_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: entries }))
}

/// GET /api/v1/records/{id}/history/verify
pub async fn verify_history(
    RequireSupervisor(auth): RequireSupervisor,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let result = state.edits.verify_history(record_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: result }))
}
