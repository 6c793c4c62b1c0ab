//! Handlers for the edit lease on an inspection record.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use inspecta_core::types::DbId;
use serde::Deserialize;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AcquireLeaseRequest {
    /// Supervisor credential. Workers leave it out.
    #[serde(default)]
    pub credential: Option<String>,
}

/// POST /api/v1/records/{id}/lease/acquire
///
/// Acquire the 60-minute edit lease, or resume one the caller already holds.
/// Returns 409 `LEASE_HELD` naming the holder when someone else has it.
pub async fn acquire_lease(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
    Json(input): Json<AcquireLeaseRequest>,
) -> AppResult<impl IntoResponse> {
    let lease = state
        .edits
        .acquire_lease(record_id, auth.user_id, input.credential.as_deref())
        .await?;
    Ok(Json(DataResponse { data: lease }))
}

/// POST /api/v1/records/{id}/lease/release
pub async fn release_lease(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    state.edits.release_lease(record_id, auth.user_id).await?;
    Ok(Json(DataResponse {
        data: serde_json::json!({ "record_id": record_id, "released": true }),
    }))
}

/// GET /api/v1/records/{id}/lease
pub async fn lease_status(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
) -> AppResult<impl IntoResponse> {
    let status = state.edits.lease_status(record_id, auth.user_id).await?;
    Ok(Json(DataResponse { data: status }))
}
