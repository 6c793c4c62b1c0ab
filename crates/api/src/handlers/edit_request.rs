//! Handlers for the edit-request workflow.
//!
//! Workers file requests against a record; supervisors work the queue and
//! resolve each request once.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::Json;
use inspecta_core::edit_request::{EditRequestFilter, EditRequestStatus};
use inspecta_core::types::DbId;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::middleware::auth::AuthUser;
use crate::middleware::rbac::RequireSupervisor;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct CreateEditRequestBody {
    /// Free-text reason, trimmed; blank is treated as absent.
    #[serde(default)]
    pub motivo: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ResolveEditRequestBody {
    /// `aprobado` or `rechazado`.
    pub status: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct ListEditRequestsQuery {
    pub status: Option<String>,
}

impl ListEditRequestsQuery {
    fn status(&self) -> AppResult<Option<EditRequestStatus>> {
        self.status
            .as_deref()
            .map(|s| s.parse::<EditRequestStatus>().map_err(AppError::BadRequest))
            .transpose()
    }
}

// ---------------------------------------------------------------------------
// Record-scoped
// ---------------------------------------------------------------------------

/// POST /api/v1/records/{id}/edit-requests
///
/// Returns 201 with the new `pendiente` request, or 400
/// `REQUEST_ALREADY_PENDING` if the caller already has one open.
pub async fn create_edit_request(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
    Json(body): Json<CreateEditRequestBody>,
) -> AppResult<impl IntoResponse> {
    let request = state
        .edits
        .request_edit(record_id, auth.user_id, body.motivo.as_deref())
        .await?;
    Ok((StatusCode::CREATED, Json(DataResponse { data: request })))
}

/// GET /api/v1/records/{id}/edit-requests
pub async fn list_record_requests(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
    Query(query): Query<ListEditRequestsQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = EditRequestFilter {
        status: query.status()?,
        record_id: Some(record_id),
        requester_id: None,
    };
    let requests = state.edits.list_requests(auth.user_id, filter).await?;
    Ok(Json(DataResponse { data: requests }))
}

// ---------------------------------------------------------------------------
// Supervisor queue
// ---------------------------------------------------------------------------

/// GET /api/v1/edit-requests?status=pendiente
pub async fn list_requests(
    RequireSupervisor(auth): RequireSupervisor,
    State(state): State<AppState>,
    Query(query): Query<ListEditRequestsQuery>,
) -> AppResult<impl IntoResponse> {
    let filter = EditRequestFilter {
        status: query.status()?,
        ..Default::default()
    };
    let requests = state.edits.list_requests(auth.user_id, filter).await?;
    Ok(Json(DataResponse { data: requests }))
}

/// POST /api/v1/edit-requests/{id}/resolve
pub async fn resolve_request(
    RequireSupervisor(auth): RequireSupervisor,
    State(state): State<AppState>,
    Path(request_id): Path<DbId>,
    Json(body): Json<ResolveEditRequestBody>,
) -> AppResult<impl IntoResponse> {
    let resolved = state
        .edits
        .resolve_request(request_id, auth.user_id, &body.status)
        .await?;
    Ok(Json(DataResponse { data: resolved }))
}
