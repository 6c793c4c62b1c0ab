//! Handler for applying an edit (attaching photos) to an inspection record.

use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::Json;
use inspecta_core::photo::NewPhoto;
use inspecta_core::service::ApplyEditInput;
use inspecta_core::types::DbId;
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::error::AppResult;
use crate::middleware::auth::AuthUser;
use crate::response::DataResponse;
use crate::state::AppState;

#[derive(Debug, Deserialize, Serialize, Validate)]
pub struct PhotoPayload {
    /// Encoded image, usually a `data:` URL.
    #[validate(length(min = 1, message = "photo data must not be empty"))]
    pub data: String,
    pub description: Option<String>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct ApplyEditRequest {
    #[validate(length(min = 1, message = "an edit must attach at least one photo"), nested)]
    pub photos: Vec<PhotoPayload>,
    #[serde(default)]
    pub credential: Option<String>,
}

impl From<ApplyEditRequest> for ApplyEditInput {
    fn from(body: ApplyEditRequest) -> Self {
        ApplyEditInput {
            photos: body
                .photos
                .into_iter()
                .map(|p| NewPhoto {
                    image_data: p.data,
                    description: p.description,
                })
                .collect(),
            credential: body.credential,
        }
    }
}

/// POST /api/v1/records/{id}/edits
///
/// Attach photos under the caller's lease. The record may never hold more
/// than two photos; the lease is released on success.
pub async fn apply_edit(
    auth: AuthUser,
    State(state): State<AppState>,
    Path(record_id): Path<DbId>,
    Json(body): Json<ApplyEditRequest>,
) -> AppResult<impl IntoResponse> {
    body.validate()?;
    let outcome = state
        .edits
        .apply_edit(record_id, auth.user_id, body.into())
        .await?;
    Ok(Json(DataResponse { data: outcome }))
}
