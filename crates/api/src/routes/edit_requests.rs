use axum::routing::{get, post};
use axum::Router;

use crate::handlers::edit_request;
use crate::state::AppState;

/// Routes mounted at `/edit-requests`. Supervisors only.
///
/// ```text
/// GET  /                  list_requests (?status=)
/// POST /{id}/resolve      resolve_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(edit_request::list_requests))
        .route("/{id}/resolve", post(edit_request::resolve_request))
}
