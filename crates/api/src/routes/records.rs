use axum::routing::{get, post};
use axum::Router;

use crate::handlers::{edit, edit_request, history, lease};
use crate::state::AppState;

/// Routes mounted at `/records`.
///
/// ```text
/// GET  /{id}/lease                  lease_status
/// POST /{id}/lease/acquire          acquire_lease
/// POST /{id}/lease/release          release_lease
/// POST /{id}/edits                  apply_edit
/// GET  /{id}/history                list_history
/// GET  /{id}/history/verify         verify_history
/// GET  /{id}/edit-requests          list_record_requests
/// POST /{id}/edit-requests          create_edit_request
/// ```
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/{id}/lease", get(lease::lease_status))
        .route("/{id}/lease/acquire", post(lease::acquire_lease))
        .route("/{id}/lease/release", post(lease::release_lease))
        .route("/{id}/edits", post(edit::apply_edit))
        .route("/{id}/history", get(history::list_history))
        .route("/{id}/history/verify", get(history::verify_history))
        .route(
            "/{id}/edit-requests",
            get(edit_request::list_record_requests).post(edit_request::create_edit_request),
        )
}
