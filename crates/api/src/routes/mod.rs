pub mod edit_requests;
pub mod health;
pub mod records;

use axum::Router;

use crate::state::AppState;

/// Build the `/api/v1` route tree.
///
/// Route hierarchy:
///
/// ```text
/// /records/{id}/lease                    lease status (GET)
/// /records/{id}/lease/acquire            acquire or resume (POST)
/// /records/{id}/lease/release            release (POST)
/// /records/{id}/edits                    apply edit (POST)
/// /records/{id}/history                  audit history (GET)
/// /records/{id}/history/verify           verify hash chain (GET, supervisor)
/// /records/{id}/edit-requests            list, create
///
/// /edit-requests                         supervisor queue (GET, ?status=)
/// /edit-requests/{id}/resolve            resolve (POST, supervisor)
/// ```
pub fn api_routes() -> Router<AppState> {
    Router::new()
        .nest("/records", records::router())
        .nest("/edit-requests", edit_requests::router())
}
