//! Role-based access control extractors.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use inspecta_core::error::{CoreError, EditDenial};

use super::auth::AuthUser;
use crate::error::AppError;
use crate::state::AppState;

/// Requires the `supervisor` role. Rejects with 403 `SUPERVISOR_REQUIRED`
/// otherwise.
///
/// ```ignore
/// async fn queue(RequireSupervisor(user): RequireSupervisor) -> AppResult<Json<()>> {
///     Ok(Json(()))
/// }
/// ```
pub struct RequireSupervisor(pub AuthUser);

impl FromRequestParts<AppState> for RequireSupervisor {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;
        if !user.role.is_supervisor() {
            return Err(AppError::Core(CoreError::Edit(
                EditDenial::SupervisorRequired,
            )));
        }
        Ok(RequireSupervisor(user))
    }
}
