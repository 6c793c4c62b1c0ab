//! Edit-request workflow operations.

use super::EditService;
use crate::edit_request::{
    normalize_motivo, parse_resolution, EditRequest, EditRequestFilter, NewEditRequest,
    Resolution,
};
use crate::error::{CoreError, EditDenial};
use crate::store::CreateRequestOutcome;
use crate::types::DbId;

impl EditService {
    /// File a request for an exception to the one-edit cap.
    pub async fn request_edit(
        &self,
        record_id: DbId,
        actor_id: DbId,
        motivo: Option<&str>,
    ) -> Result<EditRequest, CoreError> {
        let motivo = normalize_motivo(motivo).map_err(CoreError::Validation)?;
        let principal = self.principal(actor_id).await?;
        self.record_lease(record_id).await?;

        let input = NewEditRequest {
            record_id,
            requester_id: principal.id,
            motivo,
            created_at: self.clock.now(),
        };
        match self.store.create_request(input).await? {
            CreateRequestOutcome::Created(request) => {
                tracing::info!(
                    record_id,
                    user_id = principal.id,
                    request_id = request.id,
                    "Edit request created"
                );
                Ok(request)
            }
            CreateRequestOutcome::AlreadyPending(existing) => {
                tracing::debug!(
                    record_id,
                    user_id = principal.id,
                    request_id = existing.id,
                    "Edit request already pending"
                );
                Err(EditDenial::RequestAlreadyPending {
                    request_id: existing.id,
                }
                .into())
            }
        }
    }

    /// Resolve a pending request as `aprobado` or `rechazado`. Supervisors
    /// only; a request is resolved at most once.
    pub async fn resolve_request(
        &self,
        request_id: DbId,
        actor_id: DbId,
        decision: &str,
    ) -> Result<EditRequest, CoreError> {
        let principal = self.principal(actor_id).await?;
        if !principal.role.is_supervisor() {
            return Err(EditDenial::SupervisorRequired.into());
        }
        let status = parse_resolution(decision).map_err(CoreError::Validation)?;

        let existing = self.find_request(request_id).await?;
        if existing.status.is_resolved() {
            return Err(EditDenial::RequestAlreadyResolved {
                request_id,
                status: existing.status,
            }
            .into());
        }

        let resolution = Resolution {
            request_id,
            status,
            resolved_by: principal.id,
            resolved_at: self.clock.now(),
        };
        match self.store.resolve_request(resolution).await? {
            Some(resolved) => {
                tracing::info!(
                    request_id,
                    record_id = resolved.record_id,
                    user_id = principal.id,
                    status = %resolved.status,
                    "Edit request resolved"
                );
                Ok(resolved)
            }
            None => {
                // Resolved concurrently by someone else.
                let current = self.find_request(request_id).await?;
                Err(EditDenial::RequestAlreadyResolved {
                    request_id,
                    status: current.status,
                }
                .into())
            }
        }
    }

    /// List requests, newest first. Workers only see their own unless they
    /// filter by record.
    pub async fn list_requests(
        &self,
        actor_id: DbId,
        mut filter: EditRequestFilter,
    ) -> Result<Vec<EditRequest>, CoreError> {
        let principal = self.principal(actor_id).await?;
        if let Some(record_id) = filter.record_id {
            self.record_lease(record_id).await?;
        } else if !principal.role.is_supervisor() {
            filter.requester_id = Some(principal.id);
        }
        Ok(self.store.list_requests(filter).await?)
    }

    async fn find_request(&self, request_id: DbId) -> Result<EditRequest, CoreError> {
        self.store
            .find_request(request_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "EditRequest",
                id: request_id,
            })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
