//! Apply-Edit: attach photos to a record under a held lease.

use serde::{Deserialize, Serialize};

use super::EditService;
use crate::error::{CoreError, EditDenial};
use crate::history::{actions, NewHistoryEdit};
use crate::photo::{photo_metadata, validate_new_photos, NewPhoto, MAX_PHOTOS_PER_RECORD};
use crate::policy::{check_apply_authority, check_apply_invariants};
use crate::roles::Role;
use crate::store::{CommitOutcome, CommitRejection, EditCommit};
use crate::types::DbId;

#[derive(Debug, Clone, Deserialize)]
pub struct ApplyEditInput {
    pub photos: Vec<NewPhoto>,
    /// Supervisor credential, re-verified on every apply.
    pub credential: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApplyOutcome {
    pub record_id: DbId,
    pub history_id: DbId,
    pub photos_inserted: usize,
    /// Photos that failed to persist after the audit entry was written.
    pub photos_failed: usize,
}

impl EditService {
    /// Apply an edit. Every check runs before any write; the writes then
    /// happen as one atomic commit that re-checks ownership and both caps.
    pub async fn apply_edit(
        &self,
        record_id: DbId,
        actor_id: DbId,
        input: ApplyEditInput,
    ) -> Result<ApplyOutcome, CoreError> {
        validate_new_photos(&input.photos).map_err(CoreError::Validation)?;

        let principal = self.principal(actor_id).await?;
        let current = self.record_lease(record_id).await?;
        let now = self.clock.now();

        let needs_credential =
            check_apply_authority(principal.role, current.as_ref(), principal.id, now)
                .inspect_err(|denial| {
                    tracing::debug!(
                        record_id,
                        user_id = principal.id,
                        code = denial.code(),
                        "Apply refused"
                    );
                })?;
        if needs_credential {
            self.verify_credential(&principal, input.credential.as_deref())?;
        }

        let worker_edits = match principal.role {
            Role::Worker => self.store.count_worker_edits(record_id).await?,
            Role::Supervisor => 0,
        };
        let existing = self.store.count_photos(record_id).await?;
        let attempted = input.photos.len() as i64;
        check_apply_invariants(principal.role, worker_edits, existing, attempted).inspect_err(
            |denial| {
                tracing::debug!(
                    record_id,
                    user_id = principal.id,
                    code = denial.code(),
                    existing,
                    attempted,
                    "Apply refused"
                );
            },
        )?;

        let commit = EditCommit {
            record_id,
            owner_id: principal.id,
            history: NewHistoryEdit {
                record_id,
                edited_by: principal.id,
                role: principal.role,
                action: actions::ADD_PHOTO.to_string(),
                photos_added: photo_metadata(&input.photos),
                created_at: now,
            },
            photos: input.photos,
        };

        match self.store.commit_edit(commit).await? {
            CommitOutcome::Committed {
                history,
                photos_inserted,
                photos_failed,
            } => {
                if photos_failed > 0 {
                    tracing::warn!(
                        record_id,
                        history_id = history.id,
                        photos_failed,
                        "Edit committed with photos that failed to persist"
                    );
                }
                tracing::info!(
                    record_id,
                    user_id = principal.id,
                    role = %principal.role,
                    history_id = history.id,
                    photos_inserted,
                    "Edit applied"
                );
                Ok(ApplyOutcome {
                    record_id,
                    history_id: history.id,
                    photos_inserted,
                    photos_failed,
                })
            }
            CommitOutcome::Rejected(rejection) => {
                tracing::debug!(record_id, user_id = principal.id, ?rejection, "Commit rejected");
                Err(match rejection {
                    CommitRejection::LeaseLost => EditDenial::NotLeaseOwner,
                    CommitRejection::WorkerEditUsed => EditDenial::WorkerEditUsed,
                    CommitRejection::PhotoLimit { current } => EditDenial::PhotoLimitExceeded {
                        current,
                        attempted,
                        max: MAX_PHOTOS_PER_RECORD,
                    },
                }
                .into())
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
