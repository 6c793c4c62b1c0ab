//! Lease manager operations: acquire, release, status.

use serde::Serialize;

use super::EditService;
use crate::error::{CoreError, EditDenial};
use crate::lease::{Lease, LeaseState};
use crate::policy::{plan_acquire, AcquireAction};
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// A lease as returned to the caller who holds it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseInfo {
    pub record_id: DbId,
    pub owner_id: DbId,
    pub started_at: Timestamp,
    pub expires_at: Timestamp,
    /// True when an existing live lease was returned unchanged.
    pub resumed: bool,
}

impl LeaseInfo {
    fn new(record_id: DbId, lease: Lease, resumed: bool) -> Self {
        Self {
            record_id,
            owner_id: lease.owner_id,
            started_at: lease.started_at,
            expires_at: lease.expires_at,
            resumed,
        }
    }
}

/// A record's lease as seen by the caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LeaseStatus {
    pub record_id: DbId,
    /// One of `unleased`, `active_mine`, `active_other`, `expired_mine`.
    pub state: &'static str,
    pub owner_id: Option<DbId>,
    pub owner_name: Option<String>,
    pub started_at: Option<Timestamp>,
    pub expires_at: Option<Timestamp>,
    pub remaining_secs: Option<i64>,
}

impl EditService {
    /// Acquire (or resume) the edit lease on a record.
    pub async fn acquire_lease(
        &self,
        record_id: DbId,
        actor_id: DbId,
        credential: Option<&str>,
    ) -> Result<LeaseInfo, CoreError> {
        let principal = self.principal(actor_id).await?;
        let current = self.record_lease(record_id).await?;
        let now = self.clock.now();
        let state = LeaseState::evaluate(current.as_ref(), principal.id, now);

        let holder_name = match &state {
            LeaseState::ActiveOther(lease) => self.display_name(lease.owner_id).await?,
            _ => String::new(),
        };
        let worker_edits = match principal.role {
            Role::Worker => self.store.count_worker_edits(record_id).await?,
            Role::Supervisor => 0,
        };

        let plan = plan_acquire(principal.role, &state, worker_edits, &holder_name).inspect_err(
            |denial| {
                tracing::debug!(
                    record_id,
                    user_id = principal.id,
                    role = %principal.role,
                    code = denial.code(),
                    "Lease acquire denied"
                );
            },
        )?;

        if plan.needs_credential {
            self.verify_credential(&principal, credential)?;
        }

        match plan.action {
            AcquireAction::Resume(lease) => {
                tracing::info!(
                    record_id,
                    user_id = principal.id,
                    expires_at = %lease.expires_at,
                    "Lease resumed"
                );
                Ok(LeaseInfo::new(record_id, lease, true))
            }
            AcquireAction::Grant => {
                let lease = Lease::fresh(principal.id, now);
                if !self.store.try_grant_lease(record_id, &lease, now).await? {
                    return Err(self.lost_grant(record_id, principal.id).await);
                }
                tracing::info!(
                    record_id,
                    user_id = principal.id,
                    role = %principal.role,
                    expires_at = %lease.expires_at,
                    "Lease granted"
                );
                Ok(LeaseInfo::new(record_id, lease, false))
            }
        }
    }

    /// Describe why a conditional grant wrote nothing: somebody else took
    /// the lease between our read and our write.
    async fn lost_grant(&self, record_id: DbId, principal_id: DbId) -> CoreError {
        let current = match self.record_lease(record_id).await {
            Ok(current) => current,
            Err(e) => return e,
        };
        let now = self.clock.now();
        match LeaseState::evaluate(current.as_ref(), principal_id, now) {
            LeaseState::ActiveOther(lease) => {
                let holder_name = match self.display_name(lease.owner_id).await {
                    Ok(name) => name,
                    Err(e) => return e,
                };
                EditDenial::LeaseHeld {
                    holder_id: lease.owner_id,
                    holder_name,
                    expires_at: lease.expires_at,
                }
                .into()
            }
            _ => CoreError::Conflict("Lease changed concurrently; retry".into()),
        }
    }

    /// Release the caller's lease. Only the owner may release, whether or
    /// not the lease has expired.
    pub async fn release_lease(&self, record_id: DbId, actor_id: DbId) -> Result<(), CoreError> {
        let principal = self.principal(actor_id).await?;
        let current = self.record_lease(record_id).await?;

        if !current.is_some_and(|l| l.is_held_by(principal.id))
            || !self.store.release_lease(record_id, principal.id).await?
        {
            tracing::debug!(record_id, user_id = principal.id, "Release by non-owner refused");
            return Err(EditDenial::NotLeaseOwner.into());
        }

        tracing::info!(record_id, user_id = principal.id, "Lease released");
        Ok(())
    }

    /// Read-only view of a record's lease for the caller.
    pub async fn lease_status(
        &self,
        record_id: DbId,
        actor_id: DbId,
    ) -> Result<LeaseStatus, CoreError> {
        let principal = self.principal(actor_id).await?;
        let current = self.record_lease(record_id).await?;
        let now = self.clock.now();
        let state = LeaseState::evaluate(current.as_ref(), principal.id, now);

        let lease = state.lease();
        let owner_name = match lease {
            Some(l) => Some(self.display_name(l.owner_id).await?),
            None => None,
        };

        Ok(LeaseStatus {
            record_id,
            state: state.as_str(),
            owner_id: lease.map(|l| l.owner_id),
            owner_name,
            started_at: lease.map(|l| l.started_at),
            expires_at: lease.map(|l| l.expires_at),
            remaining_secs: lease.map(|l| l.remaining_secs(now)),
        })
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;

    use crate::error::{CoreError, EditDenial};
    use crate::lease::Lease;
    use crate::roles::Role;
    use crate::service::fixture::*;
    use crate::store::Principal;

    // -----------------------------------------------------------------------
    // Acquire
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn worker_acquires_unleased_record_for_one_hour() {
        let f = fixture().await;
        let info = f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        assert_eq!(info.owner_id, W1);
        assert_eq!(info.started_at, start());
        assert_eq!(info.expires_at, start() + Duration::hours(1));
        assert!(!info.resumed);
        assert_eq!(f.store.lease(RECORD).await.unwrap().owner_id, W1);
    }

    #[tokio::test]
    async fn active_lease_conflicts_with_holder_name_and_expiry() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();

        let err = f.service.acquire_lease(RECORD, W2, None).await.unwrap_err();
        assert_matches!(
            err,
            CoreError::Edit(EditDenial::LeaseHeld { holder_id: W1, ref holder_name, expires_at })
                if holder_name == "Ana Worker" && expires_at == start() + Duration::hours(1)
        );
        assert_eq!(f.store.lease(RECORD).await.unwrap().owner_id, W1);
    }

    #[tokio::test]
    async fn concurrent_acquires_have_exactly_one_winner() {
        let f = fixture().await;
        // Both callers read the record as unleased before either writes.
        f.store.interleave_reads();
        let (a, b) = tokio::join!(
            f.service.acquire_lease(RECORD, W1, None),
            f.service.acquire_lease(RECORD, W2, None),
        );

        let (winner, loser) = match (a, b) {
            (Ok(info), Err(e)) | (Err(e), Ok(info)) => (info, e),
            other => panic!("expected one winner and one conflict, got {other:?}"),
        };
        assert_matches!(
            loser,
            CoreError::Edit(EditDenial::LeaseHeld { holder_id, .. }) if holder_id == winner.owner_id
        );
        assert_eq!(f.store.lease(RECORD).await.unwrap().owner_id, winner.owner_id);
        assert_eq!(f.store.grant_attempts(), 2);
    }

    #[tokio::test]
    async fn worker_losing_grant_race_is_told_who_holds_the_lease() {
        let f = fixture().await;
        f.store.interleave_reads();
        // The supervisor skips the worker-edit count, so it writes first.
        let (worker, supervisor) = tokio::join!(
            f.service.acquire_lease(RECORD, W1, None),
            f.service.acquire_lease(RECORD, S, Some(SECRET)),
        );

        assert_eq!(supervisor.unwrap().owner_id, S);
        assert_matches!(
            worker,
            Err(CoreError::Edit(EditDenial::LeaseHeld { holder_id: S, ref holder_name, .. }))
                if holder_name == "Sara Supervisor"
        );
        assert_eq!(f.store.grant_attempts(), 2);
        assert_eq!(f.store.lease(RECORD).await.unwrap().owner_id, S);
    }

    #[tokio::test]
    async fn resuming_an_active_lease_keeps_original_expiry() {
        let f = fixture().await;
        let first = f.service.acquire_lease(RECORD, W1, None).await.unwrap();

        f.clock.advance(Duration::minutes(40));
        let again = f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        assert!(again.resumed);
        assert_eq!(again.started_at, first.started_at);
        assert_eq!(again.expires_at, first.expires_at);
    }

    #[tokio::test]
    async fn worker_cannot_renew_own_expired_lease() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();

        f.clock.advance(Duration::minutes(61));
        let err = f.service.acquire_lease(RECORD, W1, None).await.unwrap_err();
        assert_matches!(err, CoreError::Edit(EditDenial::EditWindowExpired { .. }));
        assert_eq!(f.store.lease(RECORD).await.unwrap().started_at, start());
    }

    #[tokio::test]
    async fn expired_lease_of_another_principal_is_free() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();

        f.clock.advance(Duration::minutes(60));
        let info = f.service.acquire_lease(RECORD, W2, None).await.unwrap();
        assert_eq!(info.owner_id, W2);
        assert_eq!(info.started_at, start() + Duration::minutes(60));
    }

    #[tokio::test]
    async fn supervisor_needs_a_credential_to_acquire() {
        let f = fixture().await;
        let err = f.service.acquire_lease(RECORD, S, None).await.unwrap_err();
        assert_matches!(err, CoreError::Edit(EditDenial::CredentialRequired));
        assert!(f.store.lease(RECORD).await.is_none());
    }

    #[tokio::test]
    async fn wrong_supervisor_credential_leaves_state_unchanged() {
        let f = fixture().await;
        let err = f
            .service
            .acquire_lease(RECORD, S, Some("wrong"))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Edit(EditDenial::InvalidCredential));
        assert!(f.store.lease(RECORD).await.is_none());
    }

    #[tokio::test]
    async fn supervisor_cannot_displace_an_active_lease() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        let err = f
            .service
            .acquire_lease(RECORD, S, Some(SECRET))
            .await
            .unwrap_err();
        assert_matches!(err, CoreError::Edit(EditDenial::LeaseHeld { holder_id: W1, .. }));
    }

    #[tokio::test]
    async fn supervisor_override_of_own_expired_lease_gets_fresh_window() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, S, Some(SECRET)).await.unwrap();

        f.clock.advance(Duration::minutes(90));
        let info = f.service.acquire_lease(RECORD, S, Some(SECRET)).await.unwrap();
        assert!(!info.resumed);
        assert_eq!(info.expires_at, start() + Duration::minutes(150));
    }

    #[tokio::test]
    async fn unknown_record_is_not_found() {
        let f = fixture().await;
        let err = f.service.acquire_lease(999, W1, None).await.unwrap_err();
        assert_matches!(err, CoreError::NotFound { id: 999, .. });
    }

    #[tokio::test]
    async fn inactive_principal_is_unauthorized() {
        let f = fixture().await;
        f.store
            .insert_principal(Principal {
                id: 50,
                display_name: "Gone".into(),
                role: Role::Worker,
                secret_hash: String::new(),
                is_active: false,
            })
            .await;
        assert_matches!(
            f.service.acquire_lease(RECORD, 50, None).await,
            Err(CoreError::Unauthorized(_))
        );
        assert_matches!(
            f.service.acquire_lease(RECORD, 404, None).await,
            Err(CoreError::Unauthorized(_))
        );
    }

    // -----------------------------------------------------------------------
    // Release
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn owner_releases_and_record_becomes_free() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        f.service.release_lease(RECORD, W1).await.unwrap();
        assert!(f.store.lease(RECORD).await.is_none());

        f.service.acquire_lease(RECORD, W2, None).await.unwrap();
    }

    #[tokio::test]
    async fn non_owner_cannot_release() {
        let f = fixture().await;
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        let err = f.service.release_lease(RECORD, W2).await.unwrap_err();
        assert_matches!(err, CoreError::Edit(EditDenial::NotLeaseOwner));
        assert_eq!(f.store.lease(RECORD).await.unwrap().owner_id, W1);

        f.service.release_lease(RECORD, W1).await.unwrap();
        assert_matches!(
            f.service.release_lease(RECORD, W1).await,
            Err(CoreError::Edit(EditDenial::NotLeaseOwner))
        );
    }

    #[tokio::test]
    async fn owner_may_release_own_expired_lease() {
        let f = fixture().await;
        f.store
            .set_lease(RECORD, Some(Lease::fresh(W1, start() - Duration::hours(3))))
            .await;
        f.service.release_lease(RECORD, W1).await.unwrap();
        assert!(f.store.lease(RECORD).await.is_none());
    }

    // -----------------------------------------------------------------------
    // Status
    // -----------------------------------------------------------------------

    #[tokio::test]
    async fn status_reports_state_per_viewer() {
        let f = fixture().await;
        let status = f.service.lease_status(RECORD, W1).await.unwrap();
        assert_eq!(status.state, "unleased");
        assert_eq!(status.owner_id, None);

        f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        f.clock.advance(Duration::minutes(15));

        let mine = f.service.lease_status(RECORD, W1).await.unwrap();
        assert_eq!(mine.state, "active_mine");
        assert_eq!(mine.remaining_secs, Some(45 * 60));

        let other = f.service.lease_status(RECORD, W2).await.unwrap();
        assert_eq!(other.state, "active_other");
        assert_eq!(other.owner_name.as_deref(), Some("Ana Worker"));

        f.clock.advance(Duration::minutes(50));
        assert_eq!(f.service.lease_status(RECORD, W1).await.unwrap().state, "expired_mine");
        assert_eq!(f.service.lease_status(RECORD, W2).await.unwrap().state, "unleased");
    }
}
