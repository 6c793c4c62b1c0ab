//! Edit policy engine.
//!
//! Stateless decisions consulted by lease acquisition and edit application.
//! All role branching for the edit workflow lives here; callers feed in the
//! evaluated [`LeaseState`] and the audit-log count and get back either a
//! plan or an [`EditDenial`].
//!
//! ```text
//! UNLEASED --acquire(policy ok)--------------------> LEASED(owner, now + 1h)
//! LEASED   --acquire by owner, before expiry-------> LEASED (expiry unchanged)
//! LEASED   --acquire by supervisor owner, expired--> LEASED(fresh expiry)   [override]
//! LEASED   --acquire by other, active--------------> denied, no transition
//! LEASED   --expiry elapses------------------------> UNLEASED (lazily)
//! LEASED   --release by owner / successful apply---> UNLEASED
//! ```

use crate::error::EditDenial;
use crate::lease::{Lease, LeaseState};
use crate::photo::check_photo_capacity;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// True iff no worker edit exists yet for the record.
///
/// The cap is per record, not per worker: once any worker has edited the
/// record, no worker may edit it again.
pub fn can_worker_edit(worker_edit_count: i64) -> bool {
    worker_edit_count == 0
}

/// Supervisors re-authenticate to acquire and to apply; workers never do.
pub fn requires_reauth(role: Role) -> bool {
    role.is_supervisor()
}

/// What a permitted acquire should do.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AcquireAction {
    /// Return the caller's existing live lease untouched (no extension).
    Resume(Lease),
    /// Write a fresh lease starting now.
    Grant,
}

/// A permitted acquire, pending credential verification when required.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AcquirePlan {
    pub action: AcquireAction,
    pub needs_credential: bool,
}

/// Decide whether `role` may acquire a lease in `state`.
///
/// `holder_name` is the display name of the current lease holder; it is only
/// read when refusing because somebody else holds a live lease.
pub fn plan_acquire(
    role: Role,
    state: &LeaseState,
    worker_edit_count: i64,
    holder_name: &str,
) -> Result<AcquirePlan, EditDenial> {
    if let LeaseState::ActiveOther(lease) = state {
        return Err(EditDenial::LeaseHeld {
            holder_id: lease.owner_id,
            holder_name: holder_name.to_string(),
            expires_at: lease.expires_at,
        });
    }

    let action = match role {
        Role::Worker => {
            if let LeaseState::ExpiredMine(lease) = state {
                return Err(EditDenial::EditWindowExpired {
                    expires_at: lease.expires_at,
                });
            }
            if !can_worker_edit(worker_edit_count) {
                return Err(EditDenial::WorkerEditUsed);
            }
            match state {
                LeaseState::ActiveMine(lease) => AcquireAction::Resume(lease.clone()),
                _ => AcquireAction::Grant,
            }
        }
        Role::Supervisor => match state {
            LeaseState::ActiveMine(lease) => AcquireAction::Resume(lease.clone()),
            _ => AcquireAction::Grant,
        },
    };

    Ok(AcquirePlan {
        action,
        needs_credential: requires_reauth(role),
    })
}

/// Authority checks for applying an edit: lease ownership and, for workers,
/// the edit window. Returns whether a credential must be verified next.
pub fn check_apply_authority(
    role: Role,
    lease: Option<&Lease>,
    principal_id: DbId,
    now: Timestamp,
) -> Result<bool, EditDenial> {
    let lease = match lease {
        Some(lease) if lease.is_held_by(principal_id) => lease,
        _ => return Err(EditDenial::NotLeaseOwner),
    };

    // Supervisors hold override leases; their expiry is not enforced at apply.
    if role == Role::Worker && !lease.is_active(now) {
        return Err(EditDenial::EditWindowExpired {
            expires_at: lease.expires_at,
        });
    }

    Ok(requires_reauth(role))
}

/// Invariant checks for applying an edit: the worker cap and the photo cap.
pub fn check_apply_invariants(
    role: Role,
    worker_edit_count: i64,
    existing_photos: i64,
    attempted_photos: i64,
) -> Result<(), EditDenial> {
    if role == Role::Worker && !can_worker_edit(worker_edit_count) {
        return Err(EditDenial::WorkerEditUsed);
    }
    check_photo_capacity(existing_photos, attempted_photos)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    const ME: DbId = 1;
    const OTHER: DbId = 2;

    fn at(s: &str) -> Timestamp {
        s.parse().unwrap()
    }

    fn lease_of(owner: DbId) -> Lease {
        Lease::fresh(owner, at("2026-03-01T09:00:00Z"))
    }

    fn during() -> Timestamp {
        at("2026-03-01T09:30:00Z")
    }

    fn after() -> Timestamp {
        at("2026-03-01T10:30:00Z")
    }

    const NAME: &str = "user-2";

    // -----------------------------------------------------------------------
    // Primitive predicates
    // -----------------------------------------------------------------------

    #[test]
    fn worker_may_edit_only_when_no_worker_edit_exists() {
        assert!(can_worker_edit(0));
        assert!(!can_worker_edit(1));
        assert!(!can_worker_edit(3));
    }

    #[test]
    fn only_supervisors_reauthenticate() {
        assert!(requires_reauth(Role::Supervisor));
        assert!(!requires_reauth(Role::Worker));
    }

    // -----------------------------------------------------------------------
    // Acquire
    // -----------------------------------------------------------------------

    #[test]
    fn active_other_conflicts_for_every_role() {
        let l = lease_of(OTHER);
        let state = LeaseState::evaluate(Some(&l), ME, during());
        for role in [Role::Worker, Role::Supervisor] {
            assert_matches!(
                plan_acquire(role, &state, 0, NAME),
                Err(EditDenial::LeaseHeld { holder_id: OTHER, ref holder_name, .. })
                    if holder_name == "user-2"
            );
        }
    }

    #[test]
    fn worker_cannot_renew_expired_lease() {
        let l = lease_of(ME);
        let state = LeaseState::evaluate(Some(&l), ME, after());
        assert_matches!(
            plan_acquire(Role::Worker, &state, 0, NAME),
            Err(EditDenial::EditWindowExpired { .. })
        );
    }

    #[test]
    fn worker_grant_on_unleased_record() {
        let plan = plan_acquire(Role::Worker, &LeaseState::Unleased, 0, NAME).unwrap();
        assert_eq!(plan.action, AcquireAction::Grant);
        assert!(!plan.needs_credential);
    }

    #[test]
    fn worker_cap_checked_at_acquire() {
        assert_matches!(
            plan_acquire(Role::Worker, &LeaseState::Unleased, 1, NAME),
            Err(EditDenial::WorkerEditUsed)
        );
    }

    #[test]
    fn worker_resume_keeps_original_lease() {
        let l = lease_of(ME);
        let state = LeaseState::evaluate(Some(&l), ME, during());
        let plan = plan_acquire(Role::Worker, &state, 0, NAME).unwrap();
        assert_eq!(plan.action, AcquireAction::Resume(l));
    }

    #[test]
    fn supervisor_bypasses_cap_but_needs_credential() {
        let plan = plan_acquire(Role::Supervisor, &LeaseState::Unleased, 5, NAME).unwrap();
        assert_eq!(plan.action, AcquireAction::Grant);
        assert!(plan.needs_credential);
    }

    #[test]
    fn supervisor_expired_lease_gets_fresh_grant() {
        let l = lease_of(ME);
        let state = LeaseState::evaluate(Some(&l), ME, after());
        let plan = plan_acquire(Role::Supervisor, &state, 0, NAME).unwrap();
        assert_eq!(plan.action, AcquireAction::Grant);
    }

    #[test]
    fn supervisor_active_lease_is_resumed() {
        let l = lease_of(ME);
        let state = LeaseState::evaluate(Some(&l), ME, during());
        let plan = plan_acquire(Role::Supervisor, &state, 0, NAME).unwrap();
        assert_eq!(plan.action, AcquireAction::Resume(l));
        assert!(plan.needs_credential);
    }

    // -----------------------------------------------------------------------
    // Apply
    // -----------------------------------------------------------------------

    #[test]
    fn apply_requires_lease_ownership() {
        let l = lease_of(OTHER);
        assert_eq!(
            check_apply_authority(Role::Worker, Some(&l), ME, during()),
            Err(EditDenial::NotLeaseOwner)
        );
        assert_eq!(
            check_apply_authority(Role::Supervisor, None, ME, during()),
            Err(EditDenial::NotLeaseOwner)
        );
    }

    #[test]
    fn worker_apply_after_expiry_is_refused() {
        let l = lease_of(ME);
        assert_matches!(
            check_apply_authority(Role::Worker, Some(&l), ME, after()),
            Err(EditDenial::EditWindowExpired { .. })
        );
    }

    #[test]
    fn supervisor_apply_ignores_expiry_but_needs_credential() {
        let l = lease_of(ME);
        assert_eq!(
            check_apply_authority(Role::Supervisor, Some(&l), ME, after()),
            Ok(true)
        );
        assert_eq!(
            check_apply_authority(Role::Worker, Some(&l), ME, during()),
            Ok(false)
        );
    }

    #[test]
    fn apply_invariants() {
        assert_eq!(
            check_apply_invariants(Role::Worker, 1, 0, 1),
            Err(EditDenial::WorkerEditUsed)
        );
        assert!(check_apply_invariants(Role::Supervisor, 1, 1, 1).is_ok());
        assert_matches!(
            check_apply_invariants(Role::Supervisor, 1, 2, 1),
            Err(EditDenial::PhotoLimitExceeded { current: 2, attempted: 1, .. })
        );
    }
}
