//! Edit lease value type and lease-state evaluation.
//!
//! A lease is not a separate entity: it is the three lease columns of an
//! inspection record (`lease_owner_id`, `lease_started_at`,
//! `lease_expires_at`) interpreted as one value. The columns are all NULL
//! (unleased) or all set (leased); [`Lease::from_fields`] rejects anything
//! else.
//!
//! Expiry is lazy. Nothing reaps expired leases; every consumer decides
//! whether a lease is live through [`Lease::is_active`] and
//! [`LeaseState::evaluate`], so there is exactly one definition of "active".

use chrono::Duration;
use serde::{Deserialize, Serialize};

use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Constants
// ---------------------------------------------------------------------------

/// Fixed edit window granted by a fresh lease, in minutes.
pub const LEASE_WINDOW_MINS: i64 = 60;

/// The fixed edit window as a [`Duration`].
pub fn lease_window() -> Duration {
    Duration::minutes(LEASE_WINDOW_MINS)
}

// ---------------------------------------------------------------------------
// Lease
// ---------------------------------------------------------------------------

/// An edit lease held over a record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lease {
    pub owner_id: DbId,
    pub started_at: Timestamp,
    pub expires_at: Timestamp,
}

/// The lease columns were partially set.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("lease fields are partially set (owner: {owner}, started: {started}, expires: {expires})")]
pub struct PartialLeaseFields {
    pub owner: bool,
    pub started: bool,
    pub expires: bool,
}

impl Lease {
    /// A fresh lease for `owner_id` starting at `now`.
    pub fn fresh(owner_id: DbId, now: Timestamp) -> Self {
        Self {
            owner_id,
            started_at: now,
            expires_at: now + lease_window(),
        }
    }

    /// Interpret the three nullable lease columns.
    pub fn from_fields(
        owner_id: Option<DbId>,
        started_at: Option<Timestamp>,
        expires_at: Option<Timestamp>,
    ) -> Result<Option<Self>, PartialLeaseFields> {
        match (owner_id, started_at, expires_at) {
            (None, None, None) => Ok(None),
            (Some(owner_id), Some(started_at), Some(expires_at)) => Ok(Some(Self {
                owner_id,
                started_at,
                expires_at,
            })),
            (owner, started, expires) => Err(PartialLeaseFields {
                owner: owner.is_some(),
                started: started.is_some(),
                expires: expires.is_some(),
            }),
        }
    }

    /// A lease is active iff `expires_at > now`.
    pub fn is_active(&self, now: Timestamp) -> bool {
        self.expires_at > now
    }

    pub fn is_held_by(&self, principal_id: DbId) -> bool {
        self.owner_id == principal_id
    }

    /// Whole seconds left before expiry, never negative.
    pub fn remaining_secs(&self, now: Timestamp) -> i64 {
        (self.expires_at - now).num_seconds().max(0)
    }
}

/// Whether `principal_id` may write a new lease over `current`.
///
/// True when there is no live lease held by somebody else. Stores implement
/// their conditional update with exactly this predicate.
pub fn is_grantable(current: Option<&Lease>, principal_id: DbId, now: Timestamp) -> bool {
    match current {
        None => true,
        Some(lease) => !lease.is_active(now) || lease.is_held_by(principal_id),
    }
}

// ---------------------------------------------------------------------------
// LeaseState
// ---------------------------------------------------------------------------

/// A record's lease, as seen by one principal at one instant.
///
/// An expired lease held by somebody else is indistinguishable from no
/// lease at all.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeaseState {
    Unleased,
    ActiveMine(Lease),
    ActiveOther(Lease),
    ExpiredMine(Lease),
}

impl LeaseState {
    pub fn evaluate(current: Option<&Lease>, principal_id: DbId, now: Timestamp) -> Self {
        match current {
            None => LeaseState::Unleased,
            Some(lease) => match (lease.is_held_by(principal_id), lease.is_active(now)) {
                (true, true) => LeaseState::ActiveMine(lease.clone()),
                (true, false) => LeaseState::ExpiredMine(lease.clone()),
                (false, true) => LeaseState::ActiveOther(lease.clone()),
                (false, false) => LeaseState::Unleased,
            },
        }
    }

    /// Wire name used by the lease status endpoint.
    pub fn as_str(&self) -> &'static str {
        match self {
            LeaseState::Unleased => "unleased",
            LeaseState::ActiveMine(_) => "active_mine",
            LeaseState::ActiveOther(_) => "active_other",
            LeaseState::ExpiredMine(_) => "expired_mine",
        }
    }

    pub fn lease(&self) -> Option<&Lease> {
        match self {
            LeaseState::Unleased => None,
            LeaseState::ActiveMine(l) | LeaseState::ActiveOther(l) | LeaseState::ExpiredMine(l) => {
                Some(l)
            }
        }
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
