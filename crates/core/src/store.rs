//! Storage traits for the edit workflow.
//!
//! The workflow consumes the record store, the principal directory, the
//! audit ledger, and the edit-request table through these traits. The
//! PostgreSQL implementation lives in `inspecta-db`; an in-memory one for
//! tests lives in [`crate::memory`].
//!
//! Every method that mutates shared state is a single atomic step on the
//! store side. In particular [`RecordStore::try_grant_lease`] is a
//! conditional write, never a read followed by a write.

use async_trait::async_trait;

use crate::edit_request::{EditRequest, EditRequestFilter, NewEditRequest, Resolution};
use crate::history::{HistoryEdit, HistoryEntry, NewHistoryEdit};
use crate::lease::Lease;
use crate::photo::NewPhoto;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// An infrastructure failure in a store. Never a policy outcome.
#[derive(Debug, thiserror::Error)]
#[error("Storage error: {message}")]
pub struct StoreError {
    message: String,
    #[source]
    source: Option<Box<dyn std::error::Error + Send + Sync>>,
}

impl StoreError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
            source: None,
        }
    }

    pub fn with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        Self {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }
}

pub type StoreResult<T> = Result<T, StoreError>;

// ---------------------------------------------------------------------------
// Shared shapes
// ---------------------------------------------------------------------------

/// A principal as known to the directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Principal {
    pub id: DbId,
    pub display_name: String,
    pub role: Role,
    /// Stored credential hash (PHC string).
    pub secret_hash: String,
    pub is_active: bool,
}

/// Everything an edit commit writes, applied as one unit.
#[derive(Debug, Clone)]
pub struct EditCommit {
    pub record_id: DbId,
    pub owner_id: DbId,
    pub history: NewHistoryEdit,
    pub photos: Vec<NewPhoto>,
}

/// Why a store refused an edit commit after re-checking under its lock.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitRejection {
    /// The caller no longer holds the lease (released, superseded, or a
    /// concurrent apply already committed).
    LeaseLost,
    WorkerEditUsed,
    PhotoLimit { current: i64 },
}

#[derive(Debug, Clone)]
pub enum CommitOutcome {
    Committed {
        history: HistoryEdit,
        photos_inserted: usize,
        photos_failed: usize,
    },
    Rejected(CommitRejection),
}

/// Outcome of creating an edit request.
#[derive(Debug, Clone)]
pub enum CreateRequestOutcome {
    Created(EditRequest),
    /// A `pendiente` request already exists for the same record and requester.
    AlreadyPending(EditRequest),
}

// ---------------------------------------------------------------------------
// Traits
// ---------------------------------------------------------------------------

/// Inspection records: lease fields, photo counts, and the edit commit.
#[async_trait]
pub trait RecordStore: Send + Sync {
    /// Load a record's lease. Outer `None` means the record does not exist.
    async fn load_lease(&self, record_id: DbId) -> StoreResult<Option<Option<Lease>>>;

    /// Write `lease` iff the record's current lease is grantable to
    /// `lease.owner_id` at `now` (see [`crate::lease::is_grantable`]).
    /// Returns whether the write happened.
    async fn try_grant_lease(&self, record_id: DbId, lease: &Lease, now: Timestamp)
        -> StoreResult<bool>;

    /// Clear all three lease fields iff `owner_id` holds the lease.
    async fn release_lease(&self, record_id: DbId, owner_id: DbId) -> StoreResult<bool>;

    async fn count_photos(&self, record_id: DbId) -> StoreResult<i64>;

    /// Atomically: verify `owner_id` still holds the lease, re-check the
    /// worker cap (for worker entries) and the photo cap, append the history
    /// entry with its chained hash, insert each photo best-effort, and clear
    /// the lease.
    async fn commit_edit(&self, commit: EditCommit) -> StoreResult<CommitOutcome>;
}

/// The principal directory ("who is this, and what is their secret").
#[async_trait]
pub trait PrincipalDirectory: Send + Sync {
    async fn find_principal(&self, id: DbId) -> StoreResult<Option<Principal>>;
}

/// The append-only edit history.
#[async_trait]
pub trait AuditLedger: Send + Sync {
    async fn count_worker_edits(&self, record_id: DbId) -> StoreResult<i64>;

    /// History for a record, newest first, with editor names.
    async fn list_history(&self, record_id: DbId) -> StoreResult<Vec<HistoryEntry>>;

    /// History for a record, oldest first, for chain verification.
    async fn history_chain(&self, record_id: DbId) -> StoreResult<Vec<HistoryEdit>>;
}

/// The edit-request table.
#[async_trait]
pub trait EditRequestStore: Send + Sync {
    /// Insert unless a pending request exists for the same
    /// `(record_id, requester_id)`; the check and insert are one atomic step.
    async fn create_request(&self, input: NewEditRequest) -> StoreResult<CreateRequestOutcome>;

    async fn find_request(&self, id: DbId) -> StoreResult<Option<EditRequest>>;

    /// Resolve iff still pending. `None` means nothing was updated.
    async fn resolve_request(&self, resolution: Resolution) -> StoreResult<Option<EditRequest>>;

    /// Newest first.
    async fn list_requests(&self, filter: EditRequestFilter) -> StoreResult<Vec<EditRequest>>;
}

/// Everything the edit service needs from storage.
pub trait EditStore: RecordStore + PrincipalDirectory + AuditLedger + EditRequestStore {}

impl<T> EditStore for T where T: RecordStore + PrincipalDirectory + AuditLedger + EditRequestStore {}
