use crate::edit_request::EditRequestStatus;
use crate::store::StoreError;
use crate::types::{DbId, Timestamp};

#[derive(Debug, thiserror::Error)]
pub enum CoreError {
    #[error("Entity not found: {entity} with id {id}")]
    NotFound { entity: &'static str, id: DbId },

    #[error("Validation failed: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Internal error: {0}")]
    Internal(String),

    /// A policy, invariant, or authorization denial from the edit workflow.
    #[error(transparent)]
    Edit(#[from] EditDenial),

    #[error(transparent)]
    Store(#[from] StoreError),
}

/// Why the edit workflow refused an operation.
///
/// Every variant carries the specific blocking value so that a human can
/// resolve the contention out-of-band (wait, ask for an exception, or ask a
/// supervisor to override). No variant implies any state was mutated.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditDenial {
    #[error("Record is being edited by {holder_name} until {expires_at}")]
    LeaseHeld {
        holder_id: DbId,
        holder_name: String,
        expires_at: Timestamp,
    },

    #[error("Your edit window expired at {expires_at}")]
    EditWindowExpired { expires_at: Timestamp },

    #[error("Supervisor credential required to edit this record")]
    CredentialRequired,

    #[error("Invalid credential")]
    InvalidCredential,

    #[error("You do not hold the edit lease on this record")]
    NotLeaseOwner,

    #[error("A worker has already used the one permitted edit on this record")]
    WorkerEditUsed,

    #[error(
        "Photo limit exceeded: record has {current} photo(s) and {attempted} more were \
         attempted (maximum {max})"
    )]
    PhotoLimitExceeded {
        current: i64,
        attempted: i64,
        max: i64,
    },

    #[error("An edit request for this record is already pending (request {request_id})")]
    RequestAlreadyPending { request_id: DbId },

    #[error("Edit request {request_id} was already resolved as {status}")]
    RequestAlreadyResolved {
        request_id: DbId,
        status: EditRequestStatus,
    },

    #[error("Supervisor role required")]
    SupervisorRequired,
}

impl EditDenial {
    /// Stable machine-readable code for API clients.
    pub fn code(&self) -> &'static str {
        match self {
            EditDenial::LeaseHeld { .. } => "LEASE_HELD",
            EditDenial::EditWindowExpired { .. } => "EDIT_WINDOW_EXPIRED",
            EditDenial::CredentialRequired => "CREDENTIAL_REQUIRED",
            EditDenial::InvalidCredential => "INVALID_CREDENTIAL",
            EditDenial::NotLeaseOwner => "NOT_LEASE_OWNER",
            EditDenial::WorkerEditUsed => "WORKER_EDIT_USED",
            EditDenial::PhotoLimitExceeded { .. } => "PHOTO_LIMIT_EXCEEDED",
            EditDenial::RequestAlreadyPending { .. } => "REQUEST_ALREADY_PENDING",
            EditDenial::RequestAlreadyResolved { .. } => "REQUEST_ALREADY_RESOLVED",
            EditDenial::SupervisorRequired => "SUPERVISOR_REQUIRED",
        }
    }
}
