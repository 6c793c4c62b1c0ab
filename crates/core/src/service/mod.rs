//! The edit workflow service.
//!
//! [`EditService`] runs every operation of the controlled-edit workflow:
//! it loads the principal and the record's lease, asks the policy engine for
//! a decision, verifies supervisor credentials, and performs the single
//! atomic store write the decision calls for. Denials never mutate state.

mod apply;
mod history;
mod lease;
mod requests;

use std::sync::Arc;

use crate::clock::Clock;
use crate::error::{CoreError, EditDenial};
use crate::lease::Lease;
use crate::store::{EditStore, Principal};
use crate::types::DbId;

pub use apply::{ApplyEditInput, ApplyOutcome};
pub use lease::{LeaseInfo, LeaseStatus};

/// Checks a plaintext credential against a principal's stored secret hash.
pub trait CredentialVerifier: Send + Sync {
    fn verify(&self, credential: &str, secret_hash: &str) -> Result<bool, CoreError>;
}

pub struct EditService {
    store: Arc<dyn EditStore>,
    verifier: Arc<dyn CredentialVerifier>,
    clock: Arc<dyn Clock>,
}

impl EditService {
    pub fn new(
        store: Arc<dyn EditStore>,
        verifier: Arc<dyn CredentialVerifier>,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self {
            store,
            verifier,
            clock,
        }
    }

    /// Resolve an authenticated id to an active principal.
    async fn principal(&self, id: DbId) -> Result<Principal, CoreError> {
        match self.store.find_principal(id).await? {
            Some(p) if p.is_active => Ok(p),
            Some(_) => Err(CoreError::Unauthorized("Account is deactivated".into())),
            None => Err(CoreError::Unauthorized("Unknown principal".into())),
        }
    }

    /// Load a record's lease, mapping a missing record to `NotFound`.
    async fn record_lease(&self, record_id: DbId) -> Result<Option<Lease>, CoreError> {
        self.store
            .load_lease(record_id)
            .await?
            .ok_or(CoreError::NotFound {
                entity: "InspectionRecord",
                id: record_id,
            })
    }

    async fn display_name(&self, id: DbId) -> Result<String, CoreError> {
        Ok(self
            .store
            .find_principal(id)
            .await?
            .map(|p| p.display_name)
            .unwrap_or_else(|| format!("user {id}")))
    }

    /// Verify a supervisor credential. Missing and wrong credentials are
    /// distinct denials.
    fn verify_credential(
        &self,
        principal: &Principal,
        credential: Option<&str>,
    ) -> Result<(), CoreError> {
        let Some(credential) = credential.filter(|c| !c.is_empty()) else {
            return Err(EditDenial::CredentialRequired.into());
        };
        if !self.verifier.verify(credential, &principal.secret_hash)? {
            tracing::debug!(user_id = principal.id, "Supervisor credential rejected");
            return Err(EditDenial::InvalidCredential.into());
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Test fixture shared by the operation modules
// ---------------------------------------------------------------------------
