//! Audit history reads and chain verification.

use super::EditService;
use crate::error::{CoreError, EditDenial};
use crate::history::{verify_chain, ChainVerification, HistoryEntry};
use crate::types::DbId;

impl EditService {
    /// A record's edit history, newest first, with editor names.
    pub async fn history(
        &self,
        record_id: DbId,
        actor_id: DbId,
    ) -> Result<Vec<HistoryEntry>, CoreError> {
        self.principal(actor_id).await?;
        self.record_lease(record_id).await?;
        Ok(self.store.list_history(record_id).await?)
    }

    /// Recompute a record's hash chain. Supervisors only.
    pub async fn verify_history(
        &self,
        record_id: DbId,
        actor_id: DbId,
    ) -> Result<ChainVerification, CoreError> {
        let principal = self.principal(actor_id).await?;
        if !principal.role.is_supervisor() {
            return Err(EditDenial::SupervisorRequired.into());
        }
        self.record_lease(record_id).await?;

        let chain = self.store.history_chain(record_id).await?;
        let result = verify_chain(&chain);
        if !result.chain_valid {
            tracing::warn!(
                record_id,
                first_break = ?result.first_break,
                verified_entries = result.verified_entries,
                "History chain broken"
            );
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use chrono::Duration;

    use crate::error::{CoreError, EditDenial};
    use crate::roles::Role;
    use crate::service::fixture::*;
    use crate::service::ApplyEditInput;

    async fn two_edits(f: &Fixture) {
        f.service.acquire_lease(RECORD, W1, None).await.unwrap();
        f.service
            .apply_edit(
                RECORD,
                W1,
                ApplyEditInput {
                    photos: vec![photo("worker")],
                    credential: None,
                },
            )
            .await
            .unwrap();
        f.clock.advance(Duration::minutes(10));
        f.service.acquire_lease(RECORD, S, Some(SECRET)).await.unwrap();
        f.service
            .apply_edit(
                RECORD,
                S,
                ApplyEditInput {
                    photos: vec![photo("supervisor")],
                    credential: Some(SECRET.to_string()),
                },
            )
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn history_is_newest_first_with_editor_names() {
        let f = fixture().await;
        two_edits(&f).await;

        let entries = f.service.history(RECORD, W2).await.unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].editor_name, "Sara Supervisor");
        assert_eq!(entries[0].edit.role, Role::Supervisor);
        assert_eq!(entries[1].editor_name, "Ana Worker");
        assert!(entries[0].edit.created_at > entries[1].edit.created_at);
    }

    #[tokio::test]
    async fn intact_chain_verifies() {
        let f = fixture().await;
        two_edits(&f).await;

        let v = f.service.verify_history(RECORD, S).await.unwrap();
        assert!(v.chain_valid);
        assert_eq!(v.verified_entries, 2);
    }

    #[tokio::test]
    async fn tampered_role_is_detected() {
        let f = fixture().await;
        two_edits(&f).await;
        let first = f.store.history(RECORD).await[0].id;
        f.store.tamper_history_role(first, Role::Supervisor).await;

        let v = f.service.verify_history(RECORD, S).await.unwrap();
        assert!(!v.chain_valid);
        assert_eq!(v.verified_entries, 0);
        assert_eq!(v.first_break, Some(first));
    }

    #[tokio::test]
    async fn verification_is_for_supervisors() {
        let f = fixture().await;
        assert_matches!(
            f.service.verify_history(RECORD, W1).await,
            Err(CoreError::Edit(EditDenial::SupervisorRequired))
        );
    }
}
