//! [`PgEditStore`]: the core storage traits over PostgreSQL.

use async_trait::async_trait;
use inspecta_core::edit_request::{EditRequest, EditRequestFilter, NewEditRequest, Resolution};
use inspecta_core::history::{self, HistoryEdit, HistoryEntry};
use inspecta_core::lease::Lease;
use inspecta_core::photo::MAX_PHOTOS_PER_RECORD;
use inspecta_core::roles::Role;
use inspecta_core::store::{
    AuditLedger, CommitOutcome, CommitRejection, CreateRequestOutcome, EditCommit,
    EditRequestStore, Principal, PrincipalDirectory, RecordStore, StoreError, StoreResult,
};
use inspecta_core::types::{DbId, Timestamp};
use sqlx::{Connection, PgPool};

use crate::models::history_edit::CreateHistoryEdit;
use crate::repositories::{EditRequestRepo, HistoryEditRepo, PhotoRepo, RecordRepo, UserRepo};

/// Wrap a sqlx error with what we were doing.
fn db(context: &'static str) -> impl FnOnce(sqlx::Error) -> StoreError {
    move |e| StoreError::with_source(context, e)
}

#[derive(Clone)]
pub struct PgEditStore {
    pool: PgPool,
}

impl PgEditStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }
}

#[async_trait]
impl RecordStore for PgEditStore {
    async fn load_lease(&self, record_id: DbId) -> StoreResult<Option<Option<Lease>>> {
        RecordRepo::find_lease(&self.pool, record_id)
            .await
            .map_err(db("load lease"))?
            .map(|cols| cols.into_lease())
            .transpose()
    }

    async fn try_grant_lease(
        &self,
        record_id: DbId,
        lease: &Lease,
        now: Timestamp,
    ) -> StoreResult<bool> {
        RecordRepo::try_grant_lease(&self.pool, record_id, lease, now)
            .await
            .map_err(db("grant lease"))
    }

    async fn release_lease(&self, record_id: DbId, owner_id: DbId) -> StoreResult<bool> {
        RecordRepo::release_lease(&self.pool, record_id, owner_id)
            .await
            .map_err(db("release lease"))
    }

    async fn count_photos(&self, record_id: DbId) -> StoreResult<i64> {
        PhotoRepo::count_for_record(&self.pool, record_id)
            .await
            .map_err(db("count photos"))
    }

    async fn commit_edit(&self, commit: EditCommit) -> StoreResult<CommitOutcome> {
        let record_id = commit.record_id;
        let mut tx = self.pool.begin().await.map_err(db("begin edit commit"))?;

        // The row lock serializes commits on the same record.
        let lease = match RecordRepo::lock_lease(&mut tx, record_id)
            .await
            .map_err(db("lock record"))?
        {
            Some(cols) => cols.into_lease()?,
            None => None,
        };
        if !lease.is_some_and(|l| l.is_held_by(commit.owner_id)) {
            return Ok(CommitOutcome::Rejected(CommitRejection::LeaseLost));
        }

        if commit.history.role == Role::Worker {
            let worker_edits = HistoryEditRepo::count_worker_edits(&mut *tx, record_id)
                .await
                .map_err(db("count worker edits"))?;
            if worker_edits > 0 {
                return Ok(CommitOutcome::Rejected(CommitRejection::WorkerEditUsed));
            }
        }

        let current = PhotoRepo::count_for_record(&mut *tx, record_id)
            .await
            .map_err(db("count photos"))?;
        if current + commit.photos.len() as i64 > MAX_PHOTOS_PER_RECORD {
            return Ok(CommitOutcome::Rejected(CommitRejection::PhotoLimit { current }));
        }

        // Audit entry first.
        let prev_hash = HistoryEditRepo::latest_hash(&mut tx, record_id)
            .await
            .map_err(db("read chain head"))?;
        let entry = CreateHistoryEdit {
            record_id,
            edited_by: commit.history.edited_by,
            role: commit.history.role,
            action: commit.history.action.clone(),
            integrity_hash: history::compute_integrity_hash(
                prev_hash.as_deref(),
                &commit.history.canonical(),
            ),
            photos_added: commit.history.photos_added,
            created_at: commit.history.created_at,
        };
        let row = HistoryEditRepo::append(&mut tx, &entry)
            .await
            .map_err(db("append history"))?;

        // Each photo under its own savepoint so one failure does not abort
        // the transaction.
        let mut photos_inserted = 0;
        let mut photos_failed = 0;
        for photo in &commit.photos {
            let mut savepoint = tx.begin().await.map_err(db("open photo savepoint"))?;
            match PhotoRepo::create(&mut savepoint, record_id, photo).await {
                Ok(_) => {
                    savepoint.commit().await.map_err(db("release photo savepoint"))?;
                    photos_inserted += 1;
                }
                Err(e) => {
                    tracing::warn!(record_id, error = %e, "Photo insert failed, skipping");
                    savepoint
                        .rollback()
                        .await
                        .map_err(db("roll back photo savepoint"))?;
                    photos_failed += 1;
                }
            }
        }

        RecordRepo::clear_lease(&mut tx, record_id)
            .await
            .map_err(db("clear lease"))?;
        tx.commit().await.map_err(db("commit edit"))?;

        Ok(CommitOutcome::Committed {
            history: row.try_into()?,
            photos_inserted,
            photos_failed,
        })
    }
}

#[async_trait]
impl PrincipalDirectory for PgEditStore {
    async fn find_principal(&self, id: DbId) -> StoreResult<Option<Principal>> {
        UserRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db("find user"))?
            .map(Principal::try_from)
            .transpose()
    }
}

#[async_trait]
impl AuditLedger for PgEditStore {
    async fn count_worker_edits(&self, record_id: DbId) -> StoreResult<i64> {
        HistoryEditRepo::count_worker_edits(&self.pool, record_id)
            .await
            .map_err(db("count worker edits"))
    }

    async fn list_history(&self, record_id: DbId) -> StoreResult<Vec<HistoryEntry>> {
        HistoryEditRepo::list_for_record(&self.pool, record_id)
            .await
            .map_err(db("list history"))?
            .into_iter()
            .map(HistoryEntry::try_from)
            .collect()
    }

    async fn history_chain(&self, record_id: DbId) -> StoreResult<Vec<HistoryEdit>> {
        HistoryEditRepo::chain_for_record(&self.pool, record_id)
            .await
            .map_err(db("load history chain"))?
            .into_iter()
            .map(HistoryEdit::try_from)
            .collect()
    }
}

#[async_trait]
impl EditRequestStore for PgEditStore {
    async fn create_request(&self, input: NewEditRequest) -> StoreResult<CreateRequestOutcome> {
        // A conflicting pending request may be resolved between the insert
        // and the lookup; one retry covers that window.
        for _ in 0..2 {
            if let Some(row) = EditRequestRepo::create_if_none_pending(&self.pool, &input)
                .await
                .map_err(db("create edit request"))?
            {
                return Ok(CreateRequestOutcome::Created(row.try_into()?));
            }
            if let Some(row) =
                EditRequestRepo::find_pending(&self.pool, input.record_id, input.requester_id)
                    .await
                    .map_err(db("find pending edit request"))?
            {
                return Ok(CreateRequestOutcome::AlreadyPending(row.try_into()?));
            }
        }
        Err(StoreError::new(
            "pending edit request kept changing during creation",
        ))
    }

    async fn find_request(&self, id: DbId) -> StoreResult<Option<EditRequest>> {
        EditRequestRepo::find_by_id(&self.pool, id)
            .await
            .map_err(db("find edit request"))?
            .map(EditRequest::try_from)
            .transpose()
    }

    async fn resolve_request(&self, resolution: Resolution) -> StoreResult<Option<EditRequest>> {
        EditRequestRepo::resolve(&self.pool, &resolution)
            .await
            .map_err(db("resolve edit request"))?
            .map(EditRequest::try_from)
            .transpose()
    }

    async fn list_requests(&self, filter: EditRequestFilter) -> StoreResult<Vec<EditRequest>> {
        EditRequestRepo::list(&self.pool, &filter)
            .await
            .map_err(db("list edit requests"))?
            .into_iter()
            .map(EditRequest::try_from)
            .collect()
    }
}
