//! In-memory implementation of the storage traits.
//!
//! One mutex guards the whole state, so every trait method is atomic with
//! respect to every other, which is exactly the contract the PostgreSQL
//! store provides with conditional updates and row locks.
//!
//! Two hooks let tests reproduce races between sessions: `interleave_reads`
//! makes every read yield to the runtime after releasing the lock, and
//! `land_before_next_commit` applies a write from another session just
//! before the next commit takes the lock.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::edit_request::{
    EditRequest, EditRequestFilter, EditRequestStatus, NewEditRequest, Resolution,
};
use crate::error::CoreError;
use crate::history::{self, HistoryEdit, HistoryEntry, NewHistoryEdit};
use crate::lease::{is_grantable, Lease};
use crate::photo::{NewPhoto, Photo, MAX_PHOTOS_PER_RECORD};
use crate::roles::Role;
use crate::service::CredentialVerifier;
use crate::store::{
    AuditLedger, CommitOutcome, CommitRejection, CreateRequestOutcome, EditCommit,
    EditRequestStore, Principal, PrincipalDirectory, RecordStore, StoreResult,
};
use crate::types::{DbId, Timestamp};

/// Treats the stored secret hash as the plaintext secret.
#[derive(Debug, Default, Clone, Copy)]
pub struct PlaintextVerifier;

impl CredentialVerifier for PlaintextVerifier {
    fn verify(&self, credential: &str, secret_hash: &str) -> Result<bool, CoreError> {
        Ok(credential == secret_hash)
    }
}

/// A write made by another session, outside the lease.
#[derive(Debug, Clone)]
pub enum ConcurrentWrite {
    Photo { record_id: DbId, photo: NewPhoto },
    History(NewHistoryEdit),
}

#[derive(Debug, Default)]
struct MemRecord {
    lease: Option<Lease>,
    photos: Vec<Photo>,
}

#[derive(Debug, Default)]
struct Inner {
    records: BTreeMap<DbId, MemRecord>,
    principals: BTreeMap<DbId, Principal>,
    history: Vec<HistoryEdit>,
    requests: Vec<EditRequest>,
    next_history_id: DbId,
    next_photo_id: DbId,
    next_request_id: DbId,
    /// Photos with this description fail to insert.
    failing_photo_description: Option<String>,
    landing_write: Option<ConcurrentWrite>,
}

impl Inner {
    fn history_for(&self, record_id: DbId) -> Vec<HistoryEdit> {
        self.history
            .iter()
            .filter(|h| h.record_id == record_id)
            .cloned()
            .collect()
    }

    fn append_history(&mut self, new: &NewHistoryEdit) -> HistoryEdit {
        let prev_hash = self
            .history
            .iter()
            .rev()
            .find(|h| h.record_id == new.record_id)
            .map(|h| h.integrity_hash.clone());
        self.next_history_id += 1;
        let entry = HistoryEdit {
            id: self.next_history_id,
            record_id: new.record_id,
            edited_by: new.edited_by,
            role: new.role,
            action: new.action.clone(),
            photos_added: new.photos_added.clone(),
            integrity_hash: history::compute_integrity_hash(
                prev_hash.as_deref(),
                &new.canonical(),
            ),
            created_at: new.created_at,
        };
        self.history.push(entry.clone());
        entry
    }

    fn push_photo(&mut self, record_id: DbId, photo: NewPhoto) -> bool {
        let id = self.next_photo_id + 1;
        let Some(record) = self.records.get_mut(&record_id) else {
            return false;
        };
        self.next_photo_id = id;
        record.photos.push(Photo {
            id,
            record_id,
            image_data: photo.image_data,
            description: photo.description,
        });
        true
    }

    fn land(&mut self, write: ConcurrentWrite) {
        match write {
            ConcurrentWrite::Photo { record_id, photo } => {
                self.push_photo(record_id, photo);
            }
            ConcurrentWrite::History(new) => {
                self.append_history(&new);
            }
        }
    }
}

#[derive(Debug, Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
    interleave_reads: AtomicBool,
    grant_attempts: AtomicUsize,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn insert_record(&self, record_id: DbId) {
        self.inner
            .lock()
            .await
            .records
            .insert(record_id, MemRecord::default());
    }

    pub async fn insert_principal(&self, principal: Principal) {
        self.inner
            .lock()
            .await
            .principals
            .insert(principal.id, principal);
    }

    pub async fn lease(&self, record_id: DbId) -> Option<Lease> {
        self.inner
            .lock()
            .await
            .records
            .get(&record_id)
            .and_then(|r| r.lease.clone())
    }

    pub async fn set_lease(&self, record_id: DbId, lease: Option<Lease>) {
        if let Some(record) = self.inner.lock().await.records.get_mut(&record_id) {
            record.lease = lease;
        }
    }

    pub async fn photos(&self, record_id: DbId) -> Vec<Photo> {
        self.inner
            .lock()
            .await
            .records
            .get(&record_id)
            .map(|r| r.photos.clone())
            .unwrap_or_default()
    }

    /// History rows for a record, oldest first.
    pub async fn history(&self, record_id: DbId) -> Vec<HistoryEdit> {
        self.inner.lock().await.history_for(record_id)
    }

    /// Make every photo insert with this description fail.
    pub async fn fail_photo_inserts_described(&self, description: &str) {
        self.inner.lock().await.failing_photo_description = Some(description.to_string());
    }

    /// Yield to the runtime after every read, so concurrent callers on one
    /// task observe the same state before either of them writes.
    pub fn interleave_reads(&self) {
        self.interleave_reads.store(true, Ordering::SeqCst);
    }

    /// Number of conditional lease grants attempted so far.
    pub fn grant_attempts(&self) -> usize {
        self.grant_attempts.load(Ordering::SeqCst)
    }

    /// Apply `write` at the start of the next `commit_edit`, after the
    /// caller's own checks have already read the store.
    pub async fn land_before_next_commit(&self, write: ConcurrentWrite) {
        self.inner.lock().await.landing_write = Some(write);
    }

    async fn after_read(&self) {
        if self.interleave_reads.load(Ordering::SeqCst) {
            tokio::task::yield_now().await;
        }
    }

    /// Overwrite a stored history row's role, bypassing the append-only
    /// contract, to exercise chain verification.
    pub async fn tamper_history_role(&self, history_id: DbId, role: Role) {
        if let Some(h) = self
            .inner
            .lock()
            .await
            .history
            .iter_mut()
            .find(|h| h.id == history_id)
        {
            h.role = role;
        }
    }
}

#[async_trait]
impl RecordStore for MemoryStore {
    async fn load_lease(&self, record_id: DbId) -> StoreResult<Option<Option<Lease>>> {
        let lease = self
            .inner
            .lock()
            .await
            .records
            .get(&record_id)
            .map(|r| r.lease.clone());
        self.after_read().await;
        Ok(lease)
    }

    async fn try_grant_lease(
        &self,
        record_id: DbId,
        lease: &Lease,
        now: Timestamp,
    ) -> StoreResult<bool> {
        self.grant_attempts.fetch_add(1, Ordering::SeqCst);
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.records.get_mut(&record_id) else {
            return Ok(false);
        };
        if !is_grantable(record.lease.as_ref(), lease.owner_id, now) {
            return Ok(false);
        }
        record.lease = Some(lease.clone());
        Ok(true)
    }

    async fn release_lease(&self, record_id: DbId, owner_id: DbId) -> StoreResult<bool> {
        let mut inner = self.inner.lock().await;
        let Some(record) = inner.records.get_mut(&record_id) else {
            return Ok(false);
        };
        match &record.lease {
            Some(lease) if lease.is_held_by(owner_id) => {
                record.lease = None;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn count_photos(&self, record_id: DbId) -> StoreResult<i64> {
        let count = self
            .inner
            .lock()
            .await
            .records
            .get(&record_id)
            .map_or(0, |r| r.photos.len() as i64);
        self.after_read().await;
        Ok(count)
    }

    async fn commit_edit(&self, commit: EditCommit) -> StoreResult<CommitOutcome> {
        let mut guard = self.inner.lock().await;
        let inner = &mut *guard;
        if let Some(write) = inner.landing_write.take() {
            inner.land(write);
        }

        let Some(record) = inner.records.get(&commit.record_id) else {
            return Ok(CommitOutcome::Rejected(CommitRejection::LeaseLost));
        };
        if !record
            .lease
            .as_ref()
            .is_some_and(|l| l.is_held_by(commit.owner_id))
        {
            return Ok(CommitOutcome::Rejected(CommitRejection::LeaseLost));
        }

        let chain = inner.history_for(commit.record_id);
        if commit.history.role == Role::Worker && history::count_worker_edits(&chain) > 0 {
            return Ok(CommitOutcome::Rejected(CommitRejection::WorkerEditUsed));
        }
        let current = record.photos.len() as i64;
        if current + commit.photos.len() as i64 > MAX_PHOTOS_PER_RECORD {
            return Ok(CommitOutcome::Rejected(CommitRejection::PhotoLimit { current }));
        }

        // Audit entry first, then photos, then the lease.
        let entry = inner.append_history(&commit.history);

        let mut photos_inserted = 0;
        let mut photos_failed = 0;
        for photo in commit.photos {
            if photo.description.is_some()
                && photo.description == inner.failing_photo_description
            {
                tracing::warn!(record_id = commit.record_id, "Photo insert failed, skipping");
                photos_failed += 1;
                continue;
            }
            if inner.push_photo(commit.record_id, photo) {
                photos_inserted += 1;
            }
        }

        if let Some(record) = inner.records.get_mut(&commit.record_id) {
            record.lease = None;
        }

        Ok(CommitOutcome::Committed {
            history: entry,
            photos_inserted,
            photos_failed,
        })
    }
}

#[async_trait]
impl PrincipalDirectory for MemoryStore {
    async fn find_principal(&self, id: DbId) -> StoreResult<Option<Principal>> {
        Ok(self.inner.lock().await.principals.get(&id).cloned())
    }
}

#[async_trait]
impl AuditLedger for MemoryStore {
    async fn count_worker_edits(&self, record_id: DbId) -> StoreResult<i64> {
        let count = history::count_worker_edits(&self.inner.lock().await.history_for(record_id));
        self.after_read().await;
        Ok(count)
    }

    async fn list_history(&self, record_id: DbId) -> StoreResult<Vec<HistoryEntry>> {
        let inner = self.inner.lock().await;
        let mut entries: Vec<HistoryEntry> = inner
            .history_for(record_id)
            .into_iter()
            .map(|edit| HistoryEntry {
                editor_name: inner
                    .principals
                    .get(&edit.edited_by)
                    .map(|p| p.display_name.clone())
                    .unwrap_or_default(),
                edit,
            })
            .collect();
        entries.reverse();
        Ok(entries)
    }

    async fn history_chain(&self, record_id: DbId) -> StoreResult<Vec<HistoryEdit>> {
        Ok(self.inner.lock().await.history_for(record_id))
    }
}

#[async_trait]
impl EditRequestStore for MemoryStore {
    async fn create_request(&self, input: NewEditRequest) -> StoreResult<CreateRequestOutcome> {
        let mut inner = self.inner.lock().await;
        if let Some(existing) = inner.requests.iter().find(|r| {
            r.record_id == input.record_id
                && r.requester_id == input.requester_id
                && r.status == EditRequestStatus::Pendiente
        }) {
            return Ok(CreateRequestOutcome::AlreadyPending(existing.clone()));
        }
        inner.next_request_id += 1;
        let request = EditRequest {
            id: inner.next_request_id,
            record_id: input.record_id,
            requester_id: input.requester_id,
            status: EditRequestStatus::Pendiente,
            motivo: input.motivo,
            created_at: input.created_at,
            resolved_at: None,
            resolved_by: None,
        };
        inner.requests.push(request.clone());
        Ok(CreateRequestOutcome::Created(request))
    }

    async fn find_request(&self, id: DbId) -> StoreResult<Option<EditRequest>> {
        Ok(self
            .inner
            .lock()
            .await
            .requests
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn resolve_request(&self, resolution: Resolution) -> StoreResult<Option<EditRequest>> {
        let mut inner = self.inner.lock().await;
        let Some(request) = inner
            .requests
            .iter_mut()
            .find(|r| r.id == resolution.request_id && r.status == EditRequestStatus::Pendiente)
        else {
            return Ok(None);
        };
        request.status = resolution.status;
        request.resolved_at = Some(resolution.resolved_at);
        request.resolved_by = Some(resolution.resolved_by);
        Ok(Some(request.clone()))
    }

    async fn list_requests(&self, filter: EditRequestFilter) -> StoreResult<Vec<EditRequest>> {
        let inner = self.inner.lock().await;
        let mut requests: Vec<EditRequest> = inner
            .requests
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect();
        requests.sort_by(|a, b| b.created_at.cmp(&a.created_at).then(b.id.cmp(&a.id)));
        Ok(requests)
    }
}
