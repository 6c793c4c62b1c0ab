//! Append-only edit history (audit log) and its integrity hash chain.
//!
//! Each record has its own chain: an entry's `integrity_hash` is the SHA-256
//! of the previous entry's hash for the same record (or a fixed seed for the
//! first one) joined with the canonical form of the entry. No operation ever
//! updates or deletes a history row, so any later modification breaks the
//! chain at that entry.

use chrono::SecondsFormat;
use serde::Serialize;

use crate::hashing;
use crate::roles::Role;
use crate::types::{DbId, Timestamp};

/// Known history actions.
pub mod actions {
    pub const ADD_PHOTO: &str = "add_photo";
}

/// Seed hashed in place of a previous hash for the first entry of a record.
const CHAIN_SEED: &str = "HISTORY_EDIT_CHAIN_SEED_V1";

/// A row of the edit history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEdit {
    pub id: DbId,
    pub record_id: DbId,
    pub edited_by: DbId,
    /// Role of the editor at the time of the edit.
    pub role: Role,
    pub action: String,
    pub photos_added: serde_json::Value,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

/// A history row joined with the editor's display name, for listing.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HistoryEntry {
    #[serde(flatten)]
    pub edit: HistoryEdit,
    pub editor_name: String,
}

/// A history row about to be appended.
#[derive(Debug, Clone, PartialEq)]
pub struct NewHistoryEdit {
    pub record_id: DbId,
    pub edited_by: DbId,
    pub role: Role,
    pub action: String,
    pub photos_added: serde_json::Value,
    pub created_at: Timestamp,
}

impl NewHistoryEdit {
    /// Canonical string hashed into the chain.
    ///
    /// Timestamps are rendered at microsecond precision, which is what
    /// PostgreSQL `TIMESTAMPTZ` stores.
    pub fn canonical(&self) -> String {
        canonical_entry(
            self.record_id,
            self.edited_by,
            self.role,
            &self.action,
            &self.photos_added,
            self.created_at,
        )
    }
}

impl HistoryEdit {
    pub fn canonical(&self) -> String {
        canonical_entry(
            self.record_id,
            self.edited_by,
            self.role,
            &self.action,
            &self.photos_added,
            self.created_at,
        )
    }
}

fn canonical_entry(
    record_id: DbId,
    edited_by: DbId,
    role: Role,
    action: &str,
    photos_added: &serde_json::Value,
    created_at: Timestamp,
) -> String {
    format!(
        "{record_id}|{edited_by}|{role}|{action}|{photos_added}|{}",
        created_at.to_rfc3339_opts(SecondsFormat::Micros, true)
    )
}

/// Compute the integrity hash of an entry given its predecessor's hash.
pub fn compute_integrity_hash(prev_hash: Option<&str>, entry_data: &str) -> String {
    let prev = prev_hash.unwrap_or(CHAIN_SEED);
    let combined = format!("{prev}|{entry_data}");
    hashing::sha256_hex(combined.as_bytes())
}

/// Result of re-walking a record's hash chain.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChainVerification {
    pub verified_entries: i64,
    pub chain_valid: bool,
    /// Id of the first entry whose stored hash does not match.
    pub first_break: Option<DbId>,
}

/// Verify a record's chain. `entries` must be ordered oldest first.
pub fn verify_chain(entries: &[HistoryEdit]) -> ChainVerification {
    let mut verified: i64 = 0;
    let mut prev_hash: Option<&str> = None;

    for entry in entries {
        let expected = compute_integrity_hash(prev_hash, &entry.canonical());
        if entry.integrity_hash != expected {
            return ChainVerification {
                verified_entries: verified,
                chain_valid: false,
                first_break: Some(entry.id),
            };
        }
        verified += 1;
        prev_hash = Some(&entry.integrity_hash);
    }

    ChainVerification {
        verified_entries: verified,
        chain_valid: true,
        first_break: None,
    }
}

/// Number of entries made by workers; the authoritative "one edit used" signal.
pub fn count_worker_edits(entries: &[HistoryEdit]) -> i64 {
    entries.iter().filter(|e| e.role == Role::Worker).count() as i64
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;

    fn new_entry(edited_by: DbId, role: Role, minute: u32) -> NewHistoryEdit {
        NewHistoryEdit {
            record_id: 42,
            edited_by,
            role,
            action: actions::ADD_PHOTO.to_string(),
            photos_added: serde_json::json!({ "count": 1 }),
            created_at: format!("2026-03-01T09:{minute:02}:00.123456Z").parse().unwrap(),
        }
    }

    fn build_chain(entries: &[NewHistoryEdit]) -> Vec<HistoryEdit> {
        let mut out: Vec<HistoryEdit> = Vec::new();
        for (idx, e) in entries.iter().enumerate() {
            let prev = out.last().map(|h| h.integrity_hash.as_str());
            let integrity_hash = compute_integrity_hash(prev, &e.canonical());
            out.push(HistoryEdit {
                id: idx as DbId + 1,
                record_id: e.record_id,
                edited_by: e.edited_by,
                role: e.role,
                action: e.action.clone(),
                photos_added: e.photos_added.clone(),
                integrity_hash,
                created_at: e.created_at,
            });
        }
        out
    }

    // -----------------------------------------------------------------------
    // Canonical form and hashing
    // -----------------------------------------------------------------------

    #[test]
    fn canonical_form_uses_microsecond_timestamps() {
        let c = new_entry(7, Role::Worker, 5).canonical();
        assert_eq!(
            c,
            r#"42|7|worker|add_photo|{"count":1}|2026-03-01T09:05:00.123456Z"#
        );
    }

    #[test]
    fn first_entry_hash_uses_seed() {
        let data = "x";
        assert_eq!(
            compute_integrity_hash(None, data),
            compute_integrity_hash(Some(CHAIN_SEED), data)
        );
        assert_ne!(
            compute_integrity_hash(None, data),
            compute_integrity_hash(Some("other"), data)
        );
    }

    // -----------------------------------------------------------------------
    // Chain verification
    // -----------------------------------------------------------------------

    #[test]
    fn empty_chain_is_valid() {
        let v = verify_chain(&[]);
        assert!(v.chain_valid);
        assert_eq!(v.verified_entries, 0);
    }

    #[test]
    fn intact_chain_verifies() {
        let chain = build_chain(&[
            new_entry(1, Role::Worker, 0),
            new_entry(9, Role::Supervisor, 10),
        ]);
        let v = verify_chain(&chain);
        assert!(v.chain_valid);
        assert_eq!(v.verified_entries, 2);
        assert_eq!(v.first_break, None);
    }

    #[test]
    fn tampered_entry_breaks_chain() {
        let mut chain = build_chain(&[
            new_entry(1, Role::Worker, 0),
            new_entry(9, Role::Supervisor, 10),
            new_entry(9, Role::Supervisor, 20),
        ]);
        chain[1].role = Role::Worker;
        let v = verify_chain(&chain);
        assert!(!v.chain_valid);
        assert_eq!(v.verified_entries, 1);
        assert_eq!(v.first_break, Some(2));
    }

    #[test]
    fn deleted_entry_breaks_chain() {
        let mut chain = build_chain(&[
            new_entry(1, Role::Worker, 0),
            new_entry(9, Role::Supervisor, 10),
        ]);
        chain.remove(0);
        assert_eq!(verify_chain(&chain).first_break, Some(2));
    }

    #[test]
    fn worker_edits_are_counted_by_role_snapshot() {
        let chain = build_chain(&[
            new_entry(1, Role::Worker, 0),
            new_entry(9, Role::Supervisor, 10),
        ]);
        assert_eq!(count_worker_edits(&chain), 1);
    }
}
