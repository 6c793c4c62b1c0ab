//! Edit history (audit log) models.

use inspecta_core::history::{HistoryEdit, HistoryEntry};
use inspecta_core::roles::Role;
use inspecta_core::store::StoreError;
use inspecta_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::invalid_column;

/// A row from the `history_edits` table.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEditRow {
    pub id: DbId,
    pub record_id: DbId,
    pub edited_by: DbId,
    pub role: String,
    pub action: String,
    pub photos_added: serde_json::Value,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

/// A history row joined with `users.display_name`.
#[derive(Debug, Clone, FromRow)]
pub struct HistoryEntryRow {
    #[sqlx(flatten)]
    pub edit: HistoryEditRow,
    pub editor_name: String,
}

/// Insert DTO; the hash is computed by the caller inside the commit.
#[derive(Debug, Clone)]
pub struct CreateHistoryEdit {
    pub record_id: DbId,
    pub edited_by: DbId,
    pub role: Role,
    pub action: String,
    pub photos_added: serde_json::Value,
    pub integrity_hash: String,
    pub created_at: Timestamp,
}

impl TryFrom<HistoryEditRow> for HistoryEdit {
    type Error = StoreError;

    fn try_from(row: HistoryEditRow) -> Result<Self, Self::Error> {
        let role: Role = row
            .role
            .parse()
            .map_err(|e| invalid_column("history_edits", "role", &row.role, e))?;
        Ok(HistoryEdit {
            id: row.id,
            record_id: row.record_id,
            edited_by: row.edited_by,
            role,
            action: row.action,
            photos_added: row.photos_added,
            integrity_hash: row.integrity_hash,
            created_at: row.created_at,
        })
    }
}

impl TryFrom<HistoryEntryRow> for HistoryEntry {
    type Error = StoreError;

    fn try_from(row: HistoryEntryRow) -> Result<Self, Self::Error> {
        Ok(HistoryEntry {
            edit: row.edit.try_into()?,
            editor_name: row.editor_name,
        })
    }
}
