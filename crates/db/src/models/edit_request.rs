//! Edit request models.

use inspecta_core::edit_request::{EditRequest, EditRequestStatus};
use inspecta_core::store::StoreError;
use inspecta_core::types::{DbId, Timestamp};
use sqlx::FromRow;

use super::invalid_column;

/// A row from the `edit_requests` table.
#[derive(Debug, Clone, FromRow)]
pub struct EditRequestRow {
    pub id: DbId,
    pub record_id: DbId,
    pub requester_id: DbId,
    pub status: String,
    pub motivo: Option<String>,
    pub created_at: Timestamp,
    pub resolved_at: Option<Timestamp>,
    pub resolved_by: Option<DbId>,
}

impl TryFrom<EditRequestRow> for EditRequest {
    type Error = StoreError;

    fn try_from(row: EditRequestRow) -> Result<Self, Self::Error> {
        let status: EditRequestStatus = row
            .status
            .parse()
            .map_err(|e| invalid_column("edit_requests", "status", &row.status, e))?;
        Ok(EditRequest {
            id: row.id,
            record_id: row.record_id,
            requester_id: row.requester_id,
            status,
            motivo: row.motivo,
            created_at: row.created_at,
            resolved_at: row.resolved_at,
            resolved_by: row.resolved_by,
        })
    }
}
