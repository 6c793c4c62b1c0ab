//! Inspection record models.

use inspecta_core::lease::Lease;
use inspecta_core::store::StoreError;
use inspecta_core::types::{DbId, Timestamp};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A row from the `inspection_records` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct InspectionRecord {
    pub id: DbId,
    pub lot_id: String,
    pub product: String,
    pub quantity: i32,
    pub observations: Option<String>,
    pub created_by: Option<DbId>,
    pub created_at: Timestamp,
    pub lease_owner_id: Option<DbId>,
    pub lease_started_at: Option<Timestamp>,
    pub lease_expires_at: Option<Timestamp>,
}

/// DTO for creating a record. Records are created unleased.
#[derive(Debug, Clone, Deserialize)]
pub struct CreateInspectionRecord {
    pub lot_id: String,
    pub product: String,
    pub quantity: i32,
    pub observations: Option<String>,
    pub created_by: Option<DbId>,
}

/// Just the lease columns of a record.
#[derive(Debug, Clone, FromRow)]
pub struct LeaseColumns {
    pub lease_owner_id: Option<DbId>,
    pub lease_started_at: Option<Timestamp>,
    pub lease_expires_at: Option<Timestamp>,
}

impl LeaseColumns {
    pub fn into_lease(self) -> Result<Option<Lease>, StoreError> {
        Lease::from_fields(
            self.lease_owner_id,
            self.lease_started_at,
            self.lease_expires_at,
        )
        .map_err(|e| StoreError::with_source("inspection_records lease columns", e))
    }
}
