//! Photo models.

use inspecta_core::types::{DbId, Timestamp};
use serde::Serialize;
use sqlx::FromRow;

/// A row from the `photos` table.
#[derive(Debug, Clone, FromRow, Serialize)]
pub struct PhotoRow {
    pub id: DbId,
    pub record_id: DbId,
    pub image_data: String,
    pub description: Option<String>,
    pub created_at: Timestamp,
}
