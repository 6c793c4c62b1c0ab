//! Repository for `inspection_records`, including the lease columns.
//!
//! The lease columns are only ever written together, by the statements in
//! this file.

use inspecta_core::lease::Lease;
use inspecta_core::types::{DbId, Timestamp};
use sqlx::{PgConnection, PgPool};

use crate::models::record::{CreateInspectionRecord, InspectionRecord, LeaseColumns};

/// Column list for `inspection_records` queries.
const COLUMNS: &str = "id, lot_id, product, quantity, observations, created_by, created_at, \
                       lease_owner_id, lease_started_at, lease_expires_at";

/// Column list for lease-only queries.
const LEASE_COLUMNS: &str = "lease_owner_id, lease_started_at, lease_expires_at";

pub struct RecordRepo;

impl RecordRepo {
    pub async fn create(
        pool: &PgPool,
        input: &CreateInspectionRecord,
    ) -> Result<InspectionRecord, sqlx::Error> {
        let query = format!(
            "INSERT INTO inspection_records (lot_id, product, quantity, observations, created_by) \
             VALUES ($1, $2, $3, $4, $5) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, InspectionRecord>(&query)
            .bind(&input.lot_id)
            .bind(&input.product)
            .bind(input.quantity)
            .bind(&input.observations)
            .bind(input.created_by)
            .fetch_one(pool)
            .await
    }

    /// Read a record's lease columns. `None` if the record does not exist.
    pub async fn find_lease(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<LeaseColumns>, sqlx::Error> {
        let query = format!("SELECT {LEASE_COLUMNS} FROM inspection_records WHERE id = $1");
        sqlx::query_as::<_, LeaseColumns>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Read a record's lease columns and hold a row lock until the
    /// surrounding transaction ends.
    pub async fn lock_lease(
        conn: &mut PgConnection,
        id: DbId,
    ) -> Result<Option<LeaseColumns>, sqlx::Error> {
        let query = format!(
            "SELECT {LEASE_COLUMNS} FROM inspection_records WHERE id = $1 FOR UPDATE"
        );
        sqlx::query_as::<_, LeaseColumns>(&query)
            .bind(id)
            .fetch_optional(conn)
            .await
    }

    /// Write `lease` iff there is no live lease held by someone else.
    ///
    /// A single conditional `UPDATE`; returns whether a row was written.
    pub async fn try_grant_lease(
        pool: &PgPool,
        id: DbId,
        lease: &Lease,
        now: Timestamp,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE inspection_records \
             SET lease_owner_id = $2, lease_started_at = $3, lease_expires_at = $4 \
             WHERE id = $1 \
               AND (lease_owner_id IS NULL OR lease_expires_at <= $5 OR lease_owner_id = $2)",
        )
        .bind(id)
        .bind(lease.owner_id)
        .bind(lease.started_at)
        .bind(lease.expires_at)
        .bind(now)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the lease iff `owner_id` holds it.
    pub async fn release_lease(
        pool: &PgPool,
        id: DbId,
        owner_id: DbId,
    ) -> Result<bool, sqlx::Error> {
        let result = sqlx::query(
            "UPDATE inspection_records \
             SET lease_owner_id = NULL, lease_started_at = NULL, lease_expires_at = NULL \
             WHERE id = $1 AND lease_owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .execute(pool)
        .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Clear the lease unconditionally. Only called under the row lock taken
    /// by [`RecordRepo::lock_lease`].
    pub async fn clear_lease(conn: &mut PgConnection, id: DbId) -> Result<(), sqlx::Error> {
        sqlx::query(
            "UPDATE inspection_records \
             SET lease_owner_id = NULL, lease_started_at = NULL, lease_expires_at = NULL \
             WHERE id = $1",
        )
        .bind(id)
        .execute(conn)
        .await?;
        Ok(())
    }
}
