//! Repository for the `edit_requests` table.

use inspecta_core::edit_request::{
    EditRequestFilter, NewEditRequest, Resolution, STATUS_PENDIENTE,
};
use inspecta_core::types::DbId;
use sqlx::PgPool;

use crate::models::edit_request::EditRequestRow;

/// Column list for `edit_requests` queries.
const COLUMNS: &str = "id, record_id, requester_id, status, motivo, created_at, \
                       resolved_at, resolved_by";

pub struct EditRequestRepo;

impl EditRequestRepo {
    /// Insert a pending request unless one already exists for the same
    /// record and requester.
    ///
    /// Uses `INSERT ... ON CONFLICT DO NOTHING` against the partial unique
    /// index on pending requests, so the check and the insert are one
    /// statement. Returns `None` on conflict.
    pub async fn create_if_none_pending(
        pool: &PgPool,
        input: &NewEditRequest,
    ) -> Result<Option<EditRequestRow>, sqlx::Error> {
        let query = format!(
            "INSERT INTO edit_requests (record_id, requester_id, motivo, created_at) \
             VALUES ($1, $2, $3, $4) \
             ON CONFLICT (record_id, requester_id) WHERE status = '{STATUS_PENDIENTE}' \
             DO NOTHING \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditRequestRow>(&query)
            .bind(input.record_id)
            .bind(input.requester_id)
            .bind(&input.motivo)
            .bind(input.created_at)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_pending(
        pool: &PgPool,
        record_id: DbId,
        requester_id: DbId,
    ) -> Result<Option<EditRequestRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM edit_requests \
             WHERE record_id = $1 AND requester_id = $2 AND status = $3"
        );
        sqlx::query_as::<_, EditRequestRow>(&query)
            .bind(record_id)
            .bind(requester_id)
            .bind(STATUS_PENDIENTE)
            .fetch_optional(pool)
            .await
    }

    pub async fn find_by_id(
        pool: &PgPool,
        id: DbId,
    ) -> Result<Option<EditRequestRow>, sqlx::Error> {
        let query = format!("SELECT {COLUMNS} FROM edit_requests WHERE id = $1");
        sqlx::query_as::<_, EditRequestRow>(&query)
            .bind(id)
            .fetch_optional(pool)
            .await
    }

    /// Resolve a request iff it is still pending. Returns `None` otherwise.
    pub async fn resolve(
        pool: &PgPool,
        resolution: &Resolution,
    ) -> Result<Option<EditRequestRow>, sqlx::Error> {
        let query = format!(
            "UPDATE edit_requests \
             SET status = $2, resolved_at = $3, resolved_by = $4 \
             WHERE id = $1 AND status = $5 \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, EditRequestRow>(&query)
            .bind(resolution.request_id)
            .bind(resolution.status.as_str())
            .bind(resolution.resolved_at)
            .bind(resolution.resolved_by)
            .bind(STATUS_PENDIENTE)
            .fetch_optional(pool)
            .await
    }

    /// List requests matching `filter`, newest first.
    pub async fn list(
        pool: &PgPool,
        filter: &EditRequestFilter,
    ) -> Result<Vec<EditRequestRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM edit_requests \
             WHERE ($1::text IS NULL OR status = $1) \
               AND ($2::bigint IS NULL OR record_id = $2) \
               AND ($3::bigint IS NULL OR requester_id = $3) \
             ORDER BY created_at DESC, id DESC"
        );
        sqlx::query_as::<_, EditRequestRow>(&query)
            .bind(filter.status.map(|s| s.as_str()))
            .bind(filter.record_id)
            .bind(filter.requester_id)
            .fetch_all(pool)
            .await
    }
}
