//! Repository for the append-only `history_edits` table.
//!
//! There is no update or delete method; a table trigger rejects both.

use inspecta_core::roles::ROLE_WORKER;
use inspecta_core::types::DbId;
use sqlx::{PgConnection, PgExecutor, PgPool};

use crate::models::history_edit::{CreateHistoryEdit, HistoryEditRow, HistoryEntryRow};

/// Column list for `history_edits` queries.
const COLUMNS: &str = "id, record_id, edited_by, role, action, photos_added, \
                       integrity_hash, created_at";

pub struct HistoryEditRepo;

impl HistoryEditRepo {
    pub async fn append(
        conn: &mut PgConnection,
        input: &CreateHistoryEdit,
    ) -> Result<HistoryEditRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO history_edits \
                (record_id, edited_by, role, action, photos_added, integrity_hash, created_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, HistoryEditRow>(&query)
            .bind(input.record_id)
            .bind(input.edited_by)
            .bind(input.role.as_str())
            .bind(&input.action)
            .bind(&input.photos_added)
            .bind(&input.integrity_hash)
            .bind(input.created_at)
            .fetch_one(conn)
            .await
    }

    /// Hash of the newest entry for a record, the link the next entry chains to.
    pub async fn latest_hash(
        conn: &mut PgConnection,
        record_id: DbId,
    ) -> Result<Option<String>, sqlx::Error> {
        let row: Option<(String,)> = sqlx::query_as(
            "SELECT integrity_hash FROM history_edits \
             WHERE record_id = $1 ORDER BY id DESC LIMIT 1",
        )
        .bind(record_id)
        .fetch_optional(conn)
        .await?;
        Ok(row.map(|r| r.0))
    }

    pub async fn count_worker_edits<'e, E: PgExecutor<'e>>(
        executor: E,
        record_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as(
            "SELECT COUNT(*) FROM history_edits WHERE record_id = $1 AND role = $2",
        )
        .bind(record_id)
        .bind(ROLE_WORKER)
        .fetch_one(executor)
        .await?;
        Ok(row.0)
    }

    /// Entries for a record with editor names, newest first.
    pub async fn list_for_record(
        pool: &PgPool,
        record_id: DbId,
    ) -> Result<Vec<HistoryEntryRow>, sqlx::Error> {
        sqlx::query_as::<_, HistoryEntryRow>(
            "SELECT h.id, h.record_id, h.edited_by, h.role, h.action, h.photos_added, \
                    h.integrity_hash, h.created_at, u.display_name AS editor_name \
             FROM history_edits h \
             JOIN users u ON u.id = h.edited_by \
             WHERE h.record_id = $1 \
             ORDER BY h.created_at DESC, h.id DESC",
        )
        .bind(record_id)
        .fetch_all(pool)
        .await
    }

    /// Entries for a record, oldest first, in chain order.
    pub async fn chain_for_record(
        pool: &PgPool,
        record_id: DbId,
    ) -> Result<Vec<HistoryEditRow>, sqlx::Error> {
        let query = format!(
            "SELECT {COLUMNS} FROM history_edits WHERE record_id = $1 ORDER BY id ASC"
        );
        sqlx::query_as::<_, HistoryEditRow>(&query)
            .bind(record_id)
            .fetch_all(pool)
            .await
    }
}
