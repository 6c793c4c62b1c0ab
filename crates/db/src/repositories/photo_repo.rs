//! Repository for the `photos` table.

use inspecta_core::photo::NewPhoto;
use inspecta_core::types::DbId;
use sqlx::{PgConnection, PgExecutor};

use crate::models::photo::PhotoRow;

/// Column list for `photos` queries.
const COLUMNS: &str = "id, record_id, image_data, description, created_at";

pub struct PhotoRepo;

impl PhotoRepo {
    pub async fn create(
        conn: &mut PgConnection,
        record_id: DbId,
        photo: &NewPhoto,
    ) -> Result<PhotoRow, sqlx::Error> {
        let query = format!(
            "INSERT INTO photos (record_id, image_data, description) \
             VALUES ($1, $2, $3) \
             RETURNING {COLUMNS}"
        );
        sqlx::query_as::<_, PhotoRow>(&query)
            .bind(record_id)
            .bind(&photo.image_data)
            .bind(&photo.description)
            .fetch_one(conn)
            .await
    }

    pub async fn count_for_record<'e, E: PgExecutor<'e>>(
        executor: E,
        record_id: DbId,
    ) -> Result<i64, sqlx::Error> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM photos WHERE record_id = $1")
            .bind(record_id)
            .fetch_one(executor)
            .await?;
        Ok(row.0)
    }
}
