use serde::{Deserialize, Serialize};
use sqlx::{FromRow, PgPool};
use time::{Duration, OffsetDateTime};
use uuid::Uuid;

/// Recording row. `deleted_at` is the soft-delete flag: NULL = active.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Recording {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub duration_secs: i64,
    pub start_time: Option<OffsetDateTime>,
    pub file: String,
    pub deleted_at: Option<OffsetDateTime>,
}

/// Recording joined with its owner, for the admin listing.
#[derive(Debug, Clone, FromRow)]
pub struct AdminRecordingRow {
    pub id: Uuid,
    pub name: String,
    pub user_id: Uuid,
    pub user_email: String,
    pub created_at: OffsetDateTime,
    pub updated_at: OffsetDateTime,
    pub duration_secs: i64,
    pub start_time: Option<OffsetDateTime>,
    pub file: String,
    pub deleted_at: Option<OffsetDateTime>,
}

/// Media key for a recording, deterministic per (user, recording).
pub fn media_key(user_id: Uuid, recording_id: Uuid) -> String {
    format!("{}/{}", user_id, recording_id)
}

/// Start time derived from the save timestamp and capture duration.
pub fn derived_start_time(created_at: OffsetDateTime, duration_secs: i64) -> OffsetDateTime {
    created_at - Duration::seconds(duration_secs)
}

impl Recording {
    /// Insert a new row, then run the `start_time` backfill. The
    /// returned recording reflects both statements.
    pub async fn insert(
        db: &PgPool,
        id: Uuid,
        user_id: Uuid,
        name: &str,
        duration_secs: i64,
        start_time: Option<OffsetDateTime>,
        file: &str,
    ) -> anyhow::Result<Recording> {
        let rec = sqlx::query_as::<_, Recording>(
            r#"
            INSERT INTO recordings (id, name, user_id, duration_secs, start_time, file)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, user_id, created_at, updated_at, duration_secs, start_time,
                      file, deleted_at
            "#,
        )
        .bind(id)
        .bind(name)
        .bind(user_id)
        .bind(duration_secs)
        .bind(start_time)
        .bind(file)
        .fetch_one(db)
        .await?;

        Self::backfill_start_time(db, rec).await
    }

    /// Runs after every save: while `start_time` is unset, derive it
    /// from `created_at - duration` and persist it with a second
    /// statement.
    pub async fn backfill_start_time(db: &PgPool, rec: Recording) -> anyhow::Result<Recording> {
        if rec.start_time.is_some() {
            return Ok(rec);
        }

        let start = derived_start_time(rec.created_at, rec.duration_secs);
        let rec = sqlx::query_as::<_, Recording>(
            r#"
            UPDATE recordings
               SET start_time = $2, updated_at = now()
             WHERE id = $1
            RETURNING id, name, user_id, created_at, updated_at, duration_secs, start_time,
                      file, deleted_at
            "#,
        )
        .bind(rec.id)
        .bind(start)
        .fetch_one(db)
        .await?;
        Ok(rec)
    }

    /// Default read path: the requesting user's recordings, soft-deleted
    /// rows excluded, newest first.
    pub async fn list_active_by_user(db: &PgPool, user_id: Uuid) -> anyhow::Result<Vec<Recording>> {
        let rows = sqlx::query_as::<_, Recording>(
            r#"
            SELECT id, name, user_id, created_at, updated_at, duration_secs, start_time,
                   file, deleted_at
            FROM recordings
            WHERE user_id = $1 AND deleted_at IS NULL
            ORDER BY created_at DESC
            "#,
        )
        .bind(user_id)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    pub async fn list_deleted(db: &PgPool) -> anyhow::Result<Vec<Recording>> {
        let rows = sqlx::query_as::<_, Recording>(
            r#"
            SELECT id, name, user_id, created_at, updated_at, duration_secs, start_time,
                   file, deleted_at
            FROM recordings
            WHERE deleted_at IS NOT NULL
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Admin listing with owner email, optionally scoped to one user and
    /// optionally including soft-deleted rows.
    pub async fn list_admin(
        db: &PgPool,
        user_id: Option<Uuid>,
        include_deleted: bool,
    ) -> anyhow::Result<Vec<AdminRecordingRow>> {
        let rows = sqlx::query_as::<_, AdminRecordingRow>(
            r#"
            SELECT r.id, r.name, r.user_id, u.email AS user_email, r.created_at, r.updated_at,
                   r.duration_secs, r.start_time, r.file, r.deleted_at
            FROM recordings r
            JOIN users u ON u.id = r.user_id
            WHERE ($1::uuid IS NULL OR r.user_id = $1)
              AND ($2 OR r.deleted_at IS NULL)
            ORDER BY r.created_at DESC
            "#,
        )
        .bind(user_id)
        .bind(include_deleted)
        .fetch_all(db)
        .await?;
        Ok(rows)
    }

    /// Soft delete: stamp `deleted_at` instead of removing the row.
    /// Returns None if the recording is unknown or already deleted.
    pub async fn soft_delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recording>> {
        let rec = sqlx::query_as::<_, Recording>(
            r#"
            UPDATE recordings
               SET deleted_at = now(), updated_at = now()
             WHERE id = $1 AND deleted_at IS NULL
            RETURNING id, name, user_id, created_at, updated_at, duration_secs, start_time,
                      file, deleted_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(rec)
    }

    /// Clear the soft-delete flag. Returns None if the recording is
    /// unknown or not deleted.
    pub async fn restore(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recording>> {
        let rec = sqlx::query_as::<_, Recording>(
            r#"
            UPDATE recordings
               SET deleted_at = NULL, updated_at = now()
             WHERE id = $1 AND deleted_at IS NOT NULL
            RETURNING id, name, user_id, created_at, updated_at, duration_secs, start_time,
                      file, deleted_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(rec)
    }

    /// Actually remove the row. The caller is responsible for the media
    /// file (see `services::hard_delete_recording`).
    pub async fn hard_delete(db: &PgPool, id: Uuid) -> anyhow::Result<Option<Recording>> {
        let rec = sqlx::query_as::<_, Recording>(
            r#"
            DELETE FROM recordings
             WHERE id = $1
            RETURNING id, name, user_id, created_at, updated_at, duration_secs, start_time,
                      file, deleted_at
            "#,
        )
        .bind(id)
        .fetch_optional(db)
        .await?;
        Ok(rec)
    }

    /// Bulk restore of every soft-deleted row.
    pub async fn restore_deleted(db: &PgPool) -> anyhow::Result<u64> {
        let result = sqlx::query(
            r#"
            UPDATE recordings
               SET deleted_at = NULL, updated_at = now()
             WHERE deleted_at IS NOT NULL
            "#,
        )
        .execute(db)
        .await?;
        Ok(result.rows_affected())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::macros::datetime;

    #[test]
    fn media_key_is_user_slash_recording() {
        let user = Uuid::new_v4();
        let rec = Uuid::new_v4();
        assert_eq!(media_key(user, rec), format!("{user}/{rec}"));
    }

    #[test]
    fn start_time_is_created_at_minus_duration() {
        let created = datetime!(2024-05-01 12:00:00 UTC);
        let start = derived_start_time(created, 3600);
        assert_eq!(start, datetime!(2024-05-01 11:00:00 UTC));
    }

    #[test]
    fn zero_duration_yields_creation_time() {
        let created = datetime!(2024-05-01 12:00:00 UTC);
        assert_eq!(derived_start_time(created, 0), created);
    }
}
