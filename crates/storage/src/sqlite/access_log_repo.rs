use lesson_core::model::{AccessLogEntry, TrackId};
use sqlx::Row;

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_log_row, ser};
use crate::repository::{AccessLogRecord, AccessLogRepository, StorageError};

/// The only constraint an append can trip is the foreign key to its track.
fn map_append_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::ForeignKeyViolation => {
            StorageError::NotFound
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

#[async_trait::async_trait]
impl AccessLogRepository for SqliteRepository {
    async fn append_log(&self, entry: &AccessLogEntry) -> Result<i64, StorageError> {
        let track_id = id_to_i64("track_id", entry.track_id().value())?;

        let res = sqlx::query(
            r"
            INSERT INTO access_logs (track_id, position, accessed_at)
            VALUES (?1, ?2, ?3)
            ",
        )
        .bind(track_id)
        .bind(entry.position().to_string())
        .bind(entry.accessed_at())
        .execute(&self.pool)
        .await
        .map_err(map_append_err)?;

        Ok(res.last_insert_rowid())
    }

    async fn logs_for_track(
        &self,
        track_id: TrackId,
    ) -> Result<Vec<AccessLogRecord>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, track_id, position, accessed_at
            FROM access_logs
            WHERE track_id = ?1
            ORDER BY accessed_at ASC, id ASC
            ",
        )
        .bind(id_to_i64("track_id", track_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut logs = Vec::with_capacity(rows.len());
        for row in rows {
            logs.push(map_log_row(&row)?);
        }
        Ok(logs)
    }

    async fn log_count(&self, track_id: TrackId) -> Result<u64, StorageError> {
        let row = sqlx::query("SELECT COUNT(*) AS hits FROM access_logs WHERE track_id = ?1")
            .bind(id_to_i64("track_id", track_id.value())?)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        let hits: i64 = row.try_get("hits").map_err(ser)?;
        u64::try_from(hits).map_err(|_| StorageError::Serialization(format!("invalid count: {hits}")))
    }

    async fn last_log(&self, track_id: TrackId) -> Result<Option<AccessLogRecord>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, track_id, position, accessed_at
            FROM access_logs
            WHERE track_id = ?1
            ORDER BY accessed_at DESC, id DESC
            LIMIT 1
            ",
        )
        .bind(id_to_i64("track_id", track_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_log_row(&row).map(Some),
            None => Ok(None),
        }
    }
}
