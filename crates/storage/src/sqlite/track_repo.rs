use lesson_core::model::{CourseId, LessonId, LessonTrack, Timecode, TrackId, UserId};

use super::SqliteRepository;
use super::mapping::{id_to_i64, map_track_row, track_id_from_i64};
use crate::repository::{NewTrackRecord, StorageError, TrackRepository};

/// Folds the driver error into the storage taxonomy; the unique index on
/// (user_id, course_id, lesson_id) is the only unique constraint writes can
/// trip.
fn map_write_err(e: sqlx::Error) -> StorageError {
    match &e {
        sqlx::Error::Database(db) if db.kind() == sqlx::error::ErrorKind::UniqueViolation => {
            StorageError::UniqueViolation
        }
        _ => StorageError::Connection(e.to_string()),
    }
}

#[async_trait::async_trait]
impl TrackRepository for SqliteRepository {
    async fn insert_track(&self, record: NewTrackRecord) -> Result<TrackId, StorageError> {
        let user_id = id_to_i64("user_id", record.user_id.value())?;
        let course_id = id_to_i64("course_id", record.course_id.value())?;
        let lesson_id = id_to_i64("lesson_id", record.lesson_id.value())?;

        let res = sqlx::query(
            r"
            INSERT INTO lesson_tracks (user_id, course_id, lesson_id, position, duration, created_at, completed)
            VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0)
            ",
        )
        .bind(user_id)
        .bind(course_id)
        .bind(lesson_id)
        .bind(Timecode::ZERO.to_string())
        .bind(Timecode::ZERO.to_string())
        .bind(record.created_at)
        .execute(&self.pool)
        .await
        .map_err(map_write_err)?;

        track_id_from_i64(res.last_insert_rowid())
    }

    async fn get_track(&self, id: TrackId) -> Result<Option<LessonTrack>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, course_id, lesson_id, position, duration, created_at, completed
            FROM lesson_tracks WHERE id = ?1
            ",
        )
        .bind(id_to_i64("track_id", id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_track_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn find_track(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonTrack>, StorageError> {
        let row = sqlx::query(
            r"
            SELECT id, user_id, course_id, lesson_id, position, duration, created_at, completed
            FROM lesson_tracks
            WHERE user_id = ?1 AND course_id = ?2 AND lesson_id = ?3
            ",
        )
        .bind(id_to_i64("user_id", user_id.value())?)
        .bind(id_to_i64("course_id", course_id.value())?)
        .bind(id_to_i64("lesson_id", lesson_id.value())?)
        .fetch_optional(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        match row {
            Some(row) => map_track_row(&row).map(Some),
            None => Ok(None),
        }
    }

    async fn update_track(&self, track: &LessonTrack) -> Result<(), StorageError> {
        // The identity triple and created_at never change after insert.
        let res = sqlx::query(
            r"
            UPDATE lesson_tracks
            SET position = ?2, duration = ?3, completed = ?4
            WHERE id = ?1
            ",
        )
        .bind(id_to_i64("track_id", track.id().value())?)
        .bind(track.position().to_string())
        .bind(track.duration().to_string())
        .bind(if track.is_completed() { 1 } else { 0 })
        .execute(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn delete_track(&self, id: TrackId) -> Result<(), StorageError> {
        let res = sqlx::query("DELETE FROM lesson_tracks WHERE id = ?1")
            .bind(id_to_i64("track_id", id.value())?)
            .execute(&self.pool)
            .await
            .map_err(|e| StorageError::Connection(e.to_string()))?;

        if res.rows_affected() == 0 {
            return Err(StorageError::NotFound);
        }
        Ok(())
    }

    async fn tracks_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<LessonTrack>, StorageError> {
        let rows = sqlx::query(
            r"
            SELECT id, user_id, course_id, lesson_id, position, duration, created_at, completed
            FROM lesson_tracks
            WHERE course_id = ?1
            ORDER BY id ASC
            ",
        )
        .bind(id_to_i64("course_id", course_id.value())?)
        .fetch_all(&self.pool)
        .await
        .map_err(|e| StorageError::Connection(e.to_string()))?;

        let mut tracks = Vec::with_capacity(rows.len());
        for row in rows {
            tracks.push(map_track_row(&row)?);
        }
        Ok(tracks)
    }
}
