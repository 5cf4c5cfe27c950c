use lesson_core::model::{CourseId, LessonId, LessonTrack, Timecode, TrackId, UserId};
use sqlx::Row;
use sqlx::sqlite::SqliteRow;

use crate::repository::{AccessLogRecord, StorageError};

pub(crate) fn ser<E: core::fmt::Display>(e: E) -> StorageError {
    StorageError::Serialization(e.to_string())
}

pub(crate) fn id_to_i64(field: &'static str, v: u64) -> Result<i64, StorageError> {
    i64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} overflow")))
}

fn i64_to_u64(field: &'static str, v: i64) -> Result<u64, StorageError> {
    u64::try_from(v).map_err(|_| StorageError::Serialization(format!("{field} sign overflow")))
}

pub(crate) fn track_id_from_i64(v: i64) -> Result<TrackId, StorageError> {
    Ok(TrackId::new(i64_to_u64("track_id", v)?))
}

fn timecode_from_text(field: &'static str, raw: &str) -> Result<Timecode, StorageError> {
    raw.parse()
        .map_err(|_| StorageError::Serialization(format!("invalid {field}: {raw}")))
}

pub(crate) fn map_track_row(row: &SqliteRow) -> Result<LessonTrack, StorageError> {
    let position = timecode_from_text(
        "position",
        &row.try_get::<String, _>("position").map_err(ser)?,
    )?;
    let duration = timecode_from_text(
        "duration",
        &row.try_get::<String, _>("duration").map_err(ser)?,
    )?;

    Ok(LessonTrack::from_persisted(
        track_id_from_i64(row.try_get::<i64, _>("id").map_err(ser)?)?,
        UserId::new(i64_to_u64(
            "user_id",
            row.try_get::<i64, _>("user_id").map_err(ser)?,
        )?),
        CourseId::new(i64_to_u64(
            "course_id",
            row.try_get::<i64, _>("course_id").map_err(ser)?,
        )?),
        LessonId::new(i64_to_u64(
            "lesson_id",
            row.try_get::<i64, _>("lesson_id").map_err(ser)?,
        )?),
        position,
        duration,
        row.try_get("created_at").map_err(ser)?,
        row.try_get::<i64, _>("completed").map_err(ser)? != 0,
    ))
}

pub(crate) fn map_log_row(row: &SqliteRow) -> Result<AccessLogRecord, StorageError> {
    let position = timecode_from_text(
        "position",
        &row.try_get::<String, _>("position").map_err(ser)?,
    )?;

    Ok(AccessLogRecord {
        id: Some(row.try_get("id").map_err(ser)?),
        track_id: track_id_from_i64(row.try_get::<i64, _>("track_id").map_err(ser)?)?,
        position,
        accessed_at: row.try_get("accessed_at").map_err(ser)?,
    })
}
