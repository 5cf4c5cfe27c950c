use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lesson_core::model::{
    AccessLogEntry, CourseId, LessonId, LessonTrack, Timecode, TrackId, UserId,
};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use thiserror::Error;

/// Errors surfaced by storage adapters.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StorageError {
    #[error("not found")]
    NotFound,

    /// A second track for the same (user, course, lesson) triple.
    #[error("unique constraint violation")]
    UniqueViolation,

    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),
}

/// Insert shape for a track that has not been assigned an id yet.
///
/// Fresh tracks always start at zero position and unknown duration, so only
/// the identity triple and creation time travel to the adapter.
#[derive(Debug, Clone)]
pub struct NewTrackRecord {
    pub user_id: UserId,
    pub course_id: CourseId,
    pub lesson_id: LessonId,
    pub created_at: DateTime<Utc>,
}

/// Persisted shape for an access log entry, including its row id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogRecord {
    pub id: Option<i64>,
    pub track_id: TrackId,
    pub position: Timecode,
    pub accessed_at: DateTime<Utc>,
}

impl AccessLogRecord {
    #[must_use]
    pub fn from_entry(entry: &AccessLogEntry) -> Self {
        Self {
            id: None,
            track_id: entry.track_id(),
            position: entry.position(),
            accessed_at: entry.accessed_at(),
        }
    }

    /// Convert the record back into a domain entry.
    #[must_use]
    pub fn to_entry(&self) -> AccessLogEntry {
        AccessLogEntry::new(self.track_id, self.position, self.accessed_at)
    }
}

/// Repository contract for lesson progress tracks.
#[async_trait]
pub trait TrackRepository: Send + Sync {
    /// Insert a fresh track and return its assigned id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UniqueViolation` when a track already exists
    /// for the same (user, course, lesson) triple.
    async fn insert_track(&self, record: NewTrackRecord) -> Result<TrackId, StorageError>;

    /// Fetch a track by id. Returns `Ok(None)` when missing.
    async fn get_track(&self, id: TrackId) -> Result<Option<LessonTrack>, StorageError>;

    /// Look a track up by its identity triple.
    async fn find_track(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonTrack>, StorageError>;

    /// Persist position/duration/completion changes for an existing track.
    ///
    /// The identity triple and creation time are immutable and not written.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the track does not exist.
    async fn update_track(&self, track: &LessonTrack) -> Result<(), StorageError>;

    /// Delete a track; its access logs go with it.
    async fn delete_track(&self, id: TrackId) -> Result<(), StorageError>;

    /// All tracks for a course, ordered by id.
    async fn tracks_for_course(&self, course_id: CourseId)
    -> Result<Vec<LessonTrack>, StorageError>;
}

/// Repository contract for the append-only access history.
#[async_trait]
pub trait AccessLogRepository: Send + Sync {
    /// Append one access snapshot; returns the new row id.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` when the referenced track is gone.
    async fn append_log(&self, entry: &AccessLogEntry) -> Result<i64, StorageError>;

    /// All logs for a track, oldest access first.
    async fn logs_for_track(&self, track_id: TrackId)
    -> Result<Vec<AccessLogRecord>, StorageError>;

    async fn log_count(&self, track_id: TrackId) -> Result<u64, StorageError>;

    async fn last_log(&self, track_id: TrackId) -> Result<Option<AccessLogRecord>, StorageError>;
}

//
// ─── IN-MEMORY ADAPTER ─────────────────────────────────────────────────────────
//

#[derive(Default)]
struct State {
    tracks: HashMap<TrackId, LessonTrack>,
    logs: Vec<AccessLogRecord>,
    next_track_id: u64,
    next_log_id: i64,
}

/// Simple in-memory repository implementation for testing and prototyping.
///
/// Mirrors the SQLite adapter's behavior, including the uniqueness of the
/// (user, course, lesson) triple and cascade deletion of logs.
#[derive(Clone, Default)]
pub struct InMemoryRepository {
    state: Arc<Mutex<State>>,
}

impl InMemoryRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> Result<MutexGuard<'_, State>, StorageError> {
        self.state
            .lock()
            .map_err(|e| StorageError::Connection(e.to_string()))
    }
}

#[async_trait]
impl TrackRepository for InMemoryRepository {
    async fn insert_track(&self, record: NewTrackRecord) -> Result<TrackId, StorageError> {
        let mut state = self.lock()?;

        let duplicate = state.tracks.values().any(|t| {
            t.user_id() == record.user_id
                && t.course_id() == record.course_id
                && t.lesson_id() == record.lesson_id
        });
        if duplicate {
            return Err(StorageError::UniqueViolation);
        }

        state.next_track_id += 1;
        let id = TrackId::new(state.next_track_id);
        let track = LessonTrack::new(
            id,
            record.user_id,
            record.course_id,
            record.lesson_id,
            record.created_at,
        );
        state.tracks.insert(id, track);
        Ok(id)
    }

    async fn get_track(&self, id: TrackId) -> Result<Option<LessonTrack>, StorageError> {
        let state = self.lock()?;
        Ok(state.tracks.get(&id).cloned())
    }

    async fn find_track(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonTrack>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .tracks
            .values()
            .find(|t| {
                t.user_id() == user_id && t.course_id() == course_id && t.lesson_id() == lesson_id
            })
            .cloned())
    }

    async fn update_track(&self, track: &LessonTrack) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        match state.tracks.get_mut(&track.id()) {
            Some(existing) => {
                *existing = track.clone();
                Ok(())
            }
            None => Err(StorageError::NotFound),
        }
    }

    async fn delete_track(&self, id: TrackId) -> Result<(), StorageError> {
        let mut state = self.lock()?;
        if state.tracks.remove(&id).is_none() {
            return Err(StorageError::NotFound);
        }
        state.logs.retain(|log| log.track_id != id);
        Ok(())
    }

    async fn tracks_for_course(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<LessonTrack>, StorageError> {
        let state = self.lock()?;
        let mut tracks: Vec<LessonTrack> = state
            .tracks
            .values()
            .filter(|t| t.course_id() == course_id)
            .cloned()
            .collect();
        tracks.sort_by_key(|t| t.id().value());
        Ok(tracks)
    }
}

#[async_trait]
impl AccessLogRepository for InMemoryRepository {
    async fn append_log(&self, entry: &AccessLogEntry) -> Result<i64, StorageError> {
        let mut state = self.lock()?;
        if !state.tracks.contains_key(&entry.track_id()) {
            return Err(StorageError::NotFound);
        }

        state.next_log_id += 1;
        let id = state.next_log_id;
        let mut record = AccessLogRecord::from_entry(entry);
        record.id = Some(id);
        state.logs.push(record);
        Ok(id)
    }

    async fn logs_for_track(
        &self,
        track_id: TrackId,
    ) -> Result<Vec<AccessLogRecord>, StorageError> {
        let state = self.lock()?;
        let mut logs: Vec<AccessLogRecord> = state
            .logs
            .iter()
            .filter(|log| log.track_id == track_id)
            .cloned()
            .collect();
        logs.sort_by_key(|log| (log.accessed_at, log.id));
        Ok(logs)
    }

    async fn log_count(&self, track_id: TrackId) -> Result<u64, StorageError> {
        let state = self.lock()?;
        let count = state
            .logs
            .iter()
            .filter(|log| log.track_id == track_id)
            .count();
        Ok(count as u64)
    }

    async fn last_log(&self, track_id: TrackId) -> Result<Option<AccessLogRecord>, StorageError> {
        let state = self.lock()?;
        Ok(state
            .logs
            .iter()
            .filter(|log| log.track_id == track_id)
            .max_by_key(|log| (log.accessed_at, log.id))
            .cloned())
    }
}

//
// ─── STORAGE AGGREGATE ─────────────────────────────────────────────────────────
//

/// Aggregates the repositories behind trait objects for easy backend swapping.
#[derive(Clone)]
pub struct Storage {
    pub tracks: Arc<dyn TrackRepository>,
    pub access_logs: Arc<dyn AccessLogRepository>,
}

impl Storage {
    #[must_use]
    pub fn in_memory() -> Self {
        let repo = InMemoryRepository::new();
        let tracks: Arc<dyn TrackRepository> = Arc::new(repo.clone());
        let access_logs: Arc<dyn AccessLogRepository> = Arc::new(repo);
        Self {
            tracks,
            access_logs,
        }
    }
}
