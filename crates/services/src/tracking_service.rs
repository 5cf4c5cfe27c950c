use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{debug, info};

use lesson_core::Clock;
use lesson_core::model::{
    AccessLogEntry, CourseId, LessonId, LessonTrack, Timecode, TrackId, UserId,
};
use storage::repository::{
    AccessLogRecord, AccessLogRepository, NewTrackRecord, StorageError, TrackRepository,
};

use crate::error::TrackingError;
use crate::report::ProgressReport;

//
// ─── PLAYBACK UPDATE ───────────────────────────────────────────────────────────
//

/// Outcome of one player position report.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlaybackUpdate {
    /// The track after the report was applied.
    pub track: LessonTrack,
    /// Whether the stored position moved forward; stale reports leave it.
    pub advanced: bool,
    /// Row id of the appended access log entry.
    pub log_id: i64,
}

//
// ─── SERVICE ───────────────────────────────────────────────────────────────────
//

/// Orchestrates lesson progress tracks and their access logs.
///
/// One instance serves many users; per-call state is loaded from the
/// repositories. Two simultaneous reports for the same track follow the
/// usual read-modify-write pattern and can lose one update; that race is an
/// accepted limitation of the request-scoped design, not something the
/// service coordinates.
#[derive(Clone)]
pub struct TrackingService {
    clock: Clock,
    tracks: Arc<dyn TrackRepository>,
    access_logs: Arc<dyn AccessLogRepository>,
}

impl TrackingService {
    #[must_use]
    pub fn new(
        clock: Clock,
        tracks: Arc<dyn TrackRepository>,
        access_logs: Arc<dyn AccessLogRepository>,
    ) -> Self {
        Self {
            clock,
            tracks,
            access_logs,
        }
    }

    /// Current time according to the service's clock.
    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    /// Start tracking a lesson for a user.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::UniqueViolation` (wrapped) when the user
    /// already has a track for this lesson, and other storage errors if
    /// persistence fails.
    pub async fn begin_tracking(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<TrackId, TrackingError> {
        let record = NewTrackRecord {
            user_id,
            course_id,
            lesson_id,
            created_at: self.clock.now(),
        };
        let track_id = self.tracks.insert_track(record).await?;
        info!(%user_id, %course_id, %lesson_id, %track_id, "tracking started");
        Ok(track_id)
    }

    /// Look a track up by its identity triple.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the lookup fails.
    pub async fn find_track(
        &self,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
    ) -> Result<Option<LessonTrack>, TrackingError> {
        Ok(self.tracks.find_track(user_id, course_id, lesson_id).await?)
    }

    /// Apply a player position report.
    ///
    /// Advances the track when the report moves forward (stale and duplicate
    /// reports leave the stored position alone) and appends an access log
    /// entry snapshotting the reported position either way.
    ///
    /// # Errors
    ///
    /// Returns `TimecodeError` (wrapped) for a malformed position,
    /// `StorageError::NotFound` for an unknown track, and other storage
    /// errors if persistence fails.
    pub async fn record_playback(
        &self,
        track_id: TrackId,
        raw_position: &str,
    ) -> Result<PlaybackUpdate, TrackingError> {
        let reported: Timecode = raw_position.parse()?;
        let mut track = self.load_track(track_id).await?;

        let advanced = track.advance_to(reported);
        if advanced {
            self.tracks.update_track(&track).await?;
        } else {
            debug!(%track_id, %reported, "stale position report ignored");
        }

        let entry = AccessLogEntry::new(track_id, reported, self.clock.now());
        let log_id = self.access_logs.append_log(&entry).await?;

        Ok(PlaybackUpdate {
            track,
            advanced,
            log_id,
        })
    }

    /// Store the total video duration once the platform reports it.
    ///
    /// # Errors
    ///
    /// Returns `TimecodeError` (wrapped) for a malformed duration,
    /// `StorageError::NotFound` for an unknown track, and other storage
    /// errors if persistence fails.
    pub async fn record_duration(
        &self,
        track_id: TrackId,
        raw_duration: &str,
    ) -> Result<(), TrackingError> {
        let mut track = self.load_track(track_id).await?;
        track.record_duration(raw_duration)?;
        self.tracks.update_track(&track).await?;
        Ok(())
    }

    /// Recompute the completion flag and persist a transition.
    ///
    /// An explicit command rather than a hidden write during reads: callers
    /// that want a fresh flag invoke this, callers that only want the stored
    /// value use [`is_completed`](Self::is_completed). Already-completed
    /// tracks return immediately; the flag never reverts.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown track and other
    /// storage errors if persistence fails.
    pub async fn refresh_completion(&self, track_id: TrackId) -> Result<bool, TrackingError> {
        let mut track = self.load_track(track_id).await?;
        if track.is_completed() {
            return Ok(true);
        }

        track.recompute_completion();
        if track.is_completed() {
            self.tracks.update_track(&track).await?;
            info!(%track_id, "lesson completed");
        }
        Ok(track.is_completed())
    }

    /// Read the stored completion flag without writing anything.
    ///
    /// # Errors
    ///
    /// Returns `StorageError::NotFound` for an unknown track.
    pub async fn is_completed(&self, track_id: TrackId) -> Result<bool, TrackingError> {
        Ok(self.load_track(track_id).await?.is_completed())
    }

    /// Number of access log entries recorded for a track.
    ///
    /// # Errors
    ///
    /// Returns storage errors if the count query fails.
    pub async fn log_count(&self, track_id: TrackId) -> Result<u64, TrackingError> {
        Ok(self.access_logs.log_count(track_id).await?)
    }

    /// Assemble the caller-facing progress view for one track.
    ///
    /// # Errors
    ///
    /// Returns `TrackError::ZeroDuration` (wrapped) for a track whose
    /// position advanced while its duration is still unreported, plus the
    /// usual storage errors.
    pub async fn progress_report(&self, track_id: TrackId) -> Result<ProgressReport, TrackingError> {
        let track = self.load_track(track_id).await?;
        self.report_for(&track).await
    }

    /// Per-course progress listing, one report per tracked lesson.
    ///
    /// # Errors
    ///
    /// Fails on the first track whose report cannot be assembled; errors
    /// propagate unmodified.
    pub async fn course_overview(
        &self,
        course_id: CourseId,
    ) -> Result<Vec<ProgressReport>, TrackingError> {
        let tracks = self.tracks.tracks_for_course(course_id).await?;
        let mut reports = Vec::with_capacity(tracks.len());
        for track in &tracks {
            reports.push(self.report_for(track).await?);
        }
        Ok(reports)
    }

    async fn load_track(&self, track_id: TrackId) -> Result<LessonTrack, TrackingError> {
        Ok(self
            .tracks
            .get_track(track_id)
            .await?
            .ok_or(StorageError::NotFound)?)
    }

    async fn report_for(&self, track: &LessonTrack) -> Result<ProgressReport, TrackingError> {
        let records = self.access_logs.logs_for_track(track.id()).await?;
        let entries: Vec<AccessLogEntry> = records.iter().map(AccessLogRecord::to_entry).collect();
        let access_count = entries.len() as u64;

        Ok(ProgressReport {
            track_id: track.id(),
            user_id: track.user_id(),
            course_id: track.course_id(),
            lesson_id: track.lesson_id(),
            position: track.display_position(),
            duration: track.display_duration(),
            percent: track.percent_complete()?,
            access_count,
            time_spent: track.time_spent(access_count),
            last_access: track.last_access_time(&entries),
            completed: track.is_completed(),
        })
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//
