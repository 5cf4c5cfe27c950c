use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::access_log::AccessLogEntry;
use crate::model::ids::{CourseId, LessonId, TrackId, UserId};
use crate::model::timecode::{Timecode, TimecodeError, format_seconds};

/// Positions within this many seconds of the end count as completed.
pub const COMPLETION_TOLERANCE_SECS: u32 = 10;

/// Each logged access is assumed to cover one quarter of the video when
/// estimating total time spent.
pub const ASSUMED_ACCESSES_PER_VIDEO: u64 = 4;

const JUST_STARTED: &str = "just started";
const DURATION_PENDING: &str = "will be available after 25% completion";
const PERCENT_PENDING: &str = "less than 25%";

//
// ─── ERRORS ────────────────────────────────────────────────────────────────────
//

#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum TrackError {
    /// The duration is still the zero sentinel while the position is not.
    /// Inconsistent data; the percentage is undefined for such a record.
    #[error("video duration is zero while position is {position}")]
    ZeroDuration { position: Timecode },
}

//
// ─── LESSON TRACK ──────────────────────────────────────────────────────────────
//

/// Per-user viewing progress through one video lesson.
///
/// At most one track exists per (user, course, lesson) triple; storage
/// enforces the uniqueness. The position only moves forward: stale player
/// reports are ignored rather than allowed to regress progress, and the
/// completion flag never flips back to false once set.
///
/// Derivations that depend on the track's access logs take the logs (or
/// their count) as arguments so the record stays free of storage concerns.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LessonTrack {
    id: TrackId,
    user_id: UserId,
    course_id: CourseId,
    lesson_id: LessonId,
    position: Timecode,
    duration: Timecode,
    created_at: DateTime<Utc>,
    completed: bool,
}

impl LessonTrack {
    /// Fresh track: zero position, unknown duration, not completed.
    #[must_use]
    pub fn new(
        id: TrackId,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
        created_at: DateTime<Utc>,
    ) -> Self {
        Self {
            id,
            user_id,
            course_id,
            lesson_id,
            position: Timecode::ZERO,
            duration: Timecode::ZERO,
            created_at,
            completed: false,
        }
    }

    /// Rehydrate a track from persisted storage.
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn from_persisted(
        id: TrackId,
        user_id: UserId,
        course_id: CourseId,
        lesson_id: LessonId,
        position: Timecode,
        duration: Timecode,
        created_at: DateTime<Utc>,
        completed: bool,
    ) -> Self {
        Self {
            id,
            user_id,
            course_id,
            lesson_id,
            position,
            duration,
            created_at,
            completed,
        }
    }

    #[must_use]
    pub fn id(&self) -> TrackId {
        self.id
    }

    #[must_use]
    pub fn user_id(&self) -> UserId {
        self.user_id
    }

    #[must_use]
    pub fn course_id(&self) -> CourseId {
        self.course_id
    }

    #[must_use]
    pub fn lesson_id(&self) -> LessonId {
        self.lesson_id
    }

    #[must_use]
    pub fn position(&self) -> Timecode {
        self.position
    }

    #[must_use]
    pub fn duration(&self) -> Timecode {
        self.duration
    }

    #[must_use]
    pub fn created_at(&self) -> DateTime<Utc> {
        self.created_at
    }

    /// Stored completion flag. Pure read; use
    /// [`recompute_completion`](Self::recompute_completion) to update it.
    #[must_use]
    pub fn is_completed(&self) -> bool {
        self.completed
    }

    /// Apply an already-parsed player position; returns whether the stored
    /// position moved.
    pub fn advance_to(&mut self, reported: Timecode) -> bool {
        if reported > self.position {
            self.position = reported;
            true
        } else {
            false
        }
    }

    /// Parse and apply a player-reported `HH:MM:SS` position.
    ///
    /// A report at or behind the stored position is silently ignored, so the
    /// position is monotonically non-decreasing. Does not persist; the
    /// caller controls when to save.
    ///
    /// # Errors
    ///
    /// Returns `TimecodeError` when the string is not a valid timecode.
    pub fn advance_position(&mut self, raw: &str) -> Result<bool, TimecodeError> {
        Ok(self.advance_to(raw.parse()?))
    }

    /// Set the total video duration once the platform reports it.
    ///
    /// By platform convention the player only reports the true duration
    /// after 25% playback; this module encodes that convention in its
    /// display strings but does not enforce it.
    ///
    /// # Errors
    ///
    /// Returns `TimecodeError` when the string is not a valid timecode.
    pub fn record_duration(&mut self, raw: &str) -> Result<(), TimecodeError> {
        self.duration = raw.parse()?;
        Ok(())
    }

    /// Position for display: `"just started"` until the first advance.
    #[must_use]
    pub fn display_position(&self) -> String {
        if self.position.is_zero() {
            JUST_STARTED.to_owned()
        } else {
            self.position.to_string()
        }
    }

    /// Duration for display, with a hint while it is still unreported.
    #[must_use]
    pub fn display_duration(&self) -> String {
        if self.duration.is_zero() {
            DURATION_PENDING.to_owned()
        } else {
            self.duration.to_string()
        }
    }

    /// Rendered watch percentage.
    ///
    /// Before any progress is reported (position and duration both zero)
    /// this is `"less than 25%"`; afterwards it is `"approx {n} %"`.
    ///
    /// # Errors
    ///
    /// Returns [`TrackError::ZeroDuration`] when the position has advanced
    /// but the duration is still zero. The original system left this case
    /// undefined; it is surfaced here instead of dividing by zero.
    pub fn percent_complete(&self) -> Result<String, TrackError> {
        if self.position.is_zero() && self.duration.is_zero() {
            return Ok(PERCENT_PENDING.to_owned());
        }
        if self.duration.is_zero() {
            return Err(TrackError::ZeroDuration {
                position: self.position,
            });
        }

        let watched = f64::from(self.position.total_seconds());
        let duration = f64::from(self.duration.total_seconds());
        #[allow(clippy::cast_possible_truncation)]
        let percentage = (watched / duration * 100.0).round() as i64;
        Ok(format!("approx {percentage} %"))
    }

    /// Mark the track completed when the position is within
    /// [`COMPLETION_TOLERANCE_SECS`] of the end.
    ///
    /// No-op while either the position or the duration is still zero, and
    /// never flips an already-completed track back.
    pub fn recompute_completion(&mut self) {
        if self.position.is_zero() || self.duration.is_zero() {
            return;
        }
        if self.position.total_seconds() + COMPLETION_TOLERANCE_SECS >= self.duration.total_seconds()
        {
            self.completed = true;
        }
    }

    /// Timestamp of the most recent access, falling back to the track's
    /// creation time when nothing has been logged yet.
    #[must_use]
    pub fn last_access_time(&self, logs: &[AccessLogEntry]) -> DateTime<Utc> {
        logs.last()
            .map_or(self.created_at, AccessLogEntry::accessed_at)
    }

    /// Estimated total viewing time, as `HH:MM:SS`.
    ///
    /// A heuristic proxy, not a sum of session lengths: each logged access
    /// is assumed to cover one quarter of the video
    /// ([`ASSUMED_ACCESSES_PER_VIDEO`]), with the per-access share truncated
    /// to whole seconds. While the duration is unknown the estimate falls
    /// back to [`display_position`](Self::display_position).
    #[must_use]
    pub fn time_spent(&self, access_count: u64) -> String {
        if self.duration.is_zero() {
            return self.display_position();
        }
        let per_access = u64::from(self.duration.total_seconds()) / ASSUMED_ACCESSES_PER_VIDEO;
        format_seconds(access_count * per_access)
    }
}

//
// ─── TESTS ─────────────────────────────────────────────────────────────────────
//

#[cfg(test)]
mod tests {
    use super::*;
    use crate::time::fixed_now;
    use chrono::Duration;

    fn build_track() -> LessonTrack {
        LessonTrack::new(
            TrackId::new(1),
            UserId::new(10),
            CourseId::new(20),
            LessonId::new(30),
            fixed_now(),
        )
    }

    #[test]
    fn advance_keeps_the_larger_position() {
        let mut track = build_track();

        assert!(track.advance_position("00:02:00").unwrap());
        assert!(track.advance_position("00:05:00").unwrap());
        assert_eq!(track.position().to_string(), "00:05:00");

        // A stale report must not regress progress.
        assert!(!track.advance_position("00:02:00").unwrap());
        assert_eq!(track.position().to_string(), "00:05:00");

        // Equal reports are a no-op too.
        assert!(!track.advance_position("00:05:00").unwrap());
    }

    #[test]
    fn advance_rejects_malformed_positions() {
        let mut track = build_track();
        assert!(track.advance_position("later").is_err());
        assert_eq!(track.position(), Timecode::ZERO);
    }

    #[test]
    fn display_position_starts_friendly() {
        let mut track = build_track();
        assert_eq!(track.display_position(), "just started");

        track.advance_position("00:05:00").unwrap();
        assert_eq!(track.display_position(), "00:05:00");
    }

    #[test]
    fn display_duration_hints_until_reported() {
        let mut track = build_track();
        assert_eq!(
            track.display_duration(),
            "will be available after 25% completion"
        );

        track.record_duration("00:10:00").unwrap();
        assert_eq!(track.display_duration(), "00:10:00");
    }

    #[test]
    fn percent_is_pending_on_a_fresh_track() {
        let track = build_track();
        assert_eq!(track.percent_complete().unwrap(), "less than 25%");
    }

    #[test]
    fn percent_rounds_watched_share() {
        let mut track = build_track();
        track.record_duration("00:10:00").unwrap();
        track.advance_position("00:05:00").unwrap();
        assert_eq!(track.percent_complete().unwrap(), "approx 50 %");

        track.advance_position("00:09:54").unwrap();
        assert_eq!(track.percent_complete().unwrap(), "approx 99 %");
    }

    #[test]
    fn percent_with_known_duration_and_zero_position() {
        let mut track = build_track();
        track.record_duration("00:10:00").unwrap();
        assert_eq!(track.percent_complete().unwrap(), "approx 0 %");
    }

    #[test]
    fn percent_surfaces_zero_duration_inconsistency() {
        let mut track = build_track();
        track.advance_position("00:05:00").unwrap();
        let err = track.percent_complete().unwrap_err();
        assert!(matches!(err, TrackError::ZeroDuration { .. }));
    }

    #[test]
    fn completion_uses_the_end_tolerance() {
        let mut track = build_track();
        track.record_duration("00:10:00").unwrap();

        track.advance_position("00:09:00").unwrap();
        track.recompute_completion();
        assert!(!track.is_completed());

        track.advance_position("00:09:51").unwrap();
        track.recompute_completion();
        assert!(track.is_completed());
    }

    #[test]
    fn completion_ignores_unknown_duration() {
        let mut track = build_track();
        track.advance_position("00:09:51").unwrap();
        track.recompute_completion();
        assert!(!track.is_completed());
    }

    #[test]
    fn completion_never_reverts() {
        let mut track = LessonTrack::from_persisted(
            TrackId::new(1),
            UserId::new(10),
            CourseId::new(20),
            LessonId::new(30),
            "00:01:00".parse().unwrap(),
            "00:10:00".parse().unwrap(),
            fixed_now(),
            true,
        );
        track.recompute_completion();
        assert!(track.is_completed());
    }

    #[test]
    fn time_spent_assumes_quarter_per_access() {
        let mut track = build_track();
        track.record_duration("00:04:00").unwrap();
        assert_eq!(track.time_spent(4), "00:04:00");
        assert_eq!(track.time_spent(0), "00:00:00");
        assert_eq!(track.time_spent(2), "00:02:00");
    }

    #[test]
    fn time_spent_falls_back_while_duration_unknown() {
        let mut track = build_track();
        assert_eq!(track.time_spent(3), "just started");

        track.advance_position("00:02:30").unwrap();
        assert_eq!(track.time_spent(3), "00:02:30");
    }

    #[test]
    fn last_access_prefers_the_latest_log() {
        let track = build_track();
        assert_eq!(track.last_access_time(&[]), fixed_now());

        let later = fixed_now() + Duration::minutes(42);
        let logs = vec![
            AccessLogEntry::new(track.id(), "00:01:00".parse().unwrap(), fixed_now()),
            AccessLogEntry::new(track.id(), "00:02:00".parse().unwrap(), later),
        ];
        assert_eq!(track.last_access_time(&logs), later);
    }
}
