use chrono::{DateTime, Utc};
use serde::Serialize;

use lesson_core::model::{CourseId, LessonId, TrackId, UserId};

/// Caller-facing snapshot of one track's progress, with the display
/// conventions already applied.
///
/// `position` and `duration` carry the friendly placeholder strings while
/// the underlying values are still at their zero defaults, and `time_spent`
/// is the heuristic estimate, not a measured total.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProgressReport {
    pub track_id: TrackId,
    pub user_id: UserId,
    pub course_id: CourseId,
    pub lesson_id: LessonId,
    pub position: String,
    pub duration: String,
    pub percent: String,
    pub access_count: u64,
    pub time_spent: String,
    pub last_access: DateTime<Utc>,
    pub completed: bool,
}
