mod access_log;
mod ids;
mod timecode;
mod track;

pub use access_log::AccessLogEntry;
pub use ids::{CourseId, LessonId, ParseIdError, TrackId, UserId};
pub use timecode::{Timecode, TimecodeError, format_seconds};
pub use track::{
    ASSUMED_ACCESSES_PER_VIDEO, COMPLETION_TOLERANCE_SECS, LessonTrack, TrackError,
};
