use std::collections::HashMap;

use lesson_core::model::{CourseId, LessonId, LessonTrack, UserId};

/// Identity and catalog collaborator for diagnostic rendering.
///
/// The platform owns user accounts and the course catalog; this module only
/// ever needs display names, and only when describing a track for logs or
/// admin views.
pub trait Directory {
    fn user_full_name(&self, user: UserId) -> String;
    fn course_title(&self, course: CourseId) -> String;
    fn lesson_title(&self, lesson: LessonId) -> String;

    /// Diagnostic one-liner for a track.
    fn describe_track(&self, track: &LessonTrack) -> String {
        format!(
            "Track {} in {} for {}",
            self.lesson_title(track.lesson_id()),
            self.course_title(track.course_id()),
            self.user_full_name(track.user_id()),
        )
    }
}

/// Map-backed directory for tests and tooling.
///
/// Unknown ids fall back to their numeric form so the rendering never fails.
#[derive(Debug, Clone, Default)]
pub struct StaticDirectory {
    users: HashMap<UserId, String>,
    courses: HashMap<CourseId, String>,
    lessons: HashMap<LessonId, String>,
}

impl StaticDirectory {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_user(mut self, id: UserId, full_name: impl Into<String>) -> Self {
        self.users.insert(id, full_name.into());
        self
    }

    #[must_use]
    pub fn with_course(mut self, id: CourseId, title: impl Into<String>) -> Self {
        self.courses.insert(id, title.into());
        self
    }

    #[must_use]
    pub fn with_lesson(mut self, id: LessonId, title: impl Into<String>) -> Self {
        self.lessons.insert(id, title.into());
        self
    }
}

impl Directory for StaticDirectory {
    fn user_full_name(&self, user: UserId) -> String {
        self.users
            .get(&user)
            .cloned()
            .unwrap_or_else(|| format!("user {user}"))
    }

    fn course_title(&self, course: CourseId) -> String {
        self.courses
            .get(&course)
            .cloned()
            .unwrap_or_else(|| format!("course {course}"))
    }

    fn lesson_title(&self, lesson: LessonId) -> String {
        self.lessons
            .get(&lesson)
            .cloned()
            .unwrap_or_else(|| format!("lesson {lesson}"))
    }
}
