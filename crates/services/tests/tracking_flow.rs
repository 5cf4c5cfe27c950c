use lesson_core::model::{CourseId, LessonId, UserId};
use lesson_core::time::fixed_now;
use services::{Clock, Directory, StaticDirectory, TrackingService};
use storage::repository::InMemoryRepository;

/// One lesson watched end to end: tracking starts, the player reports
/// positions, the duration arrives, and completion is confirmed.
#[tokio::test]
async fn watching_a_lesson_to_the_end() {
    let repo = InMemoryRepository::new();
    let service = TrackingService::new(
        Clock::fixed(fixed_now()),
        std::sync::Arc::new(repo.clone()),
        std::sync::Arc::new(repo.clone()),
    );

    let user = UserId::new(11);
    let course = CourseId::new(7);
    let lesson = LessonId::new(2);
    let track_id = service.begin_tracking(user, course, lesson).await.unwrap();

    service.record_duration(track_id, "00:04:00").await.unwrap();
    for position in ["00:01:00", "00:02:00", "00:03:00", "00:04:00"] {
        let update = service.record_playback(track_id, position).await.unwrap();
        assert!(update.advanced);
    }

    assert!(service.refresh_completion(track_id).await.unwrap());

    let report = service.progress_report(track_id).await.unwrap();
    assert_eq!(report.position, "00:04:00");
    assert_eq!(report.duration, "00:04:00");
    assert_eq!(report.percent, "approx 100 %");
    assert_eq!(report.access_count, 4);
    // Four accesses at an assumed quarter of the video each.
    assert_eq!(report.time_spent, "00:04:00");
    assert_eq!(report.last_access, fixed_now());
    assert!(report.completed);

    let found = service
        .find_track(user, course, lesson)
        .await
        .unwrap()
        .expect("track by triple");
    assert_eq!(found.id(), track_id);

    let directory = StaticDirectory::new()
        .with_user(user, "Grace Hopper")
        .with_course(course, "Compilers")
        .with_lesson(lesson, "Parsing");
    assert_eq!(
        directory.describe_track(&found),
        "Track Parsing in Compilers for Grace Hopper"
    );
}

/// A lesson abandoned halfway stays incomplete and keeps its largest
/// reported position.
#[tokio::test]
async fn abandoning_a_lesson_midway() {
    let repo = InMemoryRepository::new();
    let service = TrackingService::new(
        Clock::fixed(fixed_now()),
        std::sync::Arc::new(repo.clone()),
        std::sync::Arc::new(repo.clone()),
    );

    let track_id = service
        .begin_tracking(UserId::new(1), CourseId::new(1), LessonId::new(1))
        .await
        .unwrap();

    service.record_duration(track_id, "00:10:00").await.unwrap();
    service.record_playback(track_id, "00:06:00").await.unwrap();
    // The player resends an earlier position after a seek backwards.
    service.record_playback(track_id, "00:04:30").await.unwrap();

    assert!(!service.refresh_completion(track_id).await.unwrap());

    let report = service.progress_report(track_id).await.unwrap();
    assert_eq!(report.position, "00:06:00");
    assert_eq!(report.percent, "approx 60 %");
    assert_eq!(report.access_count, 2);
    assert!(!report.completed);
}
