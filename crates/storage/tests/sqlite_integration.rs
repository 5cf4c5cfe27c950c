use chrono::Duration;
use lesson_core::model::{AccessLogEntry, CourseId, LessonId, UserId};
use lesson_core::time::fixed_now;
use storage::repository::{
    AccessLogRepository, NewTrackRecord, StorageError, TrackRepository,
};
use storage::sqlite::SqliteRepository;

fn new_record(user: u64, course: u64, lesson: u64) -> NewTrackRecord {
    NewTrackRecord {
        user_id: UserId::new(user),
        course_id: CourseId::new(course),
        lesson_id: LessonId::new(lesson),
        created_at: fixed_now(),
    }
}

#[tokio::test]
async fn sqlite_roundtrip_persists_progress() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_roundtrip?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = repo.insert_track(new_record(1, 2, 3)).await.unwrap();

    let mut track = repo.get_track(id).await.unwrap().expect("inserted track");
    assert_eq!(track.display_position(), "just started");
    assert!(!track.is_completed());
    assert_eq!(track.created_at(), fixed_now());

    track.advance_position("00:09:51").unwrap();
    track.record_duration("00:10:00").unwrap();
    track.recompute_completion();
    repo.update_track(&track).await.unwrap();

    let fetched = repo
        .find_track(UserId::new(1), CourseId::new(2), LessonId::new(3))
        .await
        .unwrap()
        .expect("track by triple");
    assert_eq!(fetched.id(), id);
    assert_eq!(fetched.position().to_string(), "00:09:51");
    assert_eq!(fetched.duration().to_string(), "00:10:00");
    assert!(fetched.is_completed());
}

#[tokio::test]
async fn sqlite_rejects_duplicate_triples() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_unique?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    repo.insert_track(new_record(1, 2, 3)).await.unwrap();
    let err = repo.insert_track(new_record(1, 2, 3)).await.unwrap_err();
    assert!(matches!(err, StorageError::UniqueViolation));

    // Another lesson for the same user and course is allowed.
    repo.insert_track(new_record(1, 2, 4)).await.unwrap();
}

#[tokio::test]
async fn sqlite_orders_logs_by_access_time() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_logs?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = repo.insert_track(new_record(1, 2, 3)).await.unwrap();

    let t0 = fixed_now();
    let t1 = t0 + Duration::minutes(7);
    repo.append_log(&AccessLogEntry::new(id, "00:02:00".parse().unwrap(), t1))
        .await
        .unwrap();
    repo.append_log(&AccessLogEntry::new(id, "00:01:00".parse().unwrap(), t0))
        .await
        .unwrap();

    assert_eq!(repo.log_count(id).await.unwrap(), 2);

    let logs = repo.logs_for_track(id).await.unwrap();
    assert_eq!(logs[0].accessed_at, t0);
    assert_eq!(logs[1].accessed_at, t1);

    let last = repo.last_log(id).await.unwrap().expect("latest log");
    assert_eq!(last.accessed_at, t1);
    assert_eq!(last.position.to_string(), "00:02:00");
}

#[tokio::test]
async fn sqlite_cascades_log_deletion() {
    let repo = SqliteRepository::connect("sqlite:file:memdb_cascade?mode=memory&cache=shared")
        .await
        .expect("connect");
    repo.migrate().await.expect("migrate");

    let id = repo.insert_track(new_record(1, 2, 3)).await.unwrap();
    repo.append_log(&AccessLogEntry::new(
        id,
        "00:01:00".parse().unwrap(),
        fixed_now(),
    ))
    .await
    .unwrap();

    repo.delete_track(id).await.unwrap();
    assert!(repo.get_track(id).await.unwrap().is_none());
    assert_eq!(repo.log_count(id).await.unwrap(), 0);

    // The foreign key now rejects appends for the deleted track.
    let err = repo
        .append_log(&AccessLogEntry::new(
            id,
            "00:01:30".parse().unwrap(),
            fixed_now(),
        ))
        .await
        .unwrap_err();
    assert!(matches!(err, StorageError::NotFound));
}
