use std::fmt;

use chrono::{DateTime, Duration, Utc};
use lesson_core::model::{AccessLogEntry, CourseId, LessonId, Timecode, UserId, format_seconds};
use storage::repository::{NewTrackRecord, Storage};

#[derive(Debug, Clone)]
struct Args {
    db_url: String,
    user_id: UserId,
    course_id: CourseId,
    lesson_id: LessonId,
    duration: String,
    accesses: u32,
    now: Option<DateTime<Utc>>,
}

#[derive(Debug)]
enum ArgsError {
    MissingValue { flag: &'static str },
    UnknownArg(String),
    InvalidId { flag: &'static str, raw: String },
    InvalidAccesses { raw: String },
    InvalidDbUrl { raw: String },
    InvalidNow { raw: String },
}

impl fmt::Display for ArgsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgsError::MissingValue { flag } => write!(f, "{flag} requires a value"),
            ArgsError::UnknownArg(arg) => write!(f, "unknown argument: {arg}"),
            ArgsError::InvalidId { flag, raw } => write!(f, "invalid {flag} value: {raw}"),
            ArgsError::InvalidAccesses { raw } => write!(f, "invalid --accesses value: {raw}"),
            ArgsError::InvalidDbUrl { raw } => write!(f, "invalid --db value: {raw}"),
            ArgsError::InvalidNow { raw } => {
                write!(f, "invalid --now value (expected RFC3339): {raw}")
            }
        }
    }
}

impl std::error::Error for ArgsError {}

fn require_value(
    args: &mut impl Iterator<Item = String>,
    flag: &'static str,
) -> Result<String, ArgsError> {
    args.next().ok_or(ArgsError::MissingValue { flag })
}

fn parse_id(flag: &'static str, raw: String) -> Result<u64, ArgsError> {
    raw.parse::<u64>()
        .map_err(|_| ArgsError::InvalidId { flag, raw })
}

impl Args {
    fn parse() -> Result<Self, ArgsError> {
        let mut db_url =
            std::env::var("LESSON_DB_URL").unwrap_or_else(|_| "sqlite:dev.sqlite3".into());
        let mut user_id = std::env::var("LESSON_USER_ID")
            .ok()
            .and_then(|value| value.parse::<u64>().ok())
            .map_or_else(|| UserId::new(1), UserId::new);
        let mut course_id = CourseId::new(1);
        let mut lesson_id = LessonId::new(1);
        let mut duration = "00:10:00".to_string();
        let mut accesses = 4_u32;
        let mut now: Option<DateTime<Utc>> = None;

        let mut args = std::env::args().skip(1);
        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--db" => {
                    let value = require_value(&mut args, "--db")?;
                    if value.trim().is_empty() {
                        return Err(ArgsError::InvalidDbUrl { raw: value });
                    }
                    db_url = value;
                }
                "--user" => {
                    let value = require_value(&mut args, "--user")?;
                    user_id = UserId::new(parse_id("--user", value)?);
                }
                "--course" => {
                    let value = require_value(&mut args, "--course")?;
                    course_id = CourseId::new(parse_id("--course", value)?);
                }
                "--lesson" => {
                    let value = require_value(&mut args, "--lesson")?;
                    lesson_id = LessonId::new(parse_id("--lesson", value)?);
                }
                "--duration" => {
                    duration = require_value(&mut args, "--duration")?;
                }
                "--accesses" => {
                    let value = require_value(&mut args, "--accesses")?;
                    accesses = value
                        .parse::<u32>()
                        .map_err(|_| ArgsError::InvalidAccesses { raw: value.clone() })?;
                }
                "--now" => {
                    let value = require_value(&mut args, "--now")?;
                    let parsed = DateTime::parse_from_rfc3339(&value)
                        .map_err(|_| ArgsError::InvalidNow { raw: value.clone() })?
                        .with_timezone(&Utc);
                    now = Some(parsed);
                }
                "--help" | "-h" => {
                    print_usage();
                    std::process::exit(0);
                }
                _ => return Err(ArgsError::UnknownArg(arg)),
            }
        }

        Ok(Self {
            db_url,
            user_id,
            course_id,
            lesson_id,
            duration,
            accesses,
            now,
        })
    }
}

fn print_usage() {
    eprintln!("Usage:");
    eprintln!("  cargo run -p storage --bin seed -- [options]");
    eprintln!();
    eprintln!("Options:");
    eprintln!("  --db <sqlite_url>     SQLite URL (default: sqlite:dev.sqlite3)");
    eprintln!("  --user <id>           User id (default: 1)");
    eprintln!("  --course <id>         Course id (default: 1)");
    eprintln!("  --lesson <id>         Lesson id (default: 1)");
    eprintln!("  --duration <HH:MM:SS> Video duration (default: 00:10:00)");
    eprintln!("  --accesses <n>        Access log entries to append (default: 4)");
    eprintln!("  --now <rfc3339>       Fixed current time for deterministic seeding");
    eprintln!("  -h, --help            Show this help");
    eprintln!();
    eprintln!("Environment:");
    eprintln!("  LESSON_DB_URL, LESSON_USER_ID");
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse().map_err(|e| {
        eprintln!("{e}");
        print_usage();
        e
    })?;

    let storage = Storage::sqlite(&args.db_url).await?;
    let now = args.now.unwrap_or_else(Utc::now);

    let track_id = match storage
        .tracks
        .find_track(args.user_id, args.course_id, args.lesson_id)
        .await?
    {
        Some(track) => track.id(),
        None => {
            storage
                .tracks
                .insert_track(NewTrackRecord {
                    user_id: args.user_id,
                    course_id: args.course_id,
                    lesson_id: args.lesson_id,
                    created_at: now,
                })
                .await?
        }
    };

    let mut track = storage
        .tracks
        .get_track(track_id)
        .await?
        .ok_or("track vanished after insert")?;
    track.record_duration(&args.duration)?;

    // Spread the accesses evenly across the video, one minute apart.
    let duration_secs = u64::from(track.duration().total_seconds());
    for i in 1..=u64::from(args.accesses) {
        let offset = duration_secs * i / u64::from(args.accesses.max(1));
        let position: Timecode = format_seconds(offset).parse()?;
        track.advance_to(position);

        let accessed_at = now + Duration::minutes(i64::try_from(i)?);
        let entry = AccessLogEntry::new(track_id, position, accessed_at);
        storage.access_logs.append_log(&entry).await?;
    }

    track.recompute_completion();
    storage.tracks.update_track(&track).await?;

    println!(
        "Seeded track {} (user {}, course {}, lesson {}) with {} accesses into {}",
        track_id.value(),
        args.user_id.value(),
        args.course_id.value(),
        args.lesson_id.value(),
        args.accesses,
        args.db_url
    );

    Ok(())
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("{err}");
        std::process::exit(2);
    }
}
