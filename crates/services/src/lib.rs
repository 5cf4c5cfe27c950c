#![forbid(unsafe_code)]

pub mod directory;
pub mod error;
pub mod report;
pub mod tracking_service;

pub use lesson_core::Clock;

pub use directory::{Directory, StaticDirectory};
pub use error::TrackingError;
pub use report::ProgressReport;
pub use tracking_service::{PlaybackUpdate, TrackingService};
