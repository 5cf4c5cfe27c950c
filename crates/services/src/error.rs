//! Shared error types for the services crate.

use thiserror::Error;

use lesson_core::model::{TimecodeError, TrackError};
use storage::repository::StorageError;

/// Errors emitted by `TrackingService`.
///
/// Every variant passes the underlying error through unmodified; retries and
/// user-visible failure handling belong to the calling layer.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum TrackingError {
    #[error(transparent)]
    Timecode(#[from] TimecodeError),
    #[error(transparent)]
    Track(#[from] TrackError),
    #[error(transparent)]
    Storage(#[from] StorageError),
}
