use chrono::{DateTime, Utc};

use crate::model::ids::TrackId;
use crate::model::timecode::Timecode;

/// Immutable snapshot of a single access to a tracked lesson.
///
/// Entries are append-only history owned by their track: recorded once with
/// the position the player reported at that moment, never updated or
/// individually deleted. Deleting the track deletes its entries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessLogEntry {
    track_id: TrackId,
    position: Timecode,
    accessed_at: DateTime<Utc>,
}

impl AccessLogEntry {
    #[must_use]
    pub fn new(track_id: TrackId, position: Timecode, accessed_at: DateTime<Utc>) -> Self {
        Self {
            track_id,
            position,
            accessed_at,
        }
    }

    #[must_use]
    pub fn track_id(&self) -> TrackId {
        self.track_id
    }

    /// Position the player reported at this access, which may lag the
    /// track's stored position.
    #[must_use]
    pub fn position(&self) -> Timecode {
        self.position
    }

    #[must_use]
    pub fn accessed_at(&self) -> DateTime<Utc> {
        self.accessed_at
    }
}
