//! Time helpers shared across the workspace.

use time::OffsetDateTime;

/// Current UTC timestamp.
pub fn now_utc() -> OffsetDateTime {
    OffsetDateTime::now_utc()
}
