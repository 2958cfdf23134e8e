//! Date and time utility functions
//!
//! Modification timestamps are kept at millisecond precision so they survive
//! a round trip through SQLite and JSON unchanged. Last-writer-wins
//! comparisons depend on that.

use chrono::{DateTime, Local, SubsecRound, Utc};

/// Display format for modification dates
pub const DISPLAY_DATETIME_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Truncate a timestamp to millisecond precision.
pub fn truncate_to_millis(ts: DateTime<Utc>) -> DateTime<Utc> {
    ts.trunc_subsecs(3)
}

/// Current UTC time at millisecond precision.
pub fn now_millis() -> DateTime<Utc> {
    truncate_to_millis(Utc::now())
}

/// Format a timestamp in the local timezone for display.
pub fn format_local(ts: DateTime<Utc>) -> String {
    ts.with_timezone(&Local).format(DISPLAY_DATETIME_FORMAT).to_string()
}
