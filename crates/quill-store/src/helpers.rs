//! Row parsing helpers.
//!
//! Columns come back from libSQL as text; these helpers isolate the parsing
//! and handle the dual datetime format issue (`SQLite`'s `datetime('now')`
//! vs Rust's `to_rfc3339()`).

use chrono::{DateTime, Utc};

use crate::error::StoreError;

/// Parse a required TEXT column as `DateTime<Utc>`.
///
/// Handles both RFC 3339 (`"2026-08-01T10:00:00+00:00"`) and `SQLite`'s
/// default format (`"2026-08-01 10:00:00"`).
///
/// # Errors
///
/// Returns `StoreError::ExecutionFailed` if the string cannot be parsed as
/// either format.
pub fn parse_datetime(s: &str) -> Result<DateTime<Utc>, StoreError> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(dt.with_timezone(&Utc));
    }
    chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S")
        .map(|naive| naive.and_utc())
        .map_err(|e| StoreError::ExecutionFailed(format!("failed to parse datetime '{s}': {e}")))
}
