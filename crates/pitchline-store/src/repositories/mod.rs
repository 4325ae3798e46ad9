//! Stateless repositories over the `SQLite` schema.
//!
//! Every method takes `&Connection`; pooling and blocking-thread dispatch
//! are the caller's concern.

pub mod identity;
pub mod login_activity;
pub mod message;
pub mod organization;
pub mod subscription;

use chrono::{DateTime, Utc};

/// Parse an RFC 3339 timestamp stored as TEXT.
///
/// Corrupt values surface as a column conversion failure rather than a
/// panic, keeping row mapping inside the `rusqlite` error channel.
pub(crate) fn parse_timestamp(
    index: usize,
    raw: &str,
) -> std::result::Result<DateTime<Utc>, rusqlite::Error> {
    raw.parse::<DateTime<Utc>>().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(index, rusqlite::types::Type::Text, Box::new(e))
    })
}
