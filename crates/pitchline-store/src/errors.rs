//! Error types for the persistence layer.

use thiserror::Error;

/// Errors returned by store operations.
#[derive(Debug, Error)]
pub enum StoreError {
    /// `SQLite` database error.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),

    /// Connection pool error.
    #[error("connection pool error: {0}")]
    Pool(#[from] r2d2::Error),

    /// The requested record does not exist (or the caller has no role in it).
    #[error("not found: {0}")]
    NotFound(String),

    /// A uniqueness invariant was violated (duplicate email, duplicate
    /// subscription, duplicate relation).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Schema migration failed.
    #[error("migration error: {message}")]
    Migration {
        /// Describes which migration failed and why.
        message: String,
    },

    /// Internal error (corrupt stored value, invariant breach).
    #[error("internal error: {0}")]
    Internal(String),
}

/// Convenience alias for store results.
pub type Result<T> = std::result::Result<T, StoreError>;

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
