//! Login activity log.
//!
//! Every login attempt is recorded best-effort by the request handler;
//! a failure to record never affects the login response itself.

use chrono::{DateTime, Utc};
use rusqlite::{params, Connection};

use super::parse_timestamp;
use crate::errors::Result;

/// Outcome of a login attempt.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoginStatus {
    /// Credentials accepted.
    Success,
    /// Credentials rejected.
    Failed,
}

impl LoginStatus {
    /// Stable storage tag.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Success => "success",
            Self::Failed => "failed",
        }
    }
}

/// A recorded login attempt.
#[derive(Clone, Debug)]
pub struct LoginActivityRow {
    /// Email the attempt was made with.
    pub login_email: Option<String>,
    /// Client IP, when known.
    pub login_ip: Option<String>,
    /// Outcome tag.
    pub status: String,
    /// Client user agent.
    pub user_agent: String,
    /// When the attempt happened.
    pub created_at: DateTime<Utc>,
}

/// Login activity repository — stateless, every method takes `&Connection`.
pub struct LoginActivityRepo;

impl LoginActivityRepo {
    /// Record a login attempt.
    pub fn record(
        conn: &Connection,
        email: &str,
        ip: Option<&str>,
        user_agent: &str,
        status: LoginStatus,
    ) -> Result<()> {
        let _ = conn.execute(
            "INSERT INTO login_activity (login_email, login_ip, status, user_agent, created_at)
             VALUES (?1, ?2, ?3, ?4, ?5)",
            params![
                email,
                ip,
                status.as_str(),
                user_agent,
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Most recent attempts, newest first.
    pub fn recent(conn: &Connection, limit: u32) -> Result<Vec<LoginActivityRow>> {
        let mut stmt = conn.prepare(
            "SELECT login_email, login_ip, status, user_agent, created_at
             FROM login_activity ORDER BY id DESC LIMIT ?1",
        )?;
        let rows = stmt
            .query_map(params![limit], |row| {
                let raw_date: String = row.get(4)?;
                Ok(LoginActivityRow {
                    login_email: row.get(0)?,
                    login_ip: row.get(1)?,
                    status: row.get(2)?,
                    user_agent: row.get(3)?,
                    created_at: parse_timestamp(4, &raw_date)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Count of failed attempts for an email.
    pub fn failed_count(conn: &Connection, email: &str) -> Result<i64> {
        let count: i64 = conn.query_row(
            "SELECT COUNT(*) FROM login_activity WHERE login_email = ?1 AND status = 'failed'",
            params![email],
            |row| row.get(0),
        )?;
        Ok(count)
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
