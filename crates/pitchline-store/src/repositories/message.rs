//! Message repository — per-party visibility and soft delete.
//!
//! A thread joins exactly two identities; the pair is stored in canonical
//! (low, high) order so the same two parties always resolve to the same
//! thread. Each message carries two independent visibility flags, one per
//! party. Soft delete clears the caller's flag only; a message hidden on
//! both sides disappears from every listing but the row is retained —
//! purging is an external retention job's responsibility, not this
//! repository's.

use chrono::{DateTime, Utc};
use pitchline_core::ids::{IdentityId, MessageId, ThreadId};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Serialize;
use tracing::instrument;

use super::parse_timestamp;
use crate::errors::{Result, StoreError};

const MESSAGE_COLUMNS: &str = "message_id, thread_id, sender_id, recipient_id, body, \
     created_at, visible_for_sender, visible_for_recipient";

/// A stored message.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MessageRow {
    /// Unique message ID (time-ordered).
    pub message_id: MessageId,
    /// Thread this message belongs to.
    pub thread_id: ThreadId,
    /// Sending identity.
    pub sender_id: IdentityId,
    /// Receiving identity.
    pub recipient_id: IdentityId,
    /// Message body.
    pub body: String,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Whether the sender still sees this message.
    pub visible_for_sender: bool,
    /// Whether the recipient still sees this message.
    pub visible_for_recipient: bool,
}

/// Message repository — stateless, every method takes `&Connection`.
pub struct MessageRepo;

impl MessageRepo {
    /// The thread between two identities, if one exists. Order of the
    /// arguments does not matter.
    pub fn thread_for(
        conn: &Connection,
        a: IdentityId,
        b: IdentityId,
    ) -> Result<Option<ThreadId>> {
        let (low, high) = canonical_pair(a, b);
        let row = conn
            .query_row(
                "SELECT thread_id FROM threads WHERE party_low = ?1 AND party_high = ?2",
                params![low.get(), high.get()],
                |row| row.get::<_, String>(0),
            )
            .optional()?;
        Ok(row.map(ThreadId::from))
    }

    /// Send a message, creating the thread on first contact.
    ///
    /// Both visibility flags start true. Fails with [`StoreError::NotFound`]
    /// when the recipient does not exist.
    #[instrument(skip(conn, body))]
    pub fn send(
        conn: &Connection,
        sender_id: IdentityId,
        recipient_id: IdentityId,
        body: &str,
    ) -> Result<MessageRow> {
        let recipient_exists: i64 = conn.query_row(
            "SELECT COUNT(*) FROM identities WHERE identity_id = ?1",
            params![recipient_id.get()],
            |row| row.get(0),
        )?;
        if recipient_exists == 0 {
            return Err(StoreError::NotFound(format!("identity {recipient_id}")));
        }

        let thread_id = Self::ensure_thread(conn, sender_id, recipient_id)?;
        let message_id = MessageId::new();
        let now = Utc::now();
        let _ = conn.execute(
            "INSERT INTO messages (message_id, thread_id, sender_id, recipient_id, body,
                 created_at, visible_for_sender, visible_for_recipient)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 1, 1)",
            params![
                message_id.as_str(),
                thread_id.as_str(),
                sender_id.get(),
                recipient_id.get(),
                body,
                now.to_rfc3339(),
            ],
        )?;
        Ok(MessageRow {
            message_id,
            thread_id,
            sender_id,
            recipient_id,
            body: body.to_string(),
            created_at: now,
            visible_for_sender: true,
            visible_for_recipient: true,
        })
    }

    /// Messages in a thread still visible to `identity`, creation order
    /// ascending.
    ///
    /// The flag checked depends on the identity's role in each message, so
    /// a message hidden by its sender still appears for its recipient.
    pub fn list_visible(
        conn: &Connection,
        identity_id: IdentityId,
        thread_id: &ThreadId,
    ) -> Result<Vec<MessageRow>> {
        let mut stmt = conn.prepare(&format!(
            "SELECT {MESSAGE_COLUMNS} FROM messages
             WHERE thread_id = ?1
               AND ((sender_id = ?2 AND visible_for_sender = 1)
                 OR (recipient_id = ?2 AND visible_for_recipient = 1))
             ORDER BY created_at ASC, message_id ASC"
        ))?;
        let rows = stmt
            .query_map(params![thread_id.as_str(), identity_id.get()], map_message)?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(rows)
    }

    /// Hide a message for one party (soft delete).
    ///
    /// Clears the flag matching `identity_id`'s role in the message.
    /// Idempotent — hiding an already-hidden side is a no-op. Fails with
    /// [`StoreError::NotFound`] when the message does not exist or the
    /// identity has no role in it.
    #[instrument(skip(conn))]
    pub fn hide_for(
        conn: &Connection,
        identity_id: IdentityId,
        message_id: &MessageId,
    ) -> Result<()> {
        let parties: Option<(i64, i64)> = conn
            .query_row(
                "SELECT sender_id, recipient_id FROM messages WHERE message_id = ?1",
                params![message_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )
            .optional()?;
        let Some((sender_id, recipient_id)) = parties else {
            return Err(StoreError::NotFound(format!("message {message_id}")));
        };

        let flag = if identity_id.get() == sender_id {
            "visible_for_sender"
        } else if identity_id.get() == recipient_id {
            "visible_for_recipient"
        } else {
            return Err(StoreError::NotFound(format!(
                "identity {identity_id} has no role in message {message_id}"
            )));
        };

        // Single-column, one-directional write: concurrent hides of the two
        // sides touch disjoint columns, duplicate hides of one side converge
        // to the same value.
        let _ = conn.execute(
            &format!("UPDATE messages SET {flag} = 0 WHERE message_id = ?1"),
            params![message_id.as_str()],
        )?;
        Ok(())
    }

    /// Fetch a message by ID regardless of visibility.
    pub fn get(conn: &Connection, message_id: &MessageId) -> Result<Option<MessageRow>> {
        let row = conn
            .query_row(
                &format!("SELECT {MESSAGE_COLUMNS} FROM messages WHERE message_id = ?1"),
                params![message_id.as_str()],
                map_message,
            )
            .optional()?;
        Ok(row)
    }

    fn ensure_thread(conn: &Connection, a: IdentityId, b: IdentityId) -> Result<ThreadId> {
        if let Some(existing) = Self::thread_for(conn, a, b)? {
            return Ok(existing);
        }
        let (low, high) = canonical_pair(a, b);
        let thread_id = ThreadId::new();
        let _ = conn.execute(
            "INSERT INTO threads (thread_id, party_low, party_high, created_at)
             VALUES (?1, ?2, ?3, ?4)",
            params![
                thread_id.as_str(),
                low.get(),
                high.get(),
                Utc::now().to_rfc3339()
            ],
        )?;
        Ok(thread_id)
    }
}

fn canonical_pair(a: IdentityId, b: IdentityId) -> (IdentityId, IdentityId) {
    if a.get() <= b.get() {
        (a, b)
    } else {
        (b, a)
    }
}

fn map_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<MessageRow> {
    let raw_date: String = row.get(5)?;
    Ok(MessageRow {
        message_id: MessageId::from(row.get::<_, String>(0)?),
        thread_id: ThreadId::from(row.get::<_, String>(1)?),
        sender_id: IdentityId::new(row.get(2)?),
        recipient_id: IdentityId::new(row.get(3)?),
        body: row.get(4)?,
        created_at: parse_timestamp(5, &raw_date)?,
        visible_for_sender: row.get::<_, i64>(6)? == 1,
        visible_for_recipient: row.get::<_, i64>(7)? == 1,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
