//! Identity repository — user principals and credential checks.

use chrono::Utc;
use pitchline_core::ids::IdentityId;
use pitchline_core::Identity;
use rusqlite::{params, Connection, OptionalExtension};
use sha2::{Digest, Sha256};
use tracing::instrument;

use super::parse_timestamp;
use crate::errors::{Result, StoreError};

const IDENTITY_COLUMNS: &str = "identity_id, email, first_name, surname, phone_number, \
     registration_date, is_verified, is_active";

/// Fields required to register a new identity.
#[derive(Clone, Debug)]
pub struct NewIdentity {
    /// Login email; normalized to lowercase before storage.
    pub email: String,
    /// Plaintext password; only its digest is stored.
    pub password: String,
    /// Given name.
    pub first_name: String,
    /// Family name.
    pub surname: String,
    /// Contact phone number.
    pub phone_number: String,
}

/// Identity repository — stateless, every method takes `&Connection`.
pub struct IdentityRepo;

impl IdentityRepo {
    /// Register a new identity. Fails with [`StoreError::Conflict`] when the
    /// email is already taken.
    #[instrument(skip_all, fields(email = %new.email))]
    pub fn create(conn: &Connection, new: &NewIdentity) -> Result<Identity> {
        let email = normalize_email(&new.email);
        if email.is_empty() {
            return Err(StoreError::Conflict("email must be set".into()));
        }
        let now = Utc::now();
        let inserted = conn.execute(
            "INSERT INTO identities (email, password_digest, first_name, surname,
                 phone_number, registration_date, is_verified, is_active)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, 0, 1)",
            params![
                email,
                password_digest(&new.password),
                new.first_name,
                new.surname,
                new.phone_number,
                now.to_rfc3339(),
            ],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::Conflict(format!("email {email} already registered")));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(Identity {
            id: IdentityId::new(conn.last_insert_rowid()),
            email,
            first_name: new.first_name.clone(),
            surname: new.surname.clone(),
            phone_number: new.phone_number.clone(),
            registration_date: now,
            is_verified: false,
            is_active: true,
        })
    }

    /// Look up an identity by ID.
    pub fn find_by_id(conn: &Connection, id: IdentityId) -> Result<Option<Identity>> {
        let row = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE identity_id = ?1"),
                params![id.get()],
                map_identity,
            )
            .optional()?;
        Ok(row)
    }

    /// Look up an identity by (normalized) email.
    pub fn find_by_email(conn: &Connection, email: &str) -> Result<Option<Identity>> {
        let row = conn
            .query_row(
                &format!("SELECT {IDENTITY_COLUMNS} FROM identities WHERE email = ?1"),
                params![normalize_email(email)],
                map_identity,
            )
            .optional()?;
        Ok(row)
    }

    /// Check credentials. Returns the identity only when the email exists,
    /// the digest matches, and the account is active.
    #[instrument(skip_all, fields(email))]
    pub fn authenticate(
        conn: &Connection,
        email: &str,
        password: &str,
    ) -> Result<Option<Identity>> {
        let stored: Option<String> = conn
            .query_row(
                "SELECT password_digest FROM identities WHERE email = ?1 AND is_active = 1",
                params![normalize_email(email)],
                |row| row.get(0),
            )
            .optional()?;
        match stored {
            Some(digest) if digest == password_digest(password) => {
                Self::find_by_email(conn, email)
            }
            _ => Ok(None),
        }
    }

    /// Mark an identity's email as verified.
    pub fn mark_verified(conn: &Connection, id: IdentityId) -> Result<()> {
        let changed = conn.execute(
            "UPDATE identities SET is_verified = 1 WHERE identity_id = ?1",
            params![id.get()],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("identity {id}")));
        }
        Ok(())
    }
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn password_digest(password: &str) -> String {
    let digest = Sha256::digest(password.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

fn map_identity(row: &rusqlite::Row<'_>) -> rusqlite::Result<Identity> {
    let raw_date: String = row.get(5)?;
    Ok(Identity {
        id: IdentityId::new(row.get(0)?),
        email: row.get(1)?,
        first_name: row.get(2)?,
        surname: row.get(3)?,
        phone_number: row.get(4)?,
        registration_date: parse_timestamp(5, &raw_date)?,
        is_verified: row.get::<_, i64>(6)? == 1,
        is_active: row.get::<_, i64>(7)? == 1,
    })
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
#[allow(unused_results)]
mod tests {
    use super::*;
    use crate::migrations::run_migrations;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn make_new(email: &str) -> NewIdentity {
        NewIdentity {
            email: email.into(),
            password: "hunter2".into(),
            first_name: "Ada".into(),
            surname: "Lovelace".into(),
            phone_number: "-".into(),
        }
    }

    #[test]
    fn create_and_find_by_id() {
        let conn = setup();
        let created = IdentityRepo::create(&conn, &make_new("ada@example.com")).unwrap();
        let found = IdentityRepo::find_by_id(&conn, created.id).unwrap().unwrap();
        assert_eq!(found.email, "ada@example.com");
        assert_eq!(found.full_name(), "Ada Lovelace");
        assert!(found.is_active);
        assert!(!found.is_verified);
    }

    #[test]
    fn email_is_normalized() {
        let conn = setup();
        let created = IdentityRepo::create(&conn, &make_new("  Ada@Example.COM ")).unwrap();
        assert_eq!(created.email, "ada@example.com");
        assert!(IdentityRepo::find_by_email(&conn, "ADA@example.com")
            .unwrap()
            .is_some());
    }

    #[test]
    fn duplicate_email_conflicts() {
        let conn = setup();
        IdentityRepo::create(&conn, &make_new("ada@example.com")).unwrap();
        let err = IdentityRepo::create(&conn, &make_new("Ada@example.com")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn empty_email_rejected() {
        let conn = setup();
        let err = IdentityRepo::create(&conn, &make_new("  ")).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn find_missing_returns_none() {
        let conn = setup();
        assert!(IdentityRepo::find_by_id(&conn, IdentityId::new(999))
            .unwrap()
            .is_none());
        assert!(IdentityRepo::find_by_email(&conn, "nobody@example.com")
            .unwrap()
            .is_none());
    }

    #[test]
    fn authenticate_accepts_correct_password() {
        let conn = setup();
        let created = IdentityRepo::create(&conn, &make_new("ada@example.com")).unwrap();
        let authed = IdentityRepo::authenticate(&conn, "ada@example.com", "hunter2")
            .unwrap()
            .unwrap();
        assert_eq!(authed.id, created.id);
    }

    #[test]
    fn authenticate_rejects_wrong_password() {
        let conn = setup();
        IdentityRepo::create(&conn, &make_new("ada@example.com")).unwrap();
        assert!(IdentityRepo::authenticate(&conn, "ada@example.com", "wrong")
            .unwrap()
            .is_none());
    }

    #[test]
    fn authenticate_rejects_unknown_email() {
        let conn = setup();
        assert!(IdentityRepo::authenticate(&conn, "nobody@example.com", "x")
            .unwrap()
            .is_none());
    }

    #[test]
    fn authenticate_rejects_inactive_account() {
        let conn = setup();
        let created = IdentityRepo::create(&conn, &make_new("ada@example.com")).unwrap();
        conn.execute(
            "UPDATE identities SET is_active = 0 WHERE identity_id = ?1",
            params![created.id.get()],
        )
        .unwrap();
        assert!(
            IdentityRepo::authenticate(&conn, "ada@example.com", "hunter2")
                .unwrap()
                .is_none()
        );
    }

    #[test]
    fn mark_verified_flips_flag() {
        let conn = setup();
        let created = IdentityRepo::create(&conn, &make_new("ada@example.com")).unwrap();
        IdentityRepo::mark_verified(&conn, created.id).unwrap();
        let found = IdentityRepo::find_by_id(&conn, created.id).unwrap().unwrap();
        assert!(found.is_verified);
    }

    #[test]
    fn mark_verified_missing_identity_not_found() {
        let conn = setup();
        let err = IdentityRepo::mark_verified(&conn, IdentityId::new(404)).unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn digest_is_stable_hex() {
        let a = password_digest("hunter2");
        let b = password_digest("hunter2");
        assert_eq!(a, b);
        assert_eq!(a.len(), 64);
        assert!(a.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
