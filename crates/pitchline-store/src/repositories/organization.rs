//! Organization repository — profiles, relations, and content updates.

use chrono::Utc;
use pitchline_core::ids::{IdentityId, OrganizationId, RelationId};
use pitchline_core::{Organization, OrganizationRelation, Position};
use rusqlite::{params, Connection, OptionalExtension};
use serde::Deserialize;
use tracing::instrument;

use super::parse_timestamp;
use crate::errors::{Result, StoreError};

const ORGANIZATION_COLUMNS: &str = "organization_id, brand, is_startup, common_info, \
     contact_phone, contact_email, edrpou, address, product_info, startup_idea, tags, \
     registration_date";

/// Fields for creating an organization profile.
#[derive(Clone, Debug, Default)]
pub struct NewOrganization {
    /// Brand / trading name.
    pub brand: String,
    /// Whether this is a startup profile.
    pub is_startup: bool,
    /// Free-form description.
    pub common_info: String,
    /// Contact phone.
    pub contact_phone: String,
    /// Contact email.
    pub contact_email: String,
    /// Registration number, when provided.
    pub edrpou: Option<i64>,
    /// Registered address.
    pub address: String,
    /// Product description.
    pub product_info: String,
    /// Pitch / idea summary.
    pub startup_idea: String,
    /// Comma-separated tags.
    pub tags: String,
}

/// Partial content update; `None` fields keep their current value.
#[derive(Clone, Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContentUpdate {
    /// New description.
    pub common_info: Option<String>,
    /// New product description.
    pub product_info: Option<String>,
    /// New pitch summary.
    pub startup_idea: Option<String>,
    /// New tags.
    pub tags: Option<String>,
}

/// Organization repository — stateless, every method takes `&Connection`.
pub struct OrganizationRepo;

impl OrganizationRepo {
    /// Create an organization profile.
    #[instrument(skip_all, fields(brand = %new.brand))]
    pub fn create(conn: &Connection, new: &NewOrganization) -> Result<Organization> {
        let now = Utc::now();
        let _ = conn.execute(
            "INSERT INTO organizations (brand, is_startup, common_info, contact_phone,
                 contact_email, edrpou, address, product_info, startup_idea, tags,
                 registration_date)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                new.brand,
                i64::from(new.is_startup),
                new.common_info,
                new.contact_phone,
                new.contact_email,
                new.edrpou,
                new.address,
                new.product_info,
                new.startup_idea,
                new.tags,
                now.to_rfc3339(),
            ],
        )?;
        Ok(Organization {
            id: OrganizationId::new(conn.last_insert_rowid()),
            brand: new.brand.clone(),
            is_startup: new.is_startup,
            common_info: new.common_info.clone(),
            contact_phone: new.contact_phone.clone(),
            contact_email: new.contact_email.clone(),
            edrpou: new.edrpou,
            address: new.address.clone(),
            product_info: new.product_info.clone(),
            startup_idea: new.startup_idea.clone(),
            tags: new.tags.clone(),
            registration_date: now,
        })
    }

    /// Look up a profile by ID.
    pub fn get(conn: &Connection, id: OrganizationId) -> Result<Option<Organization>> {
        let row = conn
            .query_row(
                &format!(
                    "SELECT {ORGANIZATION_COLUMNS} FROM organizations WHERE organization_id = ?1"
                ),
                params![id.get()],
                map_organization,
            )
            .optional()?;
        Ok(row)
    }

    /// Apply a partial content update and return the updated profile.
    ///
    /// Fails with [`StoreError::NotFound`] when the organization does not
    /// exist.
    #[instrument(skip_all, fields(organization_id = %id))]
    pub fn update_content(
        conn: &Connection,
        id: OrganizationId,
        update: &ContentUpdate,
    ) -> Result<Organization> {
        let changed = conn.execute(
            "UPDATE organizations
             SET common_info  = COALESCE(?2, common_info),
                 product_info = COALESCE(?3, product_info),
                 startup_idea = COALESCE(?4, startup_idea),
                 tags         = COALESCE(?5, tags)
             WHERE organization_id = ?1",
            params![
                id.get(),
                update.common_info,
                update.product_info,
                update.startup_idea,
                update.tags,
            ],
        )?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("organization {id}")));
        }
        Self::get(conn, id)?.ok_or_else(|| StoreError::NotFound(format!("organization {id}")))
    }

    /// Relate an identity to an organization with a position.
    ///
    /// Fails with [`StoreError::Conflict`] when the relation already exists.
    pub fn relate(
        conn: &Connection,
        identity_id: IdentityId,
        organization_id: OrganizationId,
        position: Position,
    ) -> Result<OrganizationRelation> {
        let inserted = conn.execute(
            "INSERT INTO organization_relations (identity_id, organization_id, position)
             VALUES (?1, ?2, ?3)",
            params![identity_id.get(), organization_id.get(), position.as_str()],
        );
        match inserted {
            Ok(_) => {}
            Err(rusqlite::Error::SqliteFailure(e, _))
                if e.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                return Err(StoreError::Conflict(format!(
                    "identity {identity_id} already related to organization {organization_id}"
                )));
            }
            Err(e) => return Err(e.into()),
        }
        Ok(OrganizationRelation {
            relation_id: RelationId::new(conn.last_insert_rowid()),
            identity_id,
            organization_id,
            position,
        })
    }

    /// The relation between an identity and an organization, if any.
    pub fn relation_for(
        conn: &Connection,
        identity_id: IdentityId,
        organization_id: OrganizationId,
    ) -> Result<Option<OrganizationRelation>> {
        let row = conn
            .query_row(
                "SELECT relation_id, identity_id, organization_id, position
                 FROM organization_relations
                 WHERE identity_id = ?1 AND organization_id = ?2",
                params![identity_id.get(), organization_id.get()],
                map_relation,
            )
            .optional()?;
        Ok(row)
    }

    /// IDs of all identities related to an organization (founders and
    /// representatives). Audience of subscription notifications.
    pub fn member_ids(conn: &Connection, organization_id: OrganizationId) -> Result<Vec<IdentityId>> {
        let mut stmt = conn.prepare(
            "SELECT identity_id FROM organization_relations
             WHERE organization_id = ?1 ORDER BY identity_id",
        )?;
        let ids = stmt
            .query_map(params![organization_id.get()], |row| {
                Ok(IdentityId::new(row.get(0)?))
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;
        Ok(ids)
    }
}

fn map_organization(row: &rusqlite::Row<'_>) -> rusqlite::Result<Organization> {
    let raw_date: String = row.get(11)?;
    Ok(Organization {
        id: OrganizationId::new(row.get(0)?),
        brand: row.get(1)?,
        is_startup: row.get::<_, i64>(2)? == 1,
        common_info: row.get(3)?,
        contact_phone: row.get(4)?,
        contact_email: row.get(5)?,
        edrpou: row.get(6)?,
        address: row.get(7)?,
        product_info: row.get(8)?,
        startup_idea: row.get(9)?,
        tags: row.get(10)?,
        registration_date: parse_timestamp(11, &raw_date)?,
    })
}

fn map_relation(row: &rusqlite::Row<'_>) -> rusqlite::Result<OrganizationRelation> {
    let raw_position: String = row.get(3)?;
    let position = Position::parse(&raw_position).ok_or_else(|| {
        rusqlite::Error::FromSqlConversionFailure(
            3,
            rusqlite::types::Type::Text,
            format!("unknown position: {raw_position}").into(),
        )
    })?;
    Ok(OrganizationRelation {
        relation_id: RelationId::new(row.get(0)?),
        identity_id: IdentityId::new(row.get(1)?),
        organization_id: OrganizationId::new(row.get(2)?),
        position,
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
    use crate::repositories::identity::{IdentityRepo, NewIdentity};
    use pitchline_core::OrganizationKind;

    fn setup() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
        run_migrations(&conn).unwrap();
        conn
    }

    fn make_identity(conn: &Connection, email: &str) -> IdentityId {
        IdentityRepo::create(
            conn,
            &NewIdentity {
                email: email.into(),
                password: "pw".into(),
                first_name: "A".into(),
                surname: "B".into(),
                phone_number: "-".into(),
            },
        )
        .unwrap()
        .id
    }

    fn make_org(conn: &Connection, brand: &str, is_startup: bool) -> OrganizationId {
        OrganizationRepo::create(
            conn,
            &NewOrganization {
                brand: brand.into(),
                is_startup,
                ..NewOrganization::default()
            },
        )
        .unwrap()
        .id
    }

    #[test]
    fn create_and_get() {
        let conn = setup();
        let id = make_org(&conn, "Acme", true);
        let org = OrganizationRepo::get(&conn, id).unwrap().unwrap();
        assert_eq!(org.brand, "Acme");
        assert_eq!(org.kind(), OrganizationKind::Startup);
    }

    #[test]
    fn get_missing_returns_none() {
        let conn = setup();
        assert!(OrganizationRepo::get(&conn, OrganizationId::new(404))
            .unwrap()
            .is_none());
    }

    #[test]
    fn update_content_applies_partial_fields() {
        let conn = setup();
        let id = make_org(&conn, "Acme", true);
        let updated = OrganizationRepo::update_content(
            &conn,
            id,
            &ContentUpdate {
                product_info: Some("rockets".into()),
                ..ContentUpdate::default()
            },
        )
        .unwrap();
        assert_eq!(updated.product_info, "rockets");
        // Untouched fields keep their values
        assert_eq!(updated.brand, "Acme");
    }

    #[test]
    fn update_content_missing_org_not_found() {
        let conn = setup();
        let err = OrganizationRepo::update_content(
            &conn,
            OrganizationId::new(404),
            &ContentUpdate::default(),
        )
        .unwrap_err();
        assert!(matches!(err, StoreError::NotFound(_)));
    }

    #[test]
    fn relate_and_lookup() {
        let conn = setup();
        let identity = make_identity(&conn, "founder@example.com");
        let org = make_org(&conn, "Acme", true);
        let relation =
            OrganizationRepo::relate(&conn, identity, org, Position::Founder).unwrap();
        assert_eq!(relation.position, Position::Founder);

        let found = OrganizationRepo::relation_for(&conn, identity, org)
            .unwrap()
            .unwrap();
        assert_eq!(found.relation_id, relation.relation_id);
    }

    #[test]
    fn duplicate_relation_conflicts() {
        let conn = setup();
        let identity = make_identity(&conn, "founder@example.com");
        let org = make_org(&conn, "Acme", true);
        OrganizationRepo::relate(&conn, identity, org, Position::Founder).unwrap();
        let err =
            OrganizationRepo::relate(&conn, identity, org, Position::Representative).unwrap_err();
        assert!(matches!(err, StoreError::Conflict(_)));
    }

    #[test]
    fn relation_for_unrelated_is_none() {
        let conn = setup();
        let identity = make_identity(&conn, "outsider@example.com");
        let org = make_org(&conn, "Acme", true);
        assert!(OrganizationRepo::relation_for(&conn, identity, org)
            .unwrap()
            .is_none());
    }

    #[test]
    fn member_ids_lists_all_relations() {
        let conn = setup();
        let founder = make_identity(&conn, "founder@example.com");
        let rep = make_identity(&conn, "rep@example.com");
        let outsider = make_identity(&conn, "outsider@example.com");
        let org = make_org(&conn, "Acme", true);
        OrganizationRepo::relate(&conn, founder, org, Position::Founder).unwrap();
        OrganizationRepo::relate(&conn, rep, org, Position::Representative).unwrap();

        let members = OrganizationRepo::member_ids(&conn, org).unwrap();
        assert_eq!(members, vec![founder, rep]);
        assert!(!members.contains(&outsider));
    }
}
