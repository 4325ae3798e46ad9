//! Organization profiles.
//!
//! One table backs both kinds of organization; `is_startup` decides whether
//! the startup-only fields (`product_info`, `startup_idea`) are meaningful.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::ids::OrganizationId;

/// What kind of organization a profile describes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OrganizationKind {
    /// A startup raising interest from investors.
    Startup,
    /// An investment firm.
    Investment,
}

/// An organization profile (startup or investment firm).
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Organization {
    /// Unique row ID.
    pub id: OrganizationId,
    /// Brand / trading name.
    pub brand: String,
    /// Whether this is a startup (vs. an investment firm).
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
    /// Product description (startups).
    pub product_info: String,
    /// Pitch / idea summary (startups).
    pub startup_idea: String,
    /// Comma-separated tags.
    pub tags: String,
    /// When the profile was created.
    pub registration_date: DateTime<Utc>,
}

impl Organization {
    /// The organization kind derived from `is_startup`.
    #[must_use]
    pub fn kind(&self) -> OrganizationKind {
        if self.is_startup {
            OrganizationKind::Startup
        } else {
            OrganizationKind::Investment
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn make_org(is_startup: bool) -> Organization {
        Organization {
            id: OrganizationId::new(1),
            brand: "Acme".into(),
            is_startup,
            common_info: String::new(),
            contact_phone: String::new(),
            contact_email: String::new(),
            edrpou: None,
            address: String::new(),
            product_info: String::new(),
            startup_idea: String::new(),
            tags: String::new(),
            registration_date: Utc::now(),
        }
    }

    #[test]
    fn startup_kind() {
        assert_eq!(make_org(true).kind(), OrganizationKind::Startup);
    }

    #[test]
    fn investment_kind() {
        assert_eq!(make_org(false).kind(), OrganizationKind::Investment);
    }

    #[test]
    fn kind_serializes_lowercase() {
        let json = serde_json::to_string(&OrganizationKind::Startup).unwrap();
        assert_eq!(json, "\"startup\"");
    }
}
