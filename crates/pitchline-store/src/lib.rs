//! # pitchline-store
//!
//! SQLite persistence for the Pitchline platform.
//!
//! Connections come from an `r2d2` pool ([`connection`]) with WAL mode and
//! foreign keys enabled on every connection. Schema changes are versioned
//! migrations ([`migrations`]) tracked in a `schema_version` table.
//!
//! Repositories ([`repositories`]) are stateless structs whose methods take
//! `&Connection`; callers decide pooling and blocking-thread dispatch. Every
//! mutation is a single-record, independently committed operation.

#![deny(unsafe_code)]

pub mod connection;
pub mod errors;
pub mod migrations;
pub mod repositories;

pub use connection::{new_file, new_in_memory, ConnectionPool, PoolConfig, PooledConnection};
pub use errors::{Result, StoreError};
pub use migrations::run_migrations;
pub use repositories::identity::{IdentityRepo, NewIdentity};
pub use repositories::login_activity::{LoginActivityRepo, LoginStatus};
pub use repositories::message::{MessageRepo, MessageRow};
pub use repositories::organization::{ContentUpdate, NewOrganization, OrganizationRepo};
pub use repositories::subscription::SubscriptionRepo;
