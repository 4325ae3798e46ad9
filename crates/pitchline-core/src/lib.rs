//! # pitchline-core
//!
//! Core domain types shared across the Pitchline platform:
//!
//! - [`ids`]: branded ID newtypes (numeric row IDs, time-ordered string IDs)
//! - [`identity`]: user principals, organizational relations, and the
//!   per-connection [`identity::ConnectionScope`]
//! - [`organization`]: startup / investment organization profiles
//!
//! This crate has no I/O. Persistence lives in `pitchline-store`, token
//! handling in `pitchline-auth`.

#![deny(unsafe_code)]

pub mod identity;
pub mod ids;
pub mod organization;

pub use identity::{AuthenticatedContext, ConnectionScope, Identity, OrganizationRelation, Position};
pub use ids::{ConnectionId, IdentityId, MessageId, NotificationId, OrganizationId, RelationId, ThreadId};
pub use organization::{Organization, OrganizationKind};
