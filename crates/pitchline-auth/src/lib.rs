//! # pitchline-auth
//!
//! Session token handling for the Pitchline platform: issuance, verification,
//! rotation, and post-issuance claim augmentation of signed JWTs (HS256 via
//! [`jsonwebtoken`]).
//!
//! The [`TokenService`] is pure and synchronous — no I/O, no locks — and is
//! safe to call from any concurrent context. The signing secret is explicit
//! configuration passed at construction ([`AuthConfig`]), never process-wide
//! mutable state, so tests can run isolated instances with distinct secrets.
//!
//! Two token purposes exist ([`TokenKind`]): short-lived *access* tokens
//! authenticate requests and WebSocket handshakes; longer-lived *refresh*
//! tokens only mint new pairs via [`TokenService::rotate`]. Presenting one
//! where the other is expected fails exactly like any other invalid token —
//! callers cannot distinguish the failure mode.

#![deny(unsafe_code)]

pub mod claims;
pub mod errors;
pub mod service;

pub use claims::{Claims, TokenKind};
pub use errors::AuthError;
pub use service::{AuthConfig, TokenPair, TokenService};
