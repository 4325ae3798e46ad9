//! # pitchline-server
//!
//! HTTP + WebSocket server for the Pitchline platform, built on Axum.
//!
//! The REST surface ([`handlers`]) covers login/refresh/organization-context
//! token flows, subscriptions, and organization content updates. The
//! WebSocket surface ([`websocket`]) carries the chat protocol; every
//! handshake passes through the connection authenticator, which resolves a
//! bearer token to a [`pitchline_core::ConnectionScope`] and never rejects
//! the upgrade — authorization happens downstream, per operation.
//!
//! Notification fan-out is wired through `pitchline-notify` with adapters
//! over the store ([`directory`]) and the broadcast layer ([`delivery`]).

#![deny(unsafe_code)]

pub mod config;
pub mod delivery;
pub mod directory;
pub mod errors;
pub mod handlers;
pub mod health;
pub mod server;
pub mod shutdown;
pub mod state;
pub mod websocket;

pub use config::{AppConfig, DatabaseConfig, ServerConfig};
pub use errors::ApiError;
pub use server::{build_router, PitchlineServer, StartError};
pub use state::AppState;
