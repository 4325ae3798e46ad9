//! WebSocket surface: handshake authentication, connection state, chat
//! message dispatch, heartbeat, and broadcasting.

pub mod authenticator;
pub mod broadcast;
pub mod connection;
pub mod handler;
pub mod heartbeat;
pub mod session;
