//! # pitchline-notify
//!
//! Notification composition and best-effort fan-out.
//!
//! The [`Dispatcher`] runs strictly *after* a triggering action (new
//! subscription, content update) has succeeded; it computes the audience,
//! composes a [`Notification`], and submits one delivery attempt per
//! recipient. Nothing here can change the triggering action's response:
//! every internal failure is logged and swallowed.
//!
//! Audience and delivery are behind trait seams ([`traits`]) so the
//! dispatcher stays free of storage and transport concerns — the server
//! wires in adapters over the subscription store and the WebSocket
//! broadcast layer.

#![deny(unsafe_code)]

pub mod dispatcher;
pub mod errors;
pub mod traits;
pub mod types;

pub use dispatcher::Dispatcher;
pub use errors::DispatchError;
pub use traits::{DeliveryChannel, MemberDirectory, SubscriberDirectory};
pub use types::{Notification, NotificationKind};
