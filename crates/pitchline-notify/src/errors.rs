//! Dispatch error types.
//!
//! These never escape the dispatcher: notification is a side effect, not the
//! triggering action's contract, so every failure is logged and swallowed at
//! the dispatcher boundary.

use thiserror::Error;

/// Internal failures while composing or submitting a notification.
#[derive(Debug, Error)]
pub enum DispatchError {
    /// Computing the target audience failed.
    #[error("audience lookup failed: {reason}")]
    Audience {
        /// Error description.
        reason: String,
    },

    /// Submitting to the delivery channel failed.
    #[error("delivery submission failed: {reason}")]
    Delivery {
        /// Error description.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
