//! Auth error types.

/// Errors returned by the token service.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    /// The token failed verification.
    ///
    /// Signature mismatch, passed expiry, malformed structure, and purpose
    /// mismatch (refresh presented as access or vice versa) all collapse
    /// into this one variant so callers cannot leak which check failed.
    #[error("invalid token")]
    InvalidToken,

    /// Signing a new token failed. This indicates a service
    /// misconfiguration, not a caller error.
    #[error("token signing failed: {reason}")]
    Signing {
        /// Error description.
        reason: String,
    },
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
