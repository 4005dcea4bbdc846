//! Per-session state.

use chrono::{DateTime, Utc};

/// An authenticated user session.
///
/// Immutable after creation; the store deletes it on expiry or logout.
#[derive(Debug, Clone)]
pub struct Session {
    /// Opaque bearer token identifying the session.
    pub id: String,

    /// Username the token was issued to.
    pub username: String,

    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// Whether the session is still valid at `now`.
    pub fn is_valid_at(&self, now: DateTime<Utc>) -> bool {
        now < self.expires_at
    }
}
