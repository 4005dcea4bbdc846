//! Token-keyed session store.

use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use thiserror::Error;

use super::state::Session;

/// Bytes of entropy in a session token (hex-encoded to twice this length).
const TOKEN_BYTES: usize = 32;

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("failed to generate session token: {0}")]
    TokenGeneration(#[from] rand::Error),
}

/// Issues, validates, and revokes bearer tokens mapped to usernames.
///
/// The map is guarded by a reader/writer lock: lookups take the shared
/// side, except when lazy expiry needs to delete, which re-acquires the
/// exclusive side. No I/O happens under either lock.
#[derive(Default)]
pub struct SessionStore {
    sessions: RwLock<HashMap<String, Session>>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a session for `username` lasting `duration`.
    ///
    /// Fails only if the OS randomness source fails.
    pub fn create_session(
        &self,
        username: &str,
        duration: Duration,
    ) -> Result<Session, SessionError> {
        let id = generate_token()?;
        let now = Utc::now();
        let session = Session {
            id: id.clone(),
            username: username.to_string(),
            created_at: now,
            expires_at: now + duration,
        };

        let mut sessions = self.sessions.write().unwrap();
        sessions.insert(id, session.clone());

        Ok(session)
    }

    /// Look up a session by token.
    ///
    /// An expired entry is deleted on the spot and reported as absent, so
    /// a token observed expired once can never resolve again.
    pub fn get_session(&self, id: &str) -> Option<Session> {
        {
            let sessions = self.sessions.read().unwrap();
            match sessions.get(id) {
                None => return None,
                Some(session) if session.is_valid_at(Utc::now()) => {
                    return Some(session.clone())
                }
                Some(_) => {}
            }
        }

        // Lazy expiry: upgrade to the write lock and re-check, since a
        // concurrent delete or re-issue may have raced us.
        let mut sessions = self.sessions.write().unwrap();
        if sessions
            .get(id)
            .is_some_and(|session| !session.is_valid_at(Utc::now()))
        {
            sessions.remove(id);
        }
        None
    }

    /// Remove a session. Idempotent; absent tokens are ignored.
    pub fn delete_session(&self, id: &str) {
        let mut sessions = self.sessions.write().unwrap();
        sessions.remove(id);
    }
}

fn generate_token() -> Result<String, SessionError> {
    let mut bytes = [0u8; TOKEN_BYTES];
    OsRng.try_fill_bytes(&mut bytes)?;
    Ok(hex::encode(bytes))
}

// ============================================================================
// TESTS
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    mod create {
        use super::*;

        #[test]
        fn create_then_get_returns_same_username() {
            let store = SessionStore::new();
            let session = store.create_session("alice", Duration::hours(24)).unwrap();

            let found = store.get_session(&session.id).unwrap();
            assert_eq!(found.username, "alice");
            assert!(found.is_valid_at(Utc::now()));
        }

        #[test]
        fn tokens_are_hex_and_collision_resistant() {
            let store = SessionStore::new();
            let a = store.create_session("alice", Duration::hours(1)).unwrap();
            let b = store.create_session("alice", Duration::hours(1)).unwrap();

            assert_eq!(a.id.len(), TOKEN_BYTES * 2);
            assert!(a.id.chars().all(|c| c.is_ascii_hexdigit()));
            assert_ne!(a.id, b.id);
        }

        #[test]
        fn expiry_tracks_duration() {
            let store = SessionStore::new();
            let session = store.create_session("alice", Duration::hours(24)).unwrap();
            assert_eq!(session.expires_at - session.created_at, Duration::hours(24));
        }
    }

    mod expiry {
        use super::*;

        #[test]
        fn expired_session_is_not_found_and_deleted() {
            let store = SessionStore::new();
            let session = store
                .create_session("alice", Duration::seconds(-1))
                .unwrap();

            // first lookup observes the expiry and deletes the entry
            assert!(store.get_session(&session.id).is_none());
            // second lookup misses entirely
            assert!(store.get_session(&session.id).is_none());
        }

        #[test]
        fn unexpired_session_survives_lookups() {
            let store = SessionStore::new();
            let session = store.create_session("alice", Duration::hours(1)).unwrap();

            assert!(store.get_session(&session.id).is_some());
            assert!(store.get_session(&session.id).is_some());
        }
    }

    mod delete {
        use super::*;

        #[test]
        fn delete_removes_session() {
            let store = SessionStore::new();
            let session = store.create_session("alice", Duration::hours(1)).unwrap();

            store.delete_session(&session.id);
            assert!(store.get_session(&session.id).is_none());
        }

        #[test]
        fn delete_is_idempotent() {
            let store = SessionStore::new();
            store.delete_session("never-existed");
            store.delete_session("never-existed");
        }
    }

    mod lookup {
        use super::*;

        #[test]
        fn unknown_token_is_not_found() {
            let store = SessionStore::new();
            assert!(store.get_session("deadbeef").is_none());
        }
    }
}
