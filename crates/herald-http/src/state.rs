//! Shared state for the HTTP layer.

use std::sync::Arc;

use herald_core::{NotificationHub, SessionStore};

/// State available to every handler and the auth middleware.
#[derive(Clone)]
pub struct SharedState {
    /// Connected-client registry and event fan-out.
    pub hub: NotificationHub,
    /// Bearer-token session store.
    pub sessions: Arc<SessionStore>,
}

impl SharedState {
    pub fn new(hub: NotificationHub, sessions: Arc<SessionStore>) -> Self {
        Self { hub, sessions }
    }
}
