//! # herald-core
//!
//! Core business logic for Herald, a real-time user notification service.
//!
//! This crate is framework-agnostic and can be driven by any transport
//! (HTTP/SSE, WebSocket, tests). It owns the pieces with real state and
//! lifecycle rules:
//!
//! - **Session**: a short-lived bearer token bound to a username
//! - **NotificationHub**: one live mailbox per connected user, with
//!   best-effort event fan-out and acknowledgment bookkeeping
//! - **Envelope**: the typed `{type, payload, timestamp}` wrapper for
//!   every event pushed through a mailbox

pub mod event;
pub mod hub;
pub mod session;

// Re-export commonly used types
pub use event::{Envelope, EventPayload, Notification};
pub use hub::{Mailbox, NotificationHub, MAILBOX_CAPACITY, TARGET_ALL};
pub use session::{Session, SessionError, SessionStore};
