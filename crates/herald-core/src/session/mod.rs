//! Session issuance and validation for bearer-token authentication.
//!
//! A session binds an opaque, randomly generated token to a username for
//! a bounded duration. Expiry is enforced lazily on lookup; there is no
//! background reaper.

mod state;
mod store;

pub use state::Session;
pub use store::{SessionError, SessionStore};
