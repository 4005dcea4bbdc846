//! Connected-client registry and event fan-out.
//!
//! The [`NotificationHub`] tracks one live mailbox per connected user and
//! delivers serialized [`Envelope`]s to one, many, or all of them.
//! Delivery is best-effort: each mailbox is a bounded queue, and events
//! for a full mailbox are dropped rather than blocking the producer.

use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::event::{
    AcknowledgmentRequestPayload, AcknowledgmentResponsePayload, Envelope, EventPayload,
    Notification,
};

/// Number of pending events a mailbox holds before new events are dropped.
pub const MAILBOX_CAPACITY: usize = 10;

/// Target name that fans a notification out to every connected user.
pub const TARGET_ALL: &str = "all";

/// A request asking a set of users to confirm receipt.
///
/// Requests are kept for the life of the process; there is no expiry.
#[derive(Debug, Clone)]
pub struct AcknowledgmentRequest {
    pub id: String,
    pub from_username: String,
    pub to_usernames: Vec<String>,
    pub message: String,
    pub created_at: DateTime<Utc>,
}

struct ClientSlot {
    /// Registration counter distinguishing this connection from any
    /// earlier or later one under the same username.
    conn: u64,
    tx: mpsc::Sender<String>,
}

#[derive(Default)]
struct HubState {
    clients: HashMap<String, ClientSlot>,
    requests: HashMap<String, AcknowledgmentRequest>,
    acknowledged: HashMap<String, Vec<String>>,
    next_conn: u64,
}

enum Recipients<'a> {
    All,
    Only(&'a [&'a str]),
}

/// Tracks connected users and delivers events to their mailboxes.
///
/// Cheap to clone; all clones share the same registry. The lock guarding
/// the registry never escapes this module, and every public operation
/// holds it for its full duration, so operations are atomic with respect
/// to each other and events enqueued to a given mailbox arrive in
/// producer-call order.
#[derive(Clone, Default)]
pub struct NotificationHub {
    state: Arc<Mutex<HubState>>,
}

impl NotificationHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a mailbox for `username` and return its read-handle.
    ///
    /// Any existing mailbox for the username is closed first
    /// (last-connect-wins). After registration a `user_connected` event is
    /// broadcast to everyone currently connected, the new user included.
    pub fn add_client(&self, username: &str) -> Mailbox {
        let mut state = self.state.lock().unwrap();

        let (tx, rx) = mpsc::channel(MAILBOX_CAPACITY);
        state.next_conn += 1;
        let conn = state.next_conn;

        // Installing the new sender drops any previous one, which closes
        // the old mailbox; its reader observes end-of-stream.
        if state
            .clients
            .insert(username.to_string(), ClientSlot { conn, tx })
            .is_some()
        {
            log::info!("client superseded: {}", username);
        }
        log::info!(
            "client connected: {} ({} online)",
            username,
            state.clients.len()
        );

        deliver_locked(
            &mut state,
            EventPayload::UserConnected {
                username: username.to_string(),
            },
            Recipients::All,
        );

        Mailbox {
            username: username.to_string(),
            conn,
            rx,
            hub: self.clone(),
        }
    }

    /// Close and deregister `username`'s mailbox, broadcasting
    /// `user_disconnected` to the remaining users. No-op if the username
    /// has no live mailbox.
    pub fn remove_client(&self, username: &str) {
        let mut state = self.state.lock().unwrap();
        remove_locked(&mut state, username);
    }

    /// Snapshot of currently connected usernames, in no particular order.
    pub fn connected_users(&self) -> Vec<String> {
        let state = self.state.lock().unwrap();
        state.clients.keys().cloned().collect()
    }

    /// Deliver a notification from `from` to `target`, or to every
    /// connected user when `target` is [`TARGET_ALL`]. A target that is
    /// not connected is a silent no-op.
    pub fn broadcast_message(&self, from: &str, message: &str, target: &str) {
        let mut state = self.state.lock().unwrap();

        let event = EventPayload::Notification(Notification::new(from, message));
        if target == TARGET_ALL {
            deliver_locked(&mut state, event, Recipients::All);
        } else {
            deliver_locked(&mut state, event, Recipients::Only(&[target]));
        }
    }

    /// Record an acknowledgment request and deliver it to the connected
    /// members of `to`. Returns the request id unconditionally, even if no
    /// recipient is connected.
    pub fn create_acknowledgment_request(
        &self,
        from: &str,
        to: &[String],
        message: &str,
    ) -> String {
        let mut state = self.state.lock().unwrap();

        let request = AcknowledgmentRequest {
            id: Uuid::new_v4().to_string(),
            from_username: from.to_string(),
            to_usernames: to.to_vec(),
            message: message.to_string(),
            created_at: Utc::now(),
        };
        let id = request.id.clone();

        let payload = AcknowledgmentRequestPayload {
            id: id.clone(),
            from_username: request.from_username.clone(),
            to_usernames: request.to_usernames.clone(),
            message: request.message.clone(),
        };

        state.requests.insert(id.clone(), request);
        state.acknowledged.insert(id.clone(), Vec::new());

        let targets: Vec<&str> = to.iter().map(String::as_str).collect();
        deliver_locked(
            &mut state,
            EventPayload::AcknowledgmentRequest(payload),
            Recipients::Only(&targets),
        );

        id
    }

    /// Append `by` to the request's acknowledged list and deliver an
    /// `acknowledgment_response` to the original requester. An unknown
    /// `request_id` is tolerated silently: the caller may be racing a
    /// request this process never recorded.
    pub fn record_acknowledgment(&self, request_id: &str, by: &str) {
        let mut state = self.state.lock().unwrap();

        let Some(requester) = state
            .requests
            .get(request_id)
            .map(|r| r.from_username.clone())
        else {
            return;
        };

        // Append-only; the same user acknowledging twice appears twice.
        state
            .acknowledged
            .entry(request_id.to_string())
            .or_default()
            .push(by.to_string());

        let payload = AcknowledgmentResponsePayload {
            request_id: request_id.to_string(),
            from_username: by.to_string(),
        };
        deliver_locked(
            &mut state,
            EventPayload::AcknowledgmentResponse(payload),
            Recipients::Only(&[requester.as_str()]),
        );
    }

    /// Who has acknowledged a request so far, or `None` for an unknown id.
    pub fn acknowledged_by(&self, request_id: &str) -> Option<Vec<String>> {
        let state = self.state.lock().unwrap();
        state.acknowledged.get(request_id).cloned()
    }

    /// Deregister a specific connection. No-op when the registration has
    /// already been superseded by a reconnect, so a stale reader tearing
    /// down never removes its replacement.
    fn release(&self, username: &str, conn: u64) {
        let mut state = self.state.lock().unwrap();
        if state.clients.get(username).map(|slot| slot.conn) != Some(conn) {
            return;
        }
        remove_locked(&mut state, username);
    }
}

fn remove_locked(state: &mut HubState, username: &str) {
    if state.clients.remove(username).is_none() {
        return;
    }
    log::info!(
        "client disconnected: {} ({} online)",
        username,
        state.clients.len()
    );
    deliver_locked(
        state,
        EventPayload::UserDisconnected {
            username: username.to_string(),
        },
        Recipients::All,
    );
}

/// Serialize the envelope once, then attempt a non-blocking enqueue onto
/// each recipient's mailbox. Full mailboxes drop the event.
fn deliver_locked(state: &mut HubState, event: EventPayload, recipients: Recipients<'_>) {
    let envelope = Envelope::new(event);
    let wire = match envelope.to_json() {
        Ok(json) => json,
        Err(err) => {
            log::warn!("failed to serialize event: {}", err);
            return;
        }
    };

    match recipients {
        Recipients::All => {
            for (username, slot) in &state.clients {
                enqueue(username, slot, wire.clone());
            }
        }
        Recipients::Only(targets) => {
            let unique: HashSet<&str> = targets.iter().copied().collect();
            for username in unique {
                if let Some(slot) = state.clients.get(username) {
                    enqueue(username, slot, wire.clone());
                }
            }
        }
    }
}

fn enqueue(username: &str, slot: &ClientSlot, wire: String) {
    match slot.tx.try_send(wire) {
        Ok(()) => {}
        Err(mpsc::error::TrySendError::Full(_)) => {
            log::warn!("mailbox full for {}, dropping event", username);
        }
        Err(mpsc::error::TrySendError::Closed(_)) => {
            log::debug!("mailbox closed for {}, dropping event", username);
        }
    }
}

/// Owning read-handle to one connected user's mailbox.
///
/// Dropping the handle deregisters the client and broadcasts the
/// disconnect, unless a reconnect has already superseded it; teardown
/// fires exactly once per connection regardless of exit path.
pub struct Mailbox {
    username: String,
    conn: u64,
    rx: mpsc::Receiver<String>,
    hub: NotificationHub,
}

impl Mailbox {
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Wait for the next event. Returns `None` once the mailbox has been
    /// closed (this registration was superseded by a newer connection).
    pub async fn recv(&mut self) -> Option<String> {
        self.rx.recv().await
    }

    /// Non-blocking read.
    pub fn try_recv(&mut self) -> Result<String, mpsc::error::TryRecvError> {
        self.rx.try_recv()
    }

    /// Poll for the next event; used by stream adapters.
    pub fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<String>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Mailbox {
    fn drop(&mut self) {
        self.hub.release(&self.username, self.conn);
    }
}

// ============================================================================
// TESTS
// ============================================================================
