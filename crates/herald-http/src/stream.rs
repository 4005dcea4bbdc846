//! SSE endpoint draining a client mailbox onto the open connection.

use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

use axum::{
    extract::State,
    response::sse::{Event, KeepAlive, KeepAliveStream, Sse},
    Extension,
};
use futures::Stream;
use herald_core::Mailbox;

use crate::auth::CurrentUser;
use crate::state::SharedState;

/// Handler for GET /api/events
///
/// Registers the caller's mailbox and streams its events until the
/// connection ends or the registration is superseded by a reconnect.
pub async fn events(
    State(state): State<SharedState>,
    Extension(CurrentUser(username)): Extension<CurrentUser>,
) -> Sse<KeepAliveStream<EventStream>> {
    let mailbox = state.hub.add_client(&username);
    Sse::new(EventStream::new(mailbox)).keep_alive(KeepAlive::default())
}

/// Adapts a [`Mailbox`] into the SSE frames for one connection.
///
/// The first frame is a `connected` handshake; every frame after that is
/// a serialized event envelope. Dropping the stream - client cancel,
/// write error, or clean close - drops the mailbox, which deregisters the
/// client and fires the disconnect broadcast exactly once.
pub struct EventStream {
    mailbox: Mailbox,
    greeted: bool,
}

impl EventStream {
    fn new(mailbox: Mailbox) -> Self {
        Self {
            mailbox,
            greeted: false,
        }
    }
}

impl Stream for EventStream {
    type Item = Result<Event, Infallible>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        if !self.greeted {
            self.greeted = true;
            let hello = Event::default()
                .event("connected")
                .data(r#"{"message":"Connected"}"#);
            return Poll::Ready(Some(Ok(hello)));
        }

        match self.mailbox.poll_recv(cx) {
            Poll::Ready(Some(wire)) => Poll::Ready(Some(Ok(Event::default().data(wire)))),
            // Mailbox closed: this registration was superseded.
            Poll::Ready(None) => Poll::Ready(None),
            Poll::Pending => Poll::Pending,
        }
    }
}

// ============================================================================
// TESTS
// ============================================================================
