use std::{
    convert::Infallible,
    pin::Pin,
    sync::{
        atomic::{AtomicU64, Ordering},
        Arc, Weak,
    },
    task::{Context, Poll, Waker},
};

use axum::response::sse::Event;
use chartbox_studio::StudioEvent;
use futures_util::Stream;
use parking_lot::Mutex;
use serde::Serialize;
use utoipa::ToSchema;

use crate::serialized::{SurveyResponse, ToSerialized};

type ConnectionId = u64;

static CONNECTION_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Events pushed to connected dashboards.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "kebab-case", tag = "type")]
pub enum ServerEvent {
    /// The survey response set changed. Carries the full snapshot.
    SurveySnapshot { responses: Vec<SurveyResponse> },
}

impl From<StudioEvent> for ServerEvent {
    fn from(value: StudioEvent) -> Self {
        match value {
            StudioEvent::SurveyResponsesChanged { responses } => Self::SurveySnapshot {
                responses: responses.to_serialized(),
            },
        }
    }
}

/// Manages server sent event connections
pub struct ServerSentEvents {
    me: Weak<Self>,
    connections: Mutex<Vec<Connection>>,
}

struct Connection {
    id: ConnectionId,
    pending_messages: Arc<Mutex<Vec<ServerEvent>>>,
    waker: Arc<Mutex<Option<Waker>>>,
}

pub struct ConnectionHandle {
    id: ConnectionId,
    /// A reference to [Connection]'s pending messages
    pending_messages: Arc<Mutex<Vec<ServerEvent>>>,
    /// A reference to [Connection]'s stored [Waker]
    waker: Arc<Mutex<Option<Waker>>>,
    /// Required to remove connection when dropped
    manager: Weak<ServerSentEvents>,
}

impl ServerSentEvents {
    pub fn new() -> Arc<Self> {
        Arc::new_cyclic(|me| Self {
            me: me.clone(),
            connections: Default::default(),
        })
    }

    pub fn broadcast(&self, event: ServerEvent) {
        let connections = self.connections.lock();

        for connection in connections.iter() {
            connection.send(event.clone())
        }
    }

    pub fn connect(&self) -> ConnectionHandle {
        let connection = Connection::new();
        let handle = connection.handle(self.me.clone());

        self.connections.lock().push(connection);
        handle
    }

    fn disconnect(&self, id: ConnectionId) {
        self.connections.lock().retain(|c| c.id != id)
    }
}

impl Connection {
    fn new() -> Self {
        Self {
            id: CONNECTION_COUNTER.fetch_add(1, Ordering::Relaxed),
            pending_messages: Default::default(),
            waker: Default::default(),
        }
    }

    fn send(&self, message: ServerEvent) {
        self.pending_messages.lock().push(message);

        if let Some(waker) = self.waker.lock().take() {
            waker.wake()
        }
    }

    fn handle(&self, manager: Weak<ServerSentEvents>) -> ConnectionHandle {
        ConnectionHandle {
            id: self.id,
            pending_messages: self.pending_messages.clone(),
            waker: self.waker.clone(),
            manager,
        }
    }
}

impl Stream for ConnectionHandle {
    type Item = Result<Event, Infallible>;

    fn poll_next(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        let mut pending_messages = self.pending_messages.lock();

        let next_event = pending_messages
            .pop()
            .map(|m| serde_json::to_string(&m).expect("serializes properly"));

        if let Some(event) = next_event {
            return Poll::Ready(Some(Ok(Event::default().data(event))));
        }

        *self.waker.lock() = Some(cx.waker().clone());
        Poll::Pending
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        if let Some(manager) = self.manager.upgrade() {
            manager.disconnect(self.id)
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_broadcast_reaches_connections() {
        let manager = ServerSentEvents::new();
        let handle = manager.connect();

        manager.broadcast(ServerEvent::SurveySnapshot { responses: vec![] });

        assert_eq!(handle.pending_messages.lock().len(), 1);
    }

    #[test]
    fn test_dropping_a_handle_disconnects() {
        let manager = ServerSentEvents::new();

        let handle = manager.connect();
        assert_eq!(manager.connections.lock().len(), 1);

        drop(handle);
        assert_eq!(manager.connections.lock().len(), 0);
    }
}
