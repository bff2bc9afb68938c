use std::sync::Arc;

use crossbeam::channel::{unbounded, Receiver, Sender};
use parking_lot::Mutex;

use crate::SurveyResponseData;

pub type EventSender = Sender<StudioEvent>;
pub type EventReceiver = Receiver<StudioEvent>;

/// Events emitted by the studio, consumed by live subscribers
#[derive(Debug, Clone)]
pub enum StudioEvent {
    /// The survey response set changed. Carries the full snapshot, since the
    /// admin dashboard redraws from scratch on every change.
    SurveyResponsesChanged {
        responses: Vec<SurveyResponseData>,
    },
}

/// Fans studio events out to every subscriber.
#[derive(Clone, Default)]
pub struct EventBus {
    subscribers: Arc<Mutex<Vec<EventSender>>>,
}

impl EventBus {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn subscribe(&self) -> EventReceiver {
        let (sender, receiver) = unbounded();
        self.subscribers.lock().push(sender);

        receiver
    }

    pub fn emit(&self, event: StudioEvent) {
        // Subscribers whose receiver is gone are dropped along the way
        self.subscribers
            .lock()
            .retain(|subscriber| subscriber.send(event.clone()).is_ok());
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_events_reach_every_subscriber() {
        let bus = EventBus::new();

        let first = bus.subscribe();
        let second = bus.subscribe();

        bus.emit(StudioEvent::SurveyResponsesChanged { responses: vec![] });

        assert!(first.try_recv().is_ok());
        assert!(second.try_recv().is_ok());
    }

    #[test]
    fn test_dropped_subscribers_are_pruned() {
        let bus = EventBus::new();

        drop(bus.subscribe());
        let alive = bus.subscribe();

        bus.emit(StudioEvent::SurveyResponsesChanged { responses: vec![] });

        assert!(alive.try_recv().is_ok());
        assert_eq!(bus.subscribers.lock().len(), 1);
    }
}
