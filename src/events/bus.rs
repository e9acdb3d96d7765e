//! # Bus: fan-in point for engine events.
//!
//! Monitor tasks, the status client and the task table all publish here; the
//! engine's listener is the one consumer that hands events to the
//! [`SubscriberSet`](crate::SubscriberSet).
//!
//! ```text
//!   MonitorTask 1 ──┐
//!   MonitorTask 2 ──┼──► Bus (broadcast) ──► engine listener ──► SubscriberSet
//!   StatusClient  ──┤
//!   TaskTable     ──┘
//! ```
//!
//! Publishing never waits. The ring buffer is shared by all receivers; a
//! receiver that falls behind sees `RecvError::Lagged(n)` and loses the `n`
//! oldest events. Events sent while nobody listens are discarded.

use tokio::sync::broadcast;

use super::event::Event;

/// Clonable handle to the engine's event channel.
#[derive(Clone, Debug)]
pub struct Bus {
    tx: broadcast::Sender<Event>,
}

impl Bus {
    /// Creates a new bus with the given channel capacity (minimum 1).
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel::<Event>(capacity.max(1));
        Self { tx }
    }

    /// Publishes an event to all active receivers; dropped if there are none.
    pub fn publish(&self, ev: Event) {
        let _ = self.tx.send(ev);
    }

    /// Receiver for events published from now on.
    pub fn subscribe(&self) -> broadcast::Receiver<Event> {
        self.tx.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::events::EventKind;

    #[tokio::test]
    async fn publish_reaches_every_receiver() {
        let bus = Bus::new(8);
        let mut a = bus.subscribe();
        let mut b = bus.subscribe();

        bus.publish(Event::new(EventKind::StopAllRequested));

        assert_eq!(a.recv().await.unwrap().kind, EventKind::StopAllRequested);
        assert_eq!(b.recv().await.unwrap().kind, EventKind::StopAllRequested);
    }

    #[test]
    fn publish_without_receivers_is_silent() {
        let bus = Bus::new(0);
        bus.publish(Event::new(EventKind::ShutdownRequested));
    }
}
