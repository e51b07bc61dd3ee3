//! Event bus: every monitor's events funnel into the one dashboard loop.
//!
//! Unbounded mpsc: producers (probe tasks) never block, nothing is
//! dropped while the dashboard is alive, and each producer's events
//! arrive in the order they were published. Interleaving across hosts
//! is whatever the scheduler gives us.

use tokio::sync::mpsc::{self, error::TryRecvError, UnboundedReceiver, UnboundedSender};
use tracing::trace;

use crate::monitor::{EventKind, MonitorEvent};

/// Consumer end, owned by the dashboard.
pub struct EventBus {
    tx: UnboundedSender<MonitorEvent>,
    rx: UnboundedReceiver<MonitorEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        Self { tx, rx }
    }

    /// A producer handle for one monitor.
    pub fn sender(&self) -> BusSender {
        BusSender {
            tx: self.tx.clone(),
        }
    }

    /// Wait for the next event. The bus keeps a sender of its own, so
    /// this only returns `None` if the channel is closed explicitly.
    pub async fn recv(&mut self) -> Option<MonitorEvent> {
        self.rx.recv().await
    }

    /// Next event if one is already queued.
    pub fn try_recv(&mut self) -> Option<MonitorEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty | TryRecvError::Disconnected) => None,
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

/// Producer end. Cheap to clone; safe to use from any thread.
#[derive(Clone)]
pub struct BusSender {
    tx: UnboundedSender<MonitorEvent>,
}

impl BusSender {
    pub fn publish(&self, host: &str, kind: EventKind) {
        let event = MonitorEvent {
            host: host.to_string(),
            kind,
        };
        if self.tx.send(event).is_err() {
            trace!(host = %host, "event bus closed, dropping event");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_bus_yields_nothing() {
        let mut bus = EventBus::new();
        assert!(bus.try_recv().is_none());
    }

    #[tokio::test]
    async fn per_producer_order_survives_concurrency() {
        let mut bus = EventBus::new();
        let mut handles = Vec::new();
        for host in ["a", "b", "c"] {
            let sender = bus.sender();
            handles.push(std::thread::spawn(move || {
                for seq in 0..500u16 {
                    sender.publish(host, EventKind::Sent { seq });
                }
            }));
        }
        for h in handles {
            h.join().unwrap();
        }

        let mut next = std::collections::HashMap::new();
        let mut total = 0;
        while let Some(event) = bus.try_recv() {
            let EventKind::Sent { seq } = event.kind else {
                panic!("unexpected event {event:?}");
            };
            let expected = next.entry(event.host).or_insert(0u16);
            assert_eq!(seq, *expected);
            *expected += 1;
            total += 1;
        }
        assert_eq!(total, 1500);
    }

    #[tokio::test]
    async fn recv_waits_for_publish() {
        let mut bus = EventBus::new();
        let sender = bus.sender();
        tokio::spawn(async move {
            sender.publish("a", EventKind::Sent { seq: 7 });
        });
        let event = bus.recv().await.unwrap();
        assert_eq!(event.host, "a");
        assert_eq!(event.kind, EventKind::Sent { seq: 7 });
    }
}
