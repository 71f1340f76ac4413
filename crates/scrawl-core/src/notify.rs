//! Origin-aware change notifications with a bounded subscriber registry.
//!
//! [`NotifyHub`] fans "the note changed" events out to long-lived client
//! connections, suppressing delivery back to the origin that made the edit:
//! the editing client already holds the freshest content in its own input,
//! and a redundant refresh could clobber in-flight keystrokes.
//!
//! Registrations are capped: past the capacity the oldest live registration
//! is evicted, so lost disconnect signals can never grow the registry without
//! bound. Explicit unregistration on disconnect remains the primary removal
//! path; eviction is the backstop.

use std::collections::VecDeque;
use std::fmt;
use std::net::IpAddr;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures::Stream;
use serde::Serialize;
use tokio::sync::mpsc;
use tracing::debug;
use uuid::Uuid;

/// Coarse client identity: first-hop network address plus the client software
/// string. Every tab of one browser shares an origin, which is the intended
/// self-suppression scope ("don't refresh the client that just typed").
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct OriginId(String);

impl OriginId {
    /// Combine the connection's address and `User-Agent` into an origin key.
    pub fn from_parts(addr: Option<IpAddr>, user_agent: Option<&str>) -> Self {
        let addr = addr.map(|a| a.to_string()).unwrap_or_default();
        OriginId(format!("{}{}", addr, user_agent.unwrap_or("")))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OriginId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for OriginId {
    fn from(s: &str) -> Self {
        OriginId(s.to_string())
    }
}

impl From<String> for OriginId {
    fn from(s: String) -> Self {
        OriginId(s)
    }
}

/// Notification that the shared note changed.
#[derive(Debug, Clone, Serialize)]
pub struct NoteChanged {
    /// Unique event identifier (UUIDv7 for temporal ordering).
    pub event_id: Uuid,
    /// When the edit was published (UTC).
    pub occurred_at: DateTime<Utc>,
    /// Origin of the edit that produced the event.
    pub origin: OriginId,
}

/// Registration handle returned by [`NotifyHub::register`].
///
/// Doubles as the eviction key: handles are allocated in registration order,
/// so the smallest live handle is the oldest subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubscriberId(u64);

struct Subscriber {
    id: u64,
    origin: OriginId,
    deliver: mpsc::UnboundedSender<NoteChanged>,
}

#[derive(Default)]
struct Registry {
    next_id: u64,
    /// Live subscribers in registration order (front = oldest).
    live: VecDeque<Subscriber>,
}

/// Publish/subscribe hub for note-change notifications.
///
/// The registry is shared with every [`Subscription`] it hands out, so a
/// dropped subscription can remove itself without holding the hub.
pub struct NotifyHub {
    capacity: usize,
    registry: Arc<Mutex<Registry>>,
}

impl NotifyHub {
    /// Create a hub bounded to `capacity` concurrent subscribers.
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity: capacity.max(1),
            registry: Arc::new(Mutex::new(Registry::default())),
        }
    }

    /// Add a subscriber, evicting the oldest registrations if the registry is
    /// at capacity. Returns a handle for later unregistration.
    pub fn register(
        &self,
        origin: OriginId,
        deliver: mpsc::UnboundedSender<NoteChanged>,
    ) -> SubscriberId {
        let mut registry = self.registry.lock().unwrap();
        while registry.live.len() >= self.capacity {
            if let Some(evicted) = registry.live.pop_front() {
                // Dropping the sender ends the evicted connection's stream,
                // whether or not that connection is still alive.
                debug!(
                    subsystem = "core",
                    component = "notify",
                    subscriber = evicted.id,
                    origin = %evicted.origin,
                    "Registry at capacity, evicting oldest subscriber"
                );
            }
        }
        let id = registry.next_id;
        registry.next_id += 1;
        registry.live.push_back(Subscriber {
            id,
            origin,
            deliver,
        });
        debug!(
            subsystem = "core",
            component = "notify",
            subscriber = id,
            live = registry.live.len(),
            "Subscriber registered"
        );
        SubscriberId(id)
    }

    /// Remove a subscriber. Safe to call for handles that were already
    /// removed or evicted.
    pub fn unregister(&self, id: SubscriberId) {
        let mut registry = self.registry.lock().unwrap();
        registry.live.retain(|s| s.id != id.0);
    }

    /// Deliver a change notification to every subscriber whose origin differs
    /// from the publisher's. Best-effort and non-blocking: per-subscriber
    /// failures are swallowed and never affect the others.
    pub fn publish(&self, origin: &OriginId) {
        let event = NoteChanged {
            event_id: Uuid::now_v7(),
            occurred_at: Utc::now(),
            origin: origin.clone(),
        };
        let registry = self.registry.lock().unwrap();
        let mut delivered = 0usize;
        for subscriber in registry.live.iter().filter(|s| &s.origin != origin) {
            if subscriber.deliver.send(event.clone()).is_ok() {
                delivered += 1;
            }
        }
        debug!(
            subsystem = "core",
            component = "notify",
            origin = %origin,
            delivered,
            live = registry.live.len(),
            "Published note change"
        );
    }

    /// Open a subscription for a connection: allocates the delivery channel,
    /// registers it, and returns a stream that unregisters itself on drop.
    pub fn subscribe(&self, origin: OriginId) -> Subscription {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = self.register(origin, tx);
        Subscription {
            registry: Arc::clone(&self.registry),
            id,
            rx,
        }
    }

    /// Number of live subscribers.
    pub fn subscriber_count(&self) -> usize {
        self.registry.lock().unwrap().live.len()
    }

    /// Configured registry bound.
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

/// A live notification stream tied to one connection.
///
/// Ends when the subscriber is evicted; unregisters itself when dropped,
/// which is how abrupt connection loss is cleaned up.
pub struct Subscription {
    registry: Arc<Mutex<Registry>>,
    id: SubscriberId,
    rx: mpsc::UnboundedReceiver<NoteChanged>,
}

impl Subscription {
    pub fn id(&self) -> SubscriberId {
        self.id
    }

    /// Receive the next notification; `None` once evicted.
    pub async fn recv(&mut self) -> Option<NoteChanged> {
        self.rx.recv().await
    }
}

impl Stream for Subscription {
    type Item = NoteChanged;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<NoteChanged>> {
        self.rx.poll_recv(cx)
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        let mut registry = self.registry.lock().unwrap();
        registry.live.retain(|s| s.id != self.id.0);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn origin(s: &str) -> OriginId {
        OriginId::from(s)
    }

    #[tokio::test]
    async fn publish_skips_the_publishing_origin() {
        let hub = Arc::new(NotifyHub::new(8));
        let mut viewer = hub.subscribe(origin("10.0.0.1/firefox"));
        let mut editor_tab = hub.subscribe(origin("10.0.0.2/safari"));
        let mut editor_tab_2 = hub.subscribe(origin("10.0.0.2/safari"));

        hub.publish(&origin("10.0.0.2/safari"));

        let event = viewer.recv().await.unwrap();
        assert_eq!(event.origin, origin("10.0.0.2/safari"));
        assert!(editor_tab.rx.try_recv().is_err());
        assert!(editor_tab_2.rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn same_origin_tabs_are_distinct_subscribers() {
        let hub = Arc::new(NotifyHub::new(8));
        let _a = hub.subscribe(origin("same"));
        let _b = hub.subscribe(origin("same"));
        assert_eq!(hub.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn oldest_subscriber_is_evicted_at_capacity() {
        let hub = Arc::new(NotifyHub::new(50));
        let mut subs = Vec::new();
        for i in 0..51 {
            subs.push(hub.subscribe(origin(&format!("client-{}", i))));
        }

        assert_eq!(hub.subscriber_count(), 50);
        // S1's delivery channel was closed by the eviction.
        assert!(subs[0].recv().await.is_none());

        hub.publish(&origin("someone-else"));
        for sub in subs.iter_mut().skip(1) {
            assert!(sub.recv().await.is_some());
        }
    }

    #[tokio::test]
    async fn registry_never_exceeds_capacity() {
        let hub = Arc::new(NotifyHub::new(4));
        let mut subs = Vec::new();
        for i in 0..20 {
            subs.push(hub.subscribe(origin(&format!("c{}", i))));
            assert!(hub.subscriber_count() <= 4);
        }
        assert_eq!(hub.subscriber_count(), 4);
    }

    #[tokio::test]
    async fn unregister_is_idempotent() {
        let hub = Arc::new(NotifyHub::new(8));
        let (tx, _rx) = mpsc::unbounded_channel();
        let id = hub.register(origin("a"), tx);
        assert_eq!(hub.subscriber_count(), 1);

        hub.unregister(id);
        hub.unregister(id);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn dropping_a_subscription_unregisters_it() {
        let hub = Arc::new(NotifyHub::new(8));
        let sub = hub.subscribe(origin("a"));
        assert_eq!(hub.subscriber_count(), 1);
        drop(sub);
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn dead_receiver_does_not_block_other_deliveries() {
        let hub = Arc::new(NotifyHub::new(8));
        let (dead_tx, dead_rx) = mpsc::unbounded_channel();
        drop(dead_rx);
        hub.register(origin("dead"), dead_tx);
        let mut live = hub.subscribe(origin("live"));

        hub.publish(&origin("publisher"));
        assert!(live.recv().await.is_some());
    }

    #[tokio::test]
    async fn events_carry_unique_ids_in_publish_order() {
        let hub = Arc::new(NotifyHub::new(8));
        let mut sub = hub.subscribe(origin("viewer"));

        hub.publish(&origin("editor"));
        hub.publish(&origin("editor"));

        let first = sub.recv().await.unwrap();
        let second = sub.recv().await.unwrap();
        assert_ne!(first.event_id, second.event_id);
        assert!(first.occurred_at <= second.occurred_at);
    }

    #[test]
    fn origin_from_parts_concatenates_addr_and_agent() {
        let addr: IpAddr = "192.168.1.9".parse().unwrap();
        let id = OriginId::from_parts(Some(addr), Some("Mozilla/5.0"));
        assert_eq!(id.as_str(), "192.168.1.9Mozilla/5.0");

        let bare = OriginId::from_parts(None, None);
        assert_eq!(bare.as_str(), "");
    }
}
