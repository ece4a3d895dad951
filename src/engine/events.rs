// Event system for order change notifications

//! # Event System
//!
//! This module provides the in-process publish/subscribe bus that decouples
//! order mutations from interested observers (live dashboards, GraphQL
//! subscriptions). It handles:
//! - Topic-keyed subscriber registration
//! - Best-effort, at-most-once delivery in publish order
//! - Automatic deregistration when a subscription is dropped
//!
//! ## Delivery Semantics
//!
//! - A topic with **zero subscribers silently drops** the message - there
//!   is no durability and no replay; subscribers only see messages
//!   published after they subscribed.
//! - Each subscriber has its own **unbounded queue**, so a slow consumer
//!   can never fail or block a publisher (and therefore can never fail or
//!   roll back an order mutation).
//! - Dropping an [`EventStream`] removes its queue from the registry; no
//!   further delivery is attempted and nothing leaks.
//!
//! ## Ownership
//!
//! The bus is an explicitly owned object created at service start and
//! handed (cheaply cloned) to whichever component needs to publish or
//! subscribe. There is deliberately no global registry hiding in module
//! state.

use std::collections::HashMap;
use std::pin::Pin;
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};

use futures::Stream;
use tokio::sync::mpsc;
use tokio_stream::wrappers::UnboundedReceiverStream;
use tracing::debug;
use uuid::Uuid;

use crate::models::OrderEvent;

/// Topic carrying every newly created order
pub fn topic_order_created() -> String {
    "order_created".to_string()
}

/// Per-order topic carrying status/total changes (including creation)
pub fn topic_order_updated(order_id: i64) -> String {
    format!("order_updated:{}", order_id)
}

/// One registered subscriber queue
struct Subscriber {
    id: Uuid,
    tx: mpsc::UnboundedSender<OrderEvent>,
}

type Registry = Arc<Mutex<HashMap<String, Vec<Subscriber>>>>;

/// Event bus for publishing and subscribing to order events
///
/// Cloning the bus clones a handle to the same registry, so publishers
/// and subscribers created from any clone see each other.
#[derive(Clone, Default)]
pub struct EventBus {
    topics: Registry,
}

impl EventBus {
    /// Create a new, empty bus
    pub fn new() -> Self {
        Self::default()
    }

    /// Publish an event to every current subscriber of a topic
    ///
    /// Fire-and-forget: a topic with no subscribers drops the event, and a
    /// receiver that has gone away is pruned rather than reported. Nothing
    /// here can fail the caller.
    pub async fn publish(&self, topic: &str, event: OrderEvent) {
        // The registry lock is never held across an await point
        let mut topics = match self.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };

        if let Some(subscribers) = topics.get_mut(topic) {
            // Prune subscribers whose receiving half is gone
            subscribers.retain(|s| s.tx.send(event.clone()).is_ok());
            if subscribers.is_empty() {
                topics.remove(topic);
            }
        }

        debug!(topic, order_id = event.order_id, "event published");
    }

    /// Subscribe to a topic, receiving messages published from now on
    ///
    /// The returned stream yields events in publish order and deregisters
    /// itself when dropped.
    pub fn subscribe(&self, topic: &str) -> EventStream {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();

        let mut topics = match self.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics
            .entry(topic.to_string())
            .or_default()
            .push(Subscriber { id, tx });

        EventStream {
            rx: UnboundedReceiverStream::new(rx),
            registry: Arc::clone(&self.topics),
            topic: topic.to_string(),
            id,
        }
    }

    /// Number of live subscribers on a topic (used by tests)
    pub fn subscriber_count(&self, topic: &str) -> usize {
        let topics = match self.topics.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        topics.get(topic).map_or(0, |subs| subs.len())
    }
}

/// A live subscription to one topic
///
/// Implements [`futures::Stream`]; ends (`None`) only if the bus side of
/// the channel disappears. Dropping the stream removes its queue from the
/// bus registry - guaranteed deregistration, no further delivery attempts.
pub struct EventStream {
    rx: UnboundedReceiverStream<OrderEvent>,
    registry: Registry,
    topic: String,
    id: Uuid,
}

impl Stream for EventStream {
    type Item = OrderEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.rx).poll_next(cx)
    }
}

impl Drop for EventStream {
    fn drop(&mut self) {
        let mut topics = match self.registry.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if let Some(subscribers) = topics.get_mut(&self.topic) {
            subscribers.retain(|s| s.id != self.id);
            if subscribers.is_empty() {
                topics.remove(&self.topic);
            }
        }
    }
}
