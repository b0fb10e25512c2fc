//! Event bus
//!
//! Realm actions publish through [`EventBus`]. Listeners subscribe with an
//! [`EventFilter`], usually scoped to one realm, and only see matching
//! events. [`MemoryEventBus`] serves single-process deployments and tests.

use crate::types::Event;
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::RwLock;
use tracing::{debug, warn};
use uuid::Uuid;

/// Event bus errors.
#[derive(Debug, Error)]
pub enum EventBusError {
    #[error("Failed to publish event: {0}")]
    Publish(String),

    #[error("Failed to serialize event: {0}")]
    Serialization(String),

    #[error("Unknown subscription: {0}")]
    UnknownSubscription(Uuid),

    #[error("Event bus closed")]
    Closed,
}

pub type EventBusResult<T> = Result<T, EventBusError>;

// ============================================================================
// Filters
// ============================================================================

/// Which events a subscriber or handler receives.
///
/// Patterns are dotted topics where `*` matches one segment and `#` matches
/// any number of segments, so `realm.*` matches `realm.update` but not
/// `realm_user_settings_defaults.update`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventFilter {
    /// Only events of this realm; `None` for every realm
    pub realm_id: Option<Uuid>,
    pub pattern: String,
}

impl EventFilter {
    /// Events of every realm whose topic matches `pattern`.
    pub fn topic(pattern: impl Into<String>) -> Self {
        Self {
            realm_id: None,
            pattern: pattern.into(),
        }
    }

    /// Every event of one realm.
    pub fn realm(realm_id: Uuid) -> Self {
        Self {
            realm_id: Some(realm_id),
            pattern: "#".to_string(),
        }
    }

    /// Narrow to topics matching `pattern`.
    pub fn with_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = pattern.into();
        self
    }

    pub fn matches(&self, event: &Event) -> bool {
        self.realm_id.map_or(true, |id| id == event.realm_id)
            && topic_matches(&self.pattern, event.topic())
    }
}

fn topic_matches(pattern: &str, topic: &str) -> bool {
    let pattern: Vec<&str> = pattern.split('.').collect();
    let topic: Vec<&str> = topic.split('.').collect();
    segments_match(&pattern, &topic)
}

fn segments_match(pattern: &[&str], topic: &[&str]) -> bool {
    match pattern.split_first() {
        None => topic.is_empty(),
        Some((&"#", rest)) => (0..=topic.len()).any(|skip| segments_match(rest, &topic[skip..])),
        Some((&segment, rest)) => match topic.split_first() {
            Some((&head, tail)) if segment == "*" || segment == head => segments_match(rest, tail),
            _ => false,
        },
    }
}

// ============================================================================
// Traits
// ============================================================================

/// A live subscription. Events not matching its filter are skipped.
pub struct Subscription {
    pub id: Uuid,
    pub filter: EventFilter,
    receiver: broadcast::Receiver<Event>,
}

impl Subscription {
    /// Wait for the next matching event.
    pub async fn recv(&mut self) -> EventBusResult<Event> {
        loop {
            match self.receiver.recv().await {
                Ok(event) if self.filter.matches(&event) => return Ok(event),
                Ok(_) => continue,
                Err(RecvError::Lagged(skipped)) => {
                    warn!(subscription_id = %self.id, skipped, "Subscriber lagged behind");
                }
                Err(RecvError::Closed) => return Err(EventBusError::Closed),
            }
        }
    }
}

/// Asynchronous event consumer, run for each matching event.
#[async_trait]
pub trait EventHandler: Send + Sync {
    async fn handle(&self, event: Event) -> EventBusResult<()>;

    fn filter(&self) -> EventFilter;
}

/// Publish/subscribe transport for realm events.
#[async_trait]
pub trait EventBus: Send + Sync {
    async fn publish(&self, event: Event) -> EventBusResult<()>;

    async fn subscribe(&self, filter: EventFilter) -> EventBusResult<Subscription>;

    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()>;

    /// End a subscription. Its receiver is dropped, so no further events queue up.
    async fn unsubscribe(&self, subscription: Subscription) -> EventBusResult<()>;

    async fn stats(&self) -> EventBusStats;
}

/// Event bus statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EventBusStats {
    pub events_published: u64,
    pub active_subscriptions: usize,
    pub registered_handlers: usize,
}

// ============================================================================
// In-memory bus
// ============================================================================

#[derive(Default)]
struct BusState {
    subscriptions: HashMap<Uuid, EventFilter>,
    handlers: Vec<Arc<dyn EventHandler>>,
    history: VecDeque<Event>,
    events_published: u64,
}

/// In-process event bus.
///
/// Keeps the most recent events so callers can inspect what realm actions
/// announced.
pub struct MemoryEventBus {
    sender: broadcast::Sender<Event>,
    state: RwLock<BusState>,
    capacity: usize,
}

impl std::fmt::Debug for MemoryEventBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemoryEventBus")
            .field("capacity", &self.capacity)
            .finish()
    }
}

impl MemoryEventBus {
    pub fn new() -> Self {
        Self::with_capacity(1024)
    }

    /// Bus whose channel and history hold `capacity` events.
    pub fn with_capacity(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (sender, _) = broadcast::channel(capacity);
        Self {
            sender,
            state: RwLock::new(BusState::default()),
            capacity,
        }
    }

    /// Events published so far, oldest first.
    pub async fn published(&self) -> Vec<Event> {
        self.state.read().await.history.iter().cloned().collect()
    }

    /// Published events whose topic matches `pattern`.
    pub async fn published_matching(&self, pattern: &str) -> Vec<Event> {
        self.published_for(&EventFilter::topic(pattern)).await
    }

    /// Published events passing `filter`.
    pub async fn published_for(&self, filter: &EventFilter) -> Vec<Event> {
        self.state
            .read()
            .await
            .history
            .iter()
            .filter(|event| filter.matches(event))
            .cloned()
            .collect()
    }

    pub async fn clear_history(&self) {
        self.state.write().await.history.clear();
    }
}

impl Default for MemoryEventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EventBus for MemoryEventBus {
    async fn publish(&self, event: Event) -> EventBusResult<()> {
        debug!(
            realm_id = %event.realm_id,
            topic = %event.topic(),
            event_id = %event.id,
            "Publishing realm event"
        );

        let handlers: Vec<Arc<dyn EventHandler>> = {
            let mut state = self.state.write().await;
            state.events_published += 1;
            if state.history.len() == self.capacity {
                state.history.pop_front();
            }
            state.history.push_back(event.clone());
            state
                .handlers
                .iter()
                .filter(|handler| handler.filter().matches(&event))
                .cloned()
                .collect()
        };

        // Nobody listening is fine
        let _ = self.sender.send(event.clone());

        for handler in handlers {
            let event = event.clone();
            tokio::spawn(async move {
                let event_id = event.id;
                if let Err(e) = handler.handle(event).await {
                    warn!(event_id = %event_id, error = %e, "Event handler failed");
                }
            });
        }
        Ok(())
    }

    async fn subscribe(&self, filter: EventFilter) -> EventBusResult<Subscription> {
        let id = Uuid::now_v7();
        self.state
            .write()
            .await
            .subscriptions
            .insert(id, filter.clone());
        Ok(Subscription {
            id,
            filter,
            receiver: self.sender.subscribe(),
        })
    }

    async fn register_handler(&self, handler: Arc<dyn EventHandler>) -> EventBusResult<()> {
        self.state.write().await.handlers.push(handler);
        Ok(())
    }

    async fn unsubscribe(&self, subscription: Subscription) -> EventBusResult<()> {
        let Subscription { id, receiver, .. } = subscription;
        drop(receiver);
        self.state
            .write()
            .await
            .subscriptions
            .remove(&id)
            .map(|_| ())
            .ok_or(EventBusError::UnknownSubscription(id))
    }

    async fn stats(&self) -> EventBusStats {
        let state = self.state.read().await;
        EventBusStats {
            events_published: state.events_published,
            active_subscriptions: state.subscriptions.len(),
            registered_handlers: state.handlers.len(),
        }
    }
}
