//! # Realm Events
//!
//! This crate provides the event bus realm actions publish to, so that
//! clients and other services learn about realm changes.
//!
//! ## Overview
//!
//! - **Event Types**: `RealmEvent` variants for property updates and lifecycle changes
//! - **Event Bus**: Publish/subscribe messaging behind the `EventBus` trait
//! - **Filters**: Subscriptions scoped to one realm and a topic pattern
//!
//! ## Usage
//!
//! ```rust,no_run
//! use realm_events::{EventBus, EventFilter, MemoryEventBus, RealmEvent};
//! use uuid::Uuid;
//!
//! async fn publish_example() {
//!     let bus = MemoryEventBus::new();
//!     let realm_id = Uuid::now_v7();
//!     let mut sub = bus
//!         .subscribe(EventFilter::realm(realm_id).with_pattern("realm.*"))
//!         .await
//!         .unwrap();
//!
//!     let event = RealmEvent::Update {
//!         property: "name".to_string(),
//!         value: serde_json::json!("Acme"),
//!     };
//!     bus.publish(event.to_event(realm_id).unwrap()).await.unwrap();
//!
//!     let received = sub.recv().await.unwrap();
//!     assert_eq!(received.event_type, "realm.update");
//! }
//! ```
//!
//! ## Topic Patterns
//!
//! Topics are the event type: `realm.update`, `realm.deactivated`,
//! `realm_user_settings_defaults.update`.
//!
//! Wildcards:
//! - `*` matches exactly one segment
//! - `#` matches zero or more segments

pub mod bus;
pub mod types;

// Re-export main types
pub use bus::{
    EventBus, EventBusError, EventBusResult, EventBusStats, EventFilter, EventHandler,
    MemoryEventBus, Subscription,
};
pub use types::{Event, RealmEvent};
