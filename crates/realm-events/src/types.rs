//! Event types for realm updates
//!
//! Every realm action that clients need to hear about publishes a
//! [`RealmEvent`]. On the bus it travels inside an [`Event`] envelope that
//! carries the realm it concerns and who caused it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::bus::{EventBusError, EventBusResult};

/// Envelope for an event published on the bus.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub id: Uuid,

    /// Dotted event type, also used as the topic (`realm.update`)
    pub event_type: String,

    pub realm_id: Uuid,

    /// User whose action caused the event; `None` for server jobs
    pub acting_user_id: Option<Uuid>,

    pub occurred_at: DateTime<Utc>,

    /// Serialized [`RealmEvent`]
    pub payload: serde_json::Value,
}

impl Event {
    /// Create an event for a realm.
    pub fn new(realm_id: Uuid, event_type: impl Into<String>, payload: serde_json::Value) -> Self {
        Self {
            id: Uuid::now_v7(),
            event_type: event_type.into(),
            realm_id,
            acting_user_id: None,
            occurred_at: Utc::now(),
            payload,
        }
    }

    /// Record who caused the event.
    pub fn with_acting_user(mut self, user_id: Option<Uuid>) -> Self {
        self.acting_user_id = user_id;
        self
    }

    /// Topic the event is routed on.
    pub fn topic(&self) -> &str {
        &self.event_type
    }

    /// Parse the payload into a specific type.
    pub fn parse_payload<T: for<'de> Deserialize<'de>>(&self) -> Result<T, serde_json::Error> {
        serde_json::from_value(self.payload.clone())
    }
}

// ============================================================================
// Realm Events
// ============================================================================

/// Changes to a realm, as seen by clients.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum RealmEvent {
    /// A single property changed
    Update {
        property: String,
        value: serde_json::Value,
    },
    /// Several related properties changed together
    UpdateDict {
        property: String,
        data: serde_json::Map<String, serde_json::Value>,
    },
    /// The realm was deactivated
    Deactivated { realm_id: Uuid },
    /// The realm was reactivated
    Reactivated { realm_id: Uuid },
    /// The realm's content was scrubbed
    Scrubbed { realm_id: Uuid },
    /// The realm moved to a new subdomain
    SubdomainChanged {
        old_subdomain: String,
        new_subdomain: String,
        realm_url: String,
    },
    /// A realm-wide default for new users changed
    UserSettingsDefaultsUpdate {
        property: String,
        value: serde_json::Value,
    },
}

impl RealmEvent {
    /// Event type string for this event.
    pub fn event_type(&self) -> &'static str {
        match self {
            RealmEvent::Update { .. } => "realm.update",
            RealmEvent::UpdateDict { .. } => "realm.update_dict",
            RealmEvent::Deactivated { .. } => "realm.deactivated",
            RealmEvent::Reactivated { .. } => "realm.reactivated",
            RealmEvent::Scrubbed { .. } => "realm.scrubbed",
            RealmEvent::SubdomainChanged { .. } => "realm.subdomain_changed",
            RealmEvent::UserSettingsDefaultsUpdate { .. } => "realm_user_settings_defaults.update",
        }
    }

    /// Wrap in an envelope for `realm_id`.
    pub fn to_event(&self, realm_id: Uuid) -> EventBusResult<Event> {
        let payload =
            serde_json::to_value(self).map_err(|e| EventBusError::Serialization(e.to_string()))?;
        Ok(Event::new(realm_id, self.event_type(), payload))
    }
}
