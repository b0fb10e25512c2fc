//! Channels (streams) within a realm

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A channel in a realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Stream {
    /// Unique identifier
    pub id: Uuid,

    /// Realm the channel belongs to
    pub realm_id: Uuid,

    /// Channel name
    pub name: String,

    /// Private channel
    pub invite_only: bool,

    /// Readable by logged-out spectators
    pub is_web_public: bool,

    /// Archived channel
    pub deactivated: bool,

    /// When the channel was created
    pub date_created: DateTime<Utc>,
}

impl Stream {
    /// Create a public channel.
    pub fn new(realm_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: name.into(),
            invite_only: false,
            is_web_public: false,
            deactivated: false,
            date_created: Utc::now(),
        }
    }

    /// Make the channel private.
    pub fn private(mut self) -> Self {
        self.invite_only = true;
        self.is_web_public = false;
        self
    }

    /// Make the channel web-public.
    pub fn web_public(mut self) -> Self {
        self.invite_only = false;
        self.is_web_public = true;
        self
    }

    /// Whether the channel is private.
    pub fn is_private(&self) -> bool {
        self.invite_only
    }
}
