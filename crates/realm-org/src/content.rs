//! Realm-scoped content
//!
//! Rows that deactivation and scrubbing act on: messages, per-user message
//! flags, uploaded files, custom profile fields and queued emails.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A message sent in a realm.
///
/// `realm_id` is the realm the message lives in, which is not always the
/// sender's realm: system bots send messages into every realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    /// Unique identifier
    pub id: Uuid,
    /// Realm the message belongs to
    pub realm_id: Uuid,
    /// Sender
    pub sender_id: Uuid,
    /// Destination channel (None for direct messages)
    pub stream_id: Option<Uuid>,
    /// Topic name
    pub topic: String,
    /// Markdown content
    pub content: String,
    /// When the message was sent
    pub date_sent: DateTime<Utc>,
}

impl Message {
    /// Create a channel message.
    pub fn new(
        realm_id: Uuid,
        sender_id: Uuid,
        stream_id: Option<Uuid>,
        topic: impl Into<String>,
        content: impl Into<String>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            sender_id,
            stream_id,
            topic: topic.into(),
            content: content.into(),
            date_sent: Utc::now(),
        }
    }
}

/// A user's copy of a message (read state, flags).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserMessage {
    /// Unique identifier
    pub id: Uuid,
    /// Receiving user
    pub user_id: Uuid,
    /// Message
    pub message_id: Uuid,
    /// Whether the user has read it
    pub read: bool,
}

impl UserMessage {
    /// Create an unread row.
    pub fn new(user_id: Uuid, message_id: Uuid) -> Self {
        Self {
            id: Uuid::now_v7(),
            user_id,
            message_id,
            read: false,
        }
    }
}

/// An uploaded file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attachment {
    /// Unique identifier
    pub id: Uuid,
    /// Realm the file was uploaded to
    pub realm_id: Uuid,
    /// Uploader
    pub owner_id: Uuid,
    /// Storage path, `<realm_id>/<random>/<file_name>`
    pub path_id: String,
    /// Original file name
    pub file_name: String,
    /// Size in bytes
    pub size: u64,
    /// When the file was uploaded
    pub create_time: DateTime<Utc>,
}

impl Attachment {
    /// Create an attachment record.
    pub fn new(realm_id: Uuid, owner_id: Uuid, file_name: impl Into<String>, size: u64) -> Self {
        let file_name = file_name.into();
        Self {
            id: Uuid::now_v7(),
            realm_id,
            owner_id,
            path_id: format!("{}/{}/{}", realm_id, Uuid::now_v7().simple(), file_name),
            file_name,
            size,
            create_time: Utc::now(),
        }
    }
}

/// An admin-defined profile field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CustomProfileField {
    /// Unique identifier
    pub id: Uuid,
    /// Realm the field belongs to
    pub realm_id: Uuid,
    /// Field label
    pub name: String,
    /// Help text
    pub hint: String,
}

impl CustomProfileField {
    /// Create a profile field.
    pub fn new(realm_id: Uuid, name: impl Into<String>, hint: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: name.into(),
            hint: hint.into(),
        }
    }
}

/// Kind of a queued email.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum ScheduledEmailType {
    Welcome,
    Digest,
    InvitationReminder,
}

/// An email queued for later delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScheduledEmail {
    /// Unique identifier
    pub id: Uuid,
    /// Realm the email belongs to
    pub realm_id: Uuid,
    /// Recipients
    pub user_ids: Vec<Uuid>,
    /// Kind of email
    pub email_type: ScheduledEmailType,
    /// When the email should go out
    pub scheduled_timestamp: DateTime<Utc>,
}

impl ScheduledEmail {
    /// Queue an email.
    pub fn new(
        realm_id: Uuid,
        user_ids: Vec<Uuid>,
        email_type: ScheduledEmailType,
        scheduled_timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            user_ids,
            email_type,
            scheduled_timestamp,
        }
    }
}
