//! Outgoing realm emails
//!
//! Realm lifecycle actions notify owners and administrators by email. The
//! [`EmailSender`] trait hides the delivery mechanism; [`MemoryOutbox`]
//! records what would have been sent.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use realm_org::{RealmError, RealmResult};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

/// Date format used in email bodies, e.g. "March 4, 2026".
const EMAIL_DATE_FORMAT: &str = "%B %-d, %Y";

/// Format a timestamp for an email body.
pub fn format_email_date(date: DateTime<Utc>) -> String {
    date.format(EMAIL_DATE_FORMAT).to_string()
}

/// Kind of realm email.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EmailTemplate {
    RealmDeactivated,
    RealmReactivation,
}

/// A rendered email.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct OutgoingEmail {
    pub template: EmailTemplate,
    pub to: Vec<String>,
    pub from_name: String,
    pub subject: String,
    pub body: String,
}

/// Email delivery backend.
#[async_trait]
pub trait EmailSender: Send + Sync {
    /// Send an email.
    async fn send(&self, email: OutgoingEmail) -> RealmResult<()>;
}

/// Records sent emails in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryOutbox {
    sent: Arc<RwLock<Vec<OutgoingEmail>>>,
}

impl MemoryOutbox {
    pub fn new() -> Self {
        Self::default()
    }

    /// Emails sent so far.
    pub async fn sent(&self) -> Vec<OutgoingEmail> {
        self.sent.read().await.clone()
    }

    /// Emails sent to an address.
    pub async fn sent_to(&self, address: &str) -> Vec<OutgoingEmail> {
        self.sent
            .read()
            .await
            .iter()
            .filter(|email| email.to.iter().any(|to| to == address))
            .cloned()
            .collect()
    }

    pub async fn clear(&self) {
        self.sent.write().await.clear();
    }
}

#[async_trait]
impl EmailSender for MemoryOutbox {
    async fn send(&self, email: OutgoingEmail) -> RealmResult<()> {
        if email.to.is_empty() {
            return Err(RealmError::InvalidArgument(
                "Email has no recipients".to_string(),
            ));
        }
        debug!(template = ?email.template, recipients = email.to.len(), "Sending email");
        self.sent.write().await.push(email);
        Ok(())
    }
}

// ============================================================================
// Templates
// ============================================================================

/// Who deactivated the realm, from the recipient's point of view.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeactivatedBy {
    /// The recipient did it
    Recipient,
    /// Another user did it
    User(String),
    /// Server administrators or an automated job did it
    Server,
}

/// Email telling an owner their realm was deactivated.
pub fn realm_deactivated_email(
    to: &str,
    realm_name: &str,
    deactivated_by: &DeactivatedBy,
    deactivated_at: DateTime<Utc>,
    data_deletion_date: Option<DateTime<Utc>>,
    data_already_deleted: bool,
) -> OutgoingEmail {
    let date = format_email_date(deactivated_at);
    let mut body = match deactivated_by {
        DeactivatedBy::Recipient => {
            format!("You have deactivated your organization, {}, on {}.", realm_name, date)
        }
        DeactivatedBy::User(actor) => format!(
            "Your organization, {}, was deactivated by {} on {}.",
            realm_name, actor, date
        ),
        DeactivatedBy::Server => {
            format!("Your organization, {}, was deactivated on {}.", realm_name, date)
        }
    };

    if data_already_deleted {
        body.push_str("\n\nAll data associated with this organization has been permanently deleted.");
    } else if let Some(deletion) = data_deletion_date {
        body.push_str(&format!(
            "\n\nAll data associated with this organization will be permanently deleted on {}.",
            format_email_date(deletion)
        ));
    }

    OutgoingEmail {
        template: EmailTemplate::RealmDeactivated,
        to: vec![to.to_string()],
        from_name: "Account Security".to_string(),
        subject: format!("Your organization {} has been deactivated", realm_name),
        body,
    }
}

/// Email inviting former administrators to reactivate a realm.
pub fn realm_reactivation_email(to: Vec<String>, realm_name: &str, link: &str) -> OutgoingEmail {
    OutgoingEmail {
        template: EmailTemplate::RealmReactivation,
        to,
        from_name: "Account Security".to_string(),
        subject: "Reactivate your organization".to_string(),
        body: format!(
            "Dear former administrators of {},\n\n\
             Your organization can be reactivated by visiting the link below.\n\n{}",
            realm_name, link
        ),
    }
}
