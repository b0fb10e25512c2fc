//! Realm audit log
//!
//! Every state-changing realm action appends an entry recording who did
//! what and when, with the old and new values in `extra_data`.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kinds of audited realm events.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum AuditLogEventType {
    RealmCreated,
    RealmDeactivated,
    RealmReactivated,
    RealmScrubbed,
    RealmPlanTypeChanged,
    RealmPropertyChanged,
    RealmSubdomainChanged,
    RealmOrgTypeChanged,
    RealmDefaultUserSettingsChanged,
    RealmReactivationEmailSent,
    RealmAuthenticationMethodsChanged,
}

impl AuditLogEventType {
    /// Stable string form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RealmCreated => "realm_created",
            Self::RealmDeactivated => "realm_deactivated",
            Self::RealmReactivated => "realm_reactivated",
            Self::RealmScrubbed => "realm_scrubbed",
            Self::RealmPlanTypeChanged => "realm_plan_type_changed",
            Self::RealmPropertyChanged => "realm_property_changed",
            Self::RealmSubdomainChanged => "realm_subdomain_changed",
            Self::RealmOrgTypeChanged => "realm_org_type_changed",
            Self::RealmDefaultUserSettingsChanged => "realm_default_user_settings_changed",
            Self::RealmReactivationEmailSent => "realm_reactivation_email_sent",
            Self::RealmAuthenticationMethodsChanged => "realm_authentication_methods_changed",
        }
    }
}

impl std::fmt::Display for AuditLogEventType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One audit log record.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditLogEntry {
    /// Unique identifier
    pub id: Uuid,

    /// Realm the entry belongs to
    pub realm_id: Uuid,

    /// User who performed the action (None for system actions)
    pub acting_user_id: Option<Uuid>,

    /// User the action was performed on
    pub modified_user_id: Option<Uuid>,

    /// What happened
    pub event_type: AuditLogEventType,

    /// When it happened
    pub event_time: DateTime<Utc>,

    /// Event-specific details
    #[serde(default)]
    pub extra_data: serde_json::Map<String, serde_json::Value>,
}

impl AuditLogEntry {
    /// Create an entry timestamped now.
    pub fn new(realm_id: Uuid, event_type: AuditLogEventType) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            acting_user_id: None,
            modified_user_id: None,
            event_type,
            event_time: Utc::now(),
            extra_data: serde_json::Map::new(),
        }
    }

    /// Set the acting user.
    pub fn with_acting_user(mut self, user_id: Option<Uuid>) -> Self {
        self.acting_user_id = user_id;
        self
    }

    /// Set the modified user.
    pub fn with_modified_user(mut self, user_id: Uuid) -> Self {
        self.modified_user_id = Some(user_id);
        self
    }

    /// Override the event time.
    pub fn at(mut self, event_time: DateTime<Utc>) -> Self {
        self.event_time = event_time;
        self
    }

    /// Add a detail.
    pub fn with_extra(mut self, key: impl Into<String>, value: serde_json::Value) -> Self {
        self.extra_data.insert(key.into(), value);
        self
    }

    /// Record an old/new pair, optionally naming the property.
    pub fn with_change(
        self,
        property: Option<&str>,
        old_value: serde_json::Value,
        new_value: serde_json::Value,
    ) -> Self {
        let entry = self
            .with_extra("old_value", old_value)
            .with_extra("new_value", new_value);
        match property {
            Some(property) => entry.with_extra("property", serde_json::json!(property)),
            None => entry,
        }
    }
}
