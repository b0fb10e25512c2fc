//! User accounts within a realm

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::roles::UserRole;

/// A user account, scoped to one realm.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    /// Unique identifier
    pub id: Uuid,

    /// Realm the account belongs to
    pub realm_id: Uuid,

    /// Display name
    pub full_name: String,

    /// Address shown to other users (may be a fake address)
    pub email: String,

    /// Address mail is actually delivered to (empty when not configured)
    pub delivery_email: String,

    /// Role within the realm
    pub role: UserRole,

    /// Whether the account is a bot
    pub is_bot: bool,

    /// Whether the account is active
    pub is_active: bool,

    /// When the account joined the realm
    pub date_joined: DateTime<Utc>,
}

impl UserProfile {
    /// Create an active human account.
    pub fn new(
        realm_id: Uuid,
        full_name: impl Into<String>,
        email: impl Into<String>,
        role: UserRole,
    ) -> Self {
        let email = email.into();
        Self {
            id: Uuid::now_v7(),
            realm_id,
            full_name: full_name.into(),
            delivery_email: email.clone(),
            email,
            role,
            is_bot: false,
            is_active: true,
            date_joined: Utc::now(),
        }
    }

    /// Create a bot account.
    pub fn bot(realm_id: Uuid, full_name: impl Into<String>, email: impl Into<String>) -> Self {
        Self {
            is_bot: true,
            ..Self::new(realm_id, full_name, email, UserRole::Member)
        }
    }

    /// Clear the delivery address (demo organization owners start without one).
    pub fn without_delivery_email(mut self) -> Self {
        self.delivery_email.clear();
        self
    }

    /// Set the join date.
    pub fn joined_at(mut self, date_joined: DateTime<Utc>) -> Self {
        self.date_joined = date_joined;
        self
    }

    /// Whether mail can be delivered to this user.
    pub fn has_delivery_email(&self) -> bool {
        !self.delivery_email.is_empty()
    }

    /// Whether this active human account is an owner.
    pub fn is_active_human_owner(&self) -> bool {
        self.is_active && !self.is_bot && self.role.is_owner()
    }

    /// Whether the account has been a member longer than `waiting_period_days`.
    pub fn is_past_waiting_period(&self, waiting_period_days: i64, now: DateTime<Utc>) -> bool {
        Duration::try_days(waiting_period_days)
            .is_some_and(|period| now - self.date_joined >= period)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_creation() {
        let realm_id = Uuid::now_v7();
        let user = UserProfile::new(realm_id, "Iago", "iago@example.com", UserRole::Administrator);
        assert_eq!(user.delivery_email, "iago@example.com");
        assert!(user.has_delivery_email());
        assert!(!user.is_bot);

        let owner = UserProfile::new(realm_id, "Desdemona", "desdemona@example.com", UserRole::Owner)
            .without_delivery_email();
        assert!(!owner.has_delivery_email());
        assert!(owner.is_active_human_owner());
    }

    #[test]
    fn test_waiting_period() {
        let now = Utc::now();
        let user = UserProfile::new(Uuid::now_v7(), "New", "new@example.com", UserRole::Member)
            .joined_at(now - Duration::days(3));
        assert!(user.is_past_waiting_period(0, now));
        assert!(user.is_past_waiting_period(3, now));
        assert!(!user.is_past_waiting_period(10, now));
        assert!(!user.is_past_waiting_period(i64::MAX, now));
    }
}
