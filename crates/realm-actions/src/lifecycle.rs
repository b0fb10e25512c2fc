//! Realm lifecycle: deactivation, reactivation, renames and the periodic
//! sweeps that delete expired data.
//!
//! Illegal transitions (deactivating a deactivated realm, reactivating an
//! active one) are logged and return the realm unchanged.

use chrono::{DateTime, Utc};
use realm_events::RealmEvent;
use realm_org::{Realm, RealmError, RealmResult, UserProfile};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::confirmation::{Confirmation, ConfirmationType};
use crate::email::{realm_deactivated_email, realm_reactivation_email, DeactivatedBy};
use crate::service::{days_after, RealmService};

/// Why a realm was deactivated.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum DeactivationReason {
    OwnerRequest,
    Tos,
    InactiveRealm,
    DemoExpired,
    SubdomainChange,
    SelfHostingMigration,
}

impl DeactivationReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::OwnerRequest => "owner_request",
            Self::Tos => "tos",
            Self::InactiveRealm => "inactive_realm",
            Self::DemoExpired => "demo_expired",
            Self::SubdomainChange => "subdomain_change",
            Self::SelfHostingMigration => "self_hosting_migration",
        }
    }
}

/// How to deactivate a realm.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeactivationOptions {
    pub reason: DeactivationReason,
    /// Days until the data is scrubbed; `None` keeps it, `Some(0)` scrubs now
    pub deletion_delay_days: Option<u32>,
    /// Email every owner about the deactivation
    pub email_owners: bool,
}

impl DeactivationOptions {
    pub fn new(reason: DeactivationReason) -> Self {
        Self {
            reason,
            deletion_delay_days: None,
            email_owners: false,
        }
    }

    pub fn with_deletion_delay_days(mut self, days: Option<u32>) -> Self {
        self.deletion_delay_days = days;
        self
    }

    pub fn with_email_owners(mut self, email_owners: bool) -> Self {
        self.email_owners = email_owners;
        self
    }
}

impl RealmService {
    // ========================================================================
    // Deactivation
    // ========================================================================

    /// Deactivate a realm.
    pub async fn deactivate_realm(
        &self,
        realm_id: Uuid,
        acting_user: Option<Uuid>,
        options: DeactivationOptions,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        if realm.deactivated {
            warn!(realm_id = %realm.id, "Realm is already deactivated");
            return Ok(realm);
        }

        let now = Utc::now();
        let scheduled_deletion_date = options
            .deletion_delay_days
            .map(|days| days_after(now, i64::from(days), "deletion_delay_days"))
            .transpose()?;
        realm.deactivated = true;
        realm.scheduled_deletion_date = scheduled_deletion_date;
        self.save_realm(&realm).await?;

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmDeactivated)
                .with_acting_user(acting_user)
                .at(now)
                .with_extra("deactivation_reason", json!(options.reason.as_str())),
        )
        .await?;

        let cancelled = self.store.delete_scheduled_emails(realm.id).await?;
        info!(
            realm_id = %realm.id,
            reason = options.reason.as_str(),
            cancelled_emails = cancelled,
            "Deactivated realm"
        );

        self.publish(realm.id, acting_user, RealmEvent::Deactivated { realm_id: realm.id })
            .await;

        let delete_now = options.deletion_delay_days == Some(0);
        if options.email_owners {
            self.email_owners_about_deactivation(&realm, acting_user, now, delete_now)
                .await?;
        }

        if delete_now {
            info!(realm_id = %realm.id, "Scrubbing realm immediately after deactivation");
            self.scrub_realm(realm.id, None).await?;
            realm = self.get_realm(realm.id).await?;
            realm.scheduled_deletion_date = None;
            self.save_realm(&realm).await?;
        }

        Ok(realm)
    }

    /// Deactivate a realm at its owner's request.
    ///
    /// Checks the requested deletion delay against the server's bounds.
    pub async fn deactivate_realm_request(
        &self,
        realm_id: Uuid,
        acting_user_id: Uuid,
        deletion_delay_days: Option<u32>,
    ) -> RealmResult<Realm> {
        let realm = self.get_realm(realm_id).await?;
        self.require_owner(&realm, acting_user_id).await?;

        if let (Some(min), Some(days)) = (
            self.config.min_deactivated_realm_deletion_days,
            deletion_delay_days,
        ) {
            if days < min {
                return Err(RealmError::DeletionTooSoon(min));
            }
        }
        if let Some(max) = self.config.max_deactivated_realm_deletion_days {
            if deletion_delay_days.map_or(true, |days| days > max) {
                return Err(RealmError::DeletionTooLate(max));
            }
        }

        self.deactivate_realm(
            realm_id,
            Some(acting_user_id),
            DeactivationOptions::new(DeactivationReason::OwnerRequest)
                .with_deletion_delay_days(deletion_delay_days)
                .with_email_owners(true),
        )
        .await
    }

    async fn email_owners_about_deactivation(
        &self,
        realm: &Realm,
        acting_user: Option<Uuid>,
        deactivated_at: DateTime<Utc>,
        data_already_deleted: bool,
    ) -> RealmResult<()> {
        let actor = match acting_user {
            Some(id) => self.store.get_user(id).await?,
            None => None,
        };

        let owners: Vec<UserProfile> = self
            .store
            .list_users(realm.id)
            .await?
            .into_iter()
            .filter(|u| u.is_active_human_owner() && u.has_delivery_email())
            .collect();

        for owner in owners {
            let deactivated_by = match &actor {
                Some(actor) if actor.id == owner.id => DeactivatedBy::Recipient,
                Some(actor) => DeactivatedBy::User(actor.full_name.clone()),
                None => DeactivatedBy::Server,
            };
            let email = realm_deactivated_email(
                &owner.delivery_email,
                &realm.name,
                &deactivated_by,
                deactivated_at,
                realm.scheduled_deletion_date,
                data_already_deleted,
            );
            self.mailer.send(email).await?;
        }
        Ok(())
    }

    // ========================================================================
    // Reactivation
    // ========================================================================

    /// Reactivate a deactivated realm.
    pub async fn reactivate_realm(
        &self,
        realm_id: Uuid,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        if !realm.deactivated {
            warn!(
                "Realm {} cannot be reactivated because it is already active.",
                realm.id
            );
            return Ok(realm);
        }

        realm.deactivated = false;
        realm.scheduled_deletion_date = None;
        self.save_realm(&realm).await?;

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmReactivated)
                .with_acting_user(acting_user),
        )
        .await?;
        self.publish(realm.id, acting_user, RealmEvent::Reactivated { realm_id: realm.id })
            .await;

        info!(realm_id = %realm.id, "Reactivated realm");
        Ok(realm)
    }

    /// Email the realm's administrators a single-use reactivation link.
    ///
    /// Returns the confirmation key.
    pub async fn send_realm_reactivation_email(
        &self,
        realm_id: Uuid,
        acting_user: Option<Uuid>,
    ) -> RealmResult<String> {
        let realm = self.get_realm(realm_id).await?;
        let confirmation = Confirmation::new(
            ConfirmationType::RealmReactivation,
            realm.id,
            self.config.confirmation_link_validity_days,
        )?;
        let link = confirmation.url(&self.config.server_url());
        let key = confirmation.key.clone();
        self.store.insert_confirmation(confirmation).await?;

        let recipients: Vec<String> = self
            .store
            .list_users(realm.id)
            .await?
            .into_iter()
            .filter(|u| u.is_active && !u.is_bot && u.role.is_administrator())
            .filter(|u| u.has_delivery_email())
            .map(|u| u.delivery_email)
            .collect();
        if recipients.is_empty() {
            warn!(realm_id = %realm.id, "No administrator can receive the reactivation link");
        } else {
            self.mailer
                .send(realm_reactivation_email(recipients, &realm.name, &link))
                .await?;
        }

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmReactivationEmailSent)
                .with_acting_user(acting_user),
        )
        .await?;
        Ok(key)
    }

    /// Reactivate a realm from a confirmation link.
    pub async fn confirm_reactivation(&self, key: &str) -> RealmResult<Realm> {
        self.confirm_reactivation_at(key, Utc::now()).await
    }

    /// Reactivate a realm from a confirmation link, as of `now`.
    pub async fn confirm_reactivation_at(&self, key: &str, now: DateTime<Utc>) -> RealmResult<Realm> {
        let mut confirmation = match self.store.get_confirmation(key).await? {
            Some(c) if c.is_usable(ConfirmationType::RealmReactivation, now) => c,
            _ => return Err(RealmError::InvalidReactivationLink),
        };
        confirmation.used = true;
        self.store.update_confirmation(&confirmation).await?;
        self.reactivate_realm(confirmation.object_id, None).await
    }

    // ========================================================================
    // Redirects and renames
    // ========================================================================

    /// Send visitors of a deactivated realm to `redirect_url`.
    pub async fn add_deactivated_redirect(
        &self,
        realm_id: Uuid,
        redirect_url: &str,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        realm.deactivated_redirect = Some(redirect_url.to_string());
        self.save_realm(&realm).await?;
        Ok(realm)
    }

    /// Move a realm to a new subdomain.
    ///
    /// With `add_deactivated_redirect`, a deactivated placeholder realm on
    /// the old subdomain sends visitors to the new URL.
    pub async fn change_realm_subdomain(
        &self,
        realm_id: Uuid,
        new_subdomain: &str,
        acting_user: Option<Uuid>,
        add_deactivated_redirect: bool,
    ) -> RealmResult<Realm> {
        self.check_subdomain_name(new_subdomain)?;
        let mut realm = self.get_realm(realm_id).await?;
        let old_subdomain = realm.string_id.clone();
        if old_subdomain == new_subdomain {
            return Ok(realm);
        }
        if self.store.get_realm_by_string_id(new_subdomain).await?.is_some() {
            return Err(RealmError::SubdomainUnavailable);
        }

        let old_url = realm.url(&self.config.external_host);
        realm.string_id = new_subdomain.to_string();
        self.save_realm(&realm).await?;
        self.cache.flush_subdomain(&old_subdomain).await;

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmSubdomainChanged)
                .with_acting_user(acting_user)
                .with_extra("old_subdomain", json!(old_subdomain))
                .with_extra("new_subdomain", json!(new_subdomain)),
        )
        .await?;

        let realm_url = realm.url(&self.config.external_host);
        self.publish(
            realm.id,
            acting_user,
            RealmEvent::SubdomainChanged {
                old_subdomain: old_subdomain.clone(),
                new_subdomain: new_subdomain.to_string(),
                realm_url: realm_url.clone(),
            },
        )
        .await;

        // Placeholders left by earlier moves follow the realm to its new URL.
        let stale: Vec<Realm> = self
            .store
            .list_realms()
            .await?
            .into_iter()
            .filter(|r| r.deactivated && r.deactivated_redirect.as_deref() == Some(old_url.as_str()))
            .collect();
        for mut placeholder in stale {
            placeholder.deactivated_redirect = Some(realm_url.clone());
            self.save_realm(&placeholder).await?;
        }

        if add_deactivated_redirect {
            let mut placeholder = Realm::new(old_subdomain.as_str(), realm.name.as_str(), realm.plan_type);
            placeholder.deactivated = true;
            placeholder.deactivated_redirect = Some(realm_url);
            self.store.insert_realm(placeholder.clone()).await?;
            self.audit(
                AuditLogEntry::new(placeholder.id, AuditLogEventType::RealmDeactivated)
                    .with_acting_user(acting_user)
                    .with_extra(
                        "deactivation_reason",
                        json!(DeactivationReason::SubdomainChange.as_str()),
                    ),
            )
            .await?;
        }

        info!(
            realm_id = %realm.id,
            old_subdomain = %old_subdomain,
            new_subdomain = %new_subdomain,
            "Changed realm subdomain"
        );
        Ok(realm)
    }

    // ========================================================================
    // Sweeps
    // ========================================================================

    /// Scrub every deactivated realm whose deletion date has passed.
    pub async fn clean_deactivated_realm_data(&self) -> RealmResult<Vec<Uuid>> {
        self.clean_deactivated_realm_data_at(Utc::now()).await
    }

    /// Scrub every deactivated realm whose deletion date is at or before `now`.
    ///
    /// The deletion date is cleared afterwards so each realm is swept once.
    pub async fn clean_deactivated_realm_data_at(&self, now: DateTime<Utc>) -> RealmResult<Vec<Uuid>> {
        let due: Vec<Realm> = self
            .store
            .list_realms()
            .await?
            .into_iter()
            .filter(|r| r.deactivated && r.scheduled_deletion_date.is_some_and(|d| d <= now))
            .collect();

        let mut scrubbed = Vec::with_capacity(due.len());
        for realm in due {
            info!(realm_id = %realm.id, "Deleting data of deactivated realm");
            self.scrub_realm(realm.id, None).await?;
            let mut realm = self.get_realm(realm.id).await?;
            realm.scheduled_deletion_date = None;
            self.save_realm(&realm).await?;
            scrubbed.push(realm.id);
        }
        Ok(scrubbed)
    }

    /// Deactivate and delete every expired demo organization.
    pub async fn delete_expired_demo_organizations(&self) -> RealmResult<Vec<Uuid>> {
        self.delete_expired_demo_organizations_at(Utc::now()).await
    }

    /// Deactivate and delete every demo organization expired as of `now`.
    pub async fn delete_expired_demo_organizations_at(
        &self,
        now: DateTime<Utc>,
    ) -> RealmResult<Vec<Uuid>> {
        let expired: Vec<Realm> = self
            .store
            .list_realms()
            .await?
            .into_iter()
            .filter(|r| {
                !r.deactivated
                    && r.demo_organization_scheduled_deletion_date
                        .is_some_and(|d| d <= now)
            })
            .collect();

        let mut deleted = Vec::with_capacity(expired.len());
        for realm in expired {
            let owner_has_email = self
                .store
                .list_users(realm.id)
                .await?
                .iter()
                .any(|u| u.is_active_human_owner() && u.has_delivery_email());

            self.deactivate_realm(
                realm.id,
                None,
                DeactivationOptions::new(DeactivationReason::DemoExpired)
                    .with_deletion_delay_days(Some(0))
                    .with_email_owners(owner_has_email),
            )
            .await?;
            deleted.push(realm.id);
        }
        Ok(deleted)
    }
}
