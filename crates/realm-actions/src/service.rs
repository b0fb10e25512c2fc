//! Realm service
//!
//! [`RealmService`] ties the realm model to its collaborators: the store,
//! the event bus, the mailer and upload storage. The actions themselves are
//! spread over the sibling modules as `impl RealmService` blocks.

use chrono::{DateTime, Duration, Utc};
use realm_events::{EventBus, RealmEvent};
use realm_org::{Realm, RealmError, RealmResult, SystemGroup, UserGroup, UserProfile};
use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use tracing::{debug, warn};
use uuid::Uuid;

use crate::audit::AuditLogEntry;
use crate::cache::{RealmCache, RenderedDescription};
use crate::config::RealmConfig;
use crate::email::EmailSender;
use crate::store::RealmStore;
use crate::uploads::UploadBackend;

/// `start` moved `days` days ahead, rejecting dates the calendar cannot hold.
pub(crate) fn days_after(start: DateTime<Utc>, days: i64, field: &str) -> RealmResult<DateTime<Utc>> {
    Duration::try_days(days)
        .and_then(|delta| start.checked_add_signed(delta))
        .ok_or_else(|| RealmError::InvalidArgument(format!("Invalid {}", field)))
}

/// Realm actions over a set of collaborators.
pub struct RealmService {
    pub(crate) store: Arc<dyn RealmStore>,
    pub(crate) events: Arc<dyn EventBus>,
    pub(crate) mailer: Arc<dyn EmailSender>,
    pub(crate) uploads: Arc<dyn UploadBackend>,
    pub(crate) cache: RealmCache,
    pub(crate) config: RealmConfig,
}

impl std::fmt::Debug for RealmService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RealmService")
            .field("external_host", &self.config.external_host)
            .field("billing_enabled", &self.config.billing_enabled)
            .finish()
    }
}

impl RealmService {
    /// Create a service.
    pub fn new(
        store: Arc<dyn RealmStore>,
        events: Arc<dyn EventBus>,
        mailer: Arc<dyn EmailSender>,
        uploads: Arc<dyn UploadBackend>,
        config: RealmConfig,
    ) -> Self {
        Self {
            store,
            events,
            mailer,
            uploads,
            cache: RealmCache::new(),
            config,
        }
    }

    /// Server configuration.
    pub fn config(&self) -> &RealmConfig {
        &self.config
    }

    /// Realm lookup cache.
    pub fn cache(&self) -> &RealmCache {
        &self.cache
    }

    /// Underlying store.
    pub fn store(&self) -> &Arc<dyn RealmStore> {
        &self.store
    }

    // ========================================================================
    // Lookups
    // ========================================================================

    /// Load a realm.
    pub async fn get_realm(&self, realm_id: Uuid) -> RealmResult<Realm> {
        self.store
            .get_realm(realm_id)
            .await?
            .ok_or_else(|| RealmError::NotFound(format!("Realm {}", realm_id)))
    }

    /// Load a realm by subdomain, through the cache.
    pub async fn get_realm_by_subdomain(&self, subdomain: &str) -> RealmResult<Option<Realm>> {
        if let Some(realm) = self.cache.get(subdomain).await {
            return Ok(Some(realm));
        }
        let realm = self.store.get_realm_by_string_id(subdomain).await?;
        if let Some(realm) = &realm {
            self.cache.put(realm).await;
        }
        Ok(realm)
    }

    /// Load a user.
    pub async fn get_user(&self, user_id: Uuid) -> RealmResult<UserProfile> {
        self.store
            .get_user(user_id)
            .await?
            .ok_or_else(|| RealmError::NotFound(format!("User {}", user_id)))
    }

    /// Rendered login-page description of a realm.
    pub async fn realm_description(&self, realm_id: Uuid) -> RealmResult<RenderedDescription> {
        let realm = self.get_realm(realm_id).await?;
        Ok(self.cache.description(&realm).await)
    }

    /// System groups of a realm, by kind.
    pub async fn system_groups(&self, realm_id: Uuid) -> RealmResult<HashMap<SystemGroup, UserGroup>> {
        Ok(self
            .store
            .list_groups(realm_id)
            .await?
            .into_iter()
            .filter_map(|group| group.system_group().map(|kind| (kind, group)))
            .collect())
    }

    /// Id of one of a realm's system groups.
    pub async fn system_group_id(&self, realm_id: Uuid, group: SystemGroup) -> RealmResult<Uuid> {
        self.system_groups(realm_id)
            .await?
            .get(&group)
            .map(|g| g.id)
            .ok_or_else(|| RealmError::NotFound(format!("System group {}", group.name())))
    }

    // ========================================================================
    // Users
    // ========================================================================

    /// Add a user to a realm and place them in the system groups for their role.
    pub async fn add_user(&self, user: UserProfile) -> RealmResult<UserProfile> {
        let realm = self.get_realm(user.realm_id).await?;
        self.store.insert_user(user.clone()).await?;
        self.sync_system_groups(&realm, Utc::now()).await?;
        Ok(user)
    }

    /// Recompute system group membership from roles and the waiting period.
    pub async fn sync_system_groups(&self, realm: &Realm, now: DateTime<Utc>) -> RealmResult<()> {
        let users = self.store.list_users(realm.id).await?;
        for (kind, mut group) in self.system_groups(realm.id).await? {
            let members: BTreeSet<Uuid> = users
                .iter()
                .filter(|u| u.is_active)
                .filter(|u| {
                    let full = u.is_past_waiting_period(realm.waiting_period_threshold, now);
                    kind.includes(u.role, full)
                })
                .map(|u| u.id)
                .collect();
            if group.direct_members != members {
                group.direct_members = members;
                self.store.update_group(&group).await?;
            }
        }
        Ok(())
    }

    // ========================================================================
    // Shared helpers
    // ========================================================================

    /// Load the acting user and check they are an administrator of `realm`.
    pub(crate) async fn require_admin(&self, realm: &Realm, user_id: Uuid) -> RealmResult<UserProfile> {
        let user = self.acting_user(realm, user_id).await?;
        if !user.role.is_administrator() {
            return Err(RealmError::MustBeAdministrator);
        }
        Ok(user)
    }

    /// Load the acting user and check they are an owner of `realm`.
    pub(crate) async fn require_owner(&self, realm: &Realm, user_id: Uuid) -> RealmResult<UserProfile> {
        let user = self.acting_user(realm, user_id).await?;
        if !user.role.is_owner() {
            return Err(RealmError::MustBeOwner);
        }
        Ok(user)
    }

    async fn acting_user(&self, realm: &Realm, user_id: Uuid) -> RealmResult<UserProfile> {
        let user = self.get_user(user_id).await?;
        if user.realm_id != realm.id || !user.is_active {
            return Err(RealmError::NotFound(format!("User {}", user_id)));
        }
        Ok(user)
    }

    /// Persist a realm and flush its cache entries.
    pub(crate) async fn save_realm(&self, realm: &Realm) -> RealmResult<()> {
        self.store.update_realm(realm).await?;
        self.cache.flush_realm(realm).await;
        Ok(())
    }

    pub(crate) async fn audit(&self, entry: AuditLogEntry) -> RealmResult<()> {
        debug!(
            realm_id = %entry.realm_id,
            event_type = %entry.event_type,
            "Recording audit log entry"
        );
        self.store.append_audit_log(entry).await
    }

    /// Publish a realm event. Delivery failures are logged, not returned.
    pub(crate) async fn publish(&self, realm_id: Uuid, acting_user: Option<Uuid>, event: RealmEvent) {
        let event = match event.to_event(realm_id) {
            Ok(event) => event.with_acting_user(acting_user),
            Err(e) => {
                warn!(realm_id = %realm_id, error = %e, "Failed to build realm event");
                return;
            }
        };
        if let Err(e) = self.events.publish(event).await {
            warn!(realm_id = %realm_id, error = %e, "Failed to publish realm event");
        }
    }
}
