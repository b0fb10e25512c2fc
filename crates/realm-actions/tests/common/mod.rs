//! Shared fixture for realm action tests.

#![allow(dead_code)]

use realm_actions::{
    AuditLogEntry, AuditLogEventType, CreateRealmOptions, MemoryOutbox, MemoryRealmStore,
    MemoryUploadBackend, RealmConfig, RealmService, RealmStore,
};
use realm_events::MemoryEventBus;
use realm_org::{PlanType, Realm, UserProfile, UserRole};
use std::sync::Arc;
use uuid::Uuid;

/// Test fixture wiring a service to in-memory collaborators.
pub struct TestFixture {
    /// Backing store.
    pub store: Arc<MemoryRealmStore>,
    /// Published events.
    pub events: Arc<MemoryEventBus>,
    /// Sent emails.
    pub outbox: Arc<MemoryOutbox>,
    /// Upload storage.
    pub uploads: Arc<MemoryUploadBackend>,
    /// Service under test.
    pub service: RealmService,
}

/// A realm with one user per interesting role.
pub struct TestRealm {
    pub realm: Realm,
    pub owner: UserProfile,
    pub admin: UserProfile,
    pub member: UserProfile,
}

impl TestFixture {
    /// Fixture with the development configuration.
    pub fn new() -> Self {
        Self::with_config(RealmConfig::default())
    }

    /// Fixture with a custom configuration.
    pub fn with_config(config: RealmConfig) -> Self {
        let store = Arc::new(MemoryRealmStore::new());
        let events = Arc::new(MemoryEventBus::new());
        let outbox = Arc::new(MemoryOutbox::new());
        let uploads = Arc::new(MemoryUploadBackend::new());
        let service = RealmService::new(
            store.clone(),
            events.clone(),
            outbox.clone(),
            uploads.clone(),
            config,
        );
        Self {
            store,
            events,
            outbox,
            uploads,
            service,
        }
    }

    /// Create a realm on the given plan with an owner, an admin and a member.
    pub async fn realm_on_plan(&self, subdomain: &str, plan_type: PlanType) -> TestRealm {
        let options = CreateRealmOptions {
            plan_type: Some(plan_type),
            ..CreateRealmOptions::default()
        };
        self.populate(subdomain, options).await
    }

    /// Create a self-hosted realm with an owner, an admin and a member.
    pub async fn realm(&self, subdomain: &str) -> TestRealm {
        self.realm_on_plan(subdomain, PlanType::SelfHosted).await
    }

    /// Create a demo organization whose owner has no delivery email yet.
    pub async fn demo_realm(&self, subdomain: &str) -> TestRealm {
        let options = CreateRealmOptions {
            is_demo_organization: true,
            ..CreateRealmOptions::default()
        };
        let mut test_realm = self.populate(subdomain, options).await;
        let mut owner = test_realm.owner.clone().without_delivery_email();
        owner.email = format!("user{}@{}", owner.id.simple(), subdomain);
        self.store.update_user(&owner).await.unwrap();
        test_realm.owner = owner;
        test_realm
    }

    async fn populate(&self, subdomain: &str, options: CreateRealmOptions) -> TestRealm {
        let realm = self
            .service
            .create_realm(subdomain, &format!("{} org", subdomain), options)
            .await
            .unwrap();
        let owner = self
            .add_user(&realm, "Desdemona", &format!("desdemona@{}.test", subdomain), UserRole::Owner)
            .await;
        let admin = self
            .add_user(&realm, "Iago", &format!("iago@{}.test", subdomain), UserRole::Administrator)
            .await;
        let member = self
            .add_user(&realm, "Hamlet", &format!("hamlet@{}.test", subdomain), UserRole::Member)
            .await;
        TestRealm {
            realm,
            owner,
            admin,
            member,
        }
    }

    /// Add a user to a realm.
    pub async fn add_user(
        &self,
        realm: &Realm,
        name: &str,
        email: &str,
        role: UserRole,
    ) -> UserProfile {
        self.service
            .add_user(UserProfile::new(realm.id, name, email, role))
            .await
            .unwrap()
    }

    /// Reload a realm from the store.
    pub async fn reload(&self, realm_id: Uuid) -> Realm {
        self.service.get_realm(realm_id).await.unwrap()
    }

    /// Audit entries of one type for a realm.
    pub async fn audit_entries(
        &self,
        realm_id: Uuid,
        event_type: AuditLogEventType,
    ) -> Vec<AuditLogEntry> {
        self.store
            .list_audit_log(realm_id)
            .await
            .unwrap()
            .into_iter()
            .filter(|entry| entry.event_type == event_type)
            .collect()
    }
}
