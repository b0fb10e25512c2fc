//! Realm creation

use chrono::{DateTime, Utc};
use realm_org::realm::PAID_AUTHENTICATION_METHODS;
use realm_org::settings::check_subdomain_format;
use realm_org::{
    GroupSetting, OrgType, PlanType, Realm, RealmError, RealmResult, RealmUserDefault, Stream,
    SystemGroup, UserGroup,
};
use serde_json::json;
use tracing::info;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::service::{days_after, RealmService};

/// Name of the channel every new realm starts with.
pub const DEFAULT_CHANNEL_NAME: &str = "general";

/// Optional settings for a new realm.
#[derive(Debug, Clone, Default)]
pub struct CreateRealmOptions {
    pub plan_type: Option<PlanType>,
    pub org_type: Option<OrgType>,
    pub description: Option<String>,
    pub invite_required: Option<bool>,
    pub emails_restricted_to_domains: Option<bool>,
    pub enable_read_receipts: Option<bool>,
    pub enable_spectator_access: Option<bool>,
    pub date_created: Option<DateTime<Utc>>,
    /// Create a demo organization that expires after the configured deadline
    pub is_demo_organization: bool,
}

impl RealmService {
    /// Check a subdomain's format.
    ///
    /// The empty subdomain names the realm on the root domain, which only
    /// exists when the root domain is not a landing page.
    pub fn check_subdomain_name(&self, subdomain: &str) -> RealmResult<()> {
        if !subdomain.is_empty() {
            return check_subdomain_format(subdomain);
        }
        if self.config.root_domain_landing_page {
            return Err(RealmError::SubdomainUnavailable);
        }
        Ok(())
    }

    /// Check that a subdomain can be given to a realm.
    pub async fn check_subdomain_available(&self, subdomain: &str) -> RealmResult<()> {
        self.check_subdomain_name(subdomain)?;
        if self.config.is_reserved_subdomain(subdomain) {
            return Err(RealmError::SubdomainReserved);
        }
        if self.store.get_realm_by_string_id(subdomain).await?.is_some() {
            return Err(RealmError::SubdomainUnavailable);
        }
        Ok(())
    }

    /// Create a realm with its system groups, default channel and defaults.
    ///
    /// The internal realm is created first if the server has none yet.
    pub async fn create_realm(
        &self,
        string_id: &str,
        name: &str,
        options: CreateRealmOptions,
    ) -> RealmResult<Realm> {
        self.check_subdomain_available(string_id).await?;

        let system_bot_realm = self.config.system_bot_realm.clone();
        if string_id != system_bot_realm
            && self
                .store
                .get_realm_by_string_id(&system_bot_realm)
                .await?
                .is_none()
        {
            info!("Server not yet initialized. Creating the internal realm first.");
            let internal = CreateRealmOptions {
                plan_type: Some(PlanType::SelfHosted),
                ..CreateRealmOptions::default()
            };
            self.insert_new_realm(&system_bot_realm, "System bot realm", internal)
                .await?;
        }

        self.insert_new_realm(string_id, name, options).await
    }

    async fn insert_new_realm(
        &self,
        string_id: &str,
        name: &str,
        options: CreateRealmOptions,
    ) -> RealmResult<Realm> {
        if options.enable_spectator_access == Some(true)
            && matches!(options.plan_type, None | Some(PlanType::Limited))
        {
            return Err(RealmError::InvalidArgument(
                "Realms with spectator access must not be on the Limited plan".to_string(),
            ));
        }

        let plan_type = options.plan_type.unwrap_or(if self.config.billing_enabled {
            PlanType::Limited
        } else {
            PlanType::SelfHosted
        });

        let mut realm = Realm::new(string_id, name, plan_type);
        if let Some(date_created) = options.date_created {
            realm.date_created = date_created;
        }
        if let Some(org_type) = options.org_type {
            realm.org_type = org_type;
        }
        if let Some(description) = options.description {
            realm.description = description;
        }
        if let Some(invite_required) = options.invite_required {
            realm.invite_required = invite_required;
        }
        if let Some(restricted) = options.emails_restricted_to_domains {
            realm.emails_restricted_to_domains = restricted;
        }
        if let Some(read_receipts) = options.enable_read_receipts {
            realm.enable_read_receipts = read_receipts;
        }
        if let Some(spectators) = options.enable_spectator_access {
            realm.enable_spectator_access = spectators;
        }
        if options.is_demo_organization {
            realm.demo_organization_scheduled_deletion_date = Some(days_after(
                realm.date_created,
                self.config.demo_org_deadline_days,
                "demo organization deadline",
            )?);
        }

        let limits = plan_type.limits(0);
        realm.max_invites = self.default_max_invites(plan_type);
        realm.message_visibility_limit = limits.message_visibility_limit;

        realm.authentication_methods = self
            .config
            .authentication_backends
            .iter()
            .map(|backend| {
                let paid = PAID_AUTHENTICATION_METHODS.contains(&backend.as_str());
                (backend.clone(), !(paid && plan_type == PlanType::Limited))
            })
            .collect();

        let is_education = realm.org_type.is_education();
        let groups: Vec<UserGroup> = SystemGroup::ALL
            .into_iter()
            .map(|kind| UserGroup::system(realm.id, kind))
            .collect();
        for setting in GroupSetting::ALL {
            let default = setting.default_group(is_education);
            if let Some(group) = groups.iter().find(|g| g.system_group() == Some(default)) {
                realm.group_settings.insert(setting, group.id);
            }
        }

        let general = Stream::new(realm.id, DEFAULT_CHANNEL_NAME);
        realm.new_stream_announcements_stream = Some(general.id);

        self.store.insert_realm(realm.clone()).await?;
        for group in groups {
            self.store.insert_group(group).await?;
        }
        self.store.insert_stream(general).await?;
        self.store
            .save_user_defaults(&RealmUserDefault::new(realm.id))
            .await?;

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmCreated)
                .at(realm.date_created)
                .with_extra("plan_type", json!(plan_type.id()))
                .with_extra("org_type", json!(realm.org_type.id())),
        )
        .await?;

        info!(realm_id = %realm.id, string_id = %realm.string_id, "Created realm");
        Ok(realm)
    }
}
