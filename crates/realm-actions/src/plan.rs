//! Plan, organization type and authentication method changes

use realm_events::RealmEvent;
use realm_org::realm::PAID_AUTHENTICATION_METHODS;
use realm_org::{
    GroupSetting, OrgType, PlanType, Realm, RealmError, RealmResult, SystemGroup, UserRole,
};
use serde_json::json;
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::service::RealmService;

impl RealmService {
    /// Number of paid seats: active human users who are not guests.
    pub async fn seat_count(&self, realm_id: Uuid) -> RealmResult<u32> {
        let users = self.store.list_users(realm_id).await?;
        let seats = users
            .iter()
            .filter(|u| u.is_active && !u.is_bot && u.role != UserRole::Guest)
            .count();
        Ok(u32::try_from(seats).unwrap_or(u32::MAX))
    }

    /// Upload quota of a realm in GB (None = unlimited).
    pub async fn upload_quota_gb(&self, realm_id: Uuid) -> RealmResult<Option<u64>> {
        let realm = self.get_realm(realm_id).await?;
        let seats = self.seat_count(realm_id).await?;
        Ok(realm.upload_quota_gb(seats))
    }

    /// Move a realm to another plan and apply that plan's limits.
    pub async fn change_realm_plan_type(
        &self,
        realm_id: Uuid,
        plan_type: PlanType,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        let old_plan = realm.plan_type;
        let seats = self.seat_count(realm_id).await?;
        let limits = plan_type.limits(seats);

        realm.plan_type = plan_type;
        realm.max_invites = self.default_max_invites(plan_type);
        realm.message_visibility_limit = limits.message_visibility_limit;

        if !plan_type.has_plus_features() {
            self.reset_group_setting(
                &mut realm,
                GroupSetting::CanAccessAllUsersGroup,
                SystemGroup::Everyone,
            )
            .await?;
        }

        if plan_type == PlanType::Limited {
            realm.enable_spectator_access = false;
            for method in PAID_AUTHENTICATION_METHODS {
                if let Some(enabled) = realm.authentication_methods.get_mut(*method) {
                    *enabled = false;
                }
            }
        }

        self.save_realm(&realm).await?;
        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmPlanTypeChanged)
                .with_acting_user(acting_user)
                .with_change(None, json!(old_plan.id()), json!(plan_type.id())),
        )
        .await?;

        let mut data = serde_json::Map::new();
        data.insert("plan_type".to_string(), json!(plan_type.id()));
        data.insert(
            "upload_quota_gb".to_string(),
            json!(realm.upload_quota_gb(seats)),
        );
        data.insert("max_invites".to_string(), json!(realm.max_invites));
        self.publish(
            realm.id,
            acting_user,
            RealmEvent::UpdateDict {
                property: "default".to_string(),
                data,
            },
        )
        .await;

        info!(
            realm_id = %realm.id,
            old_plan = old_plan.display_name(),
            new_plan = plan_type.display_name(),
            "Changed realm plan"
        );
        Ok(realm)
    }

    /// Change the organization type.
    pub async fn change_realm_org_type(
        &self,
        realm_id: Uuid,
        org_type: OrgType,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        let old_type = realm.org_type;
        if old_type == org_type {
            return Ok(realm);
        }
        realm.org_type = org_type;
        self.save_realm(&realm).await?;

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmOrgTypeChanged)
                .with_acting_user(acting_user)
                .with_change(None, json!(old_type.id()), json!(org_type.id())),
        )
        .await?;
        self.publish(
            realm.id,
            acting_user,
            RealmEvent::Update {
                property: "org_type".to_string(),
                value: json!(org_type.id()),
            },
        )
        .await;
        Ok(realm)
    }

    /// Set the daily invitation cap; `0` restores the plan default.
    pub async fn change_realm_max_invites(
        &self,
        realm_id: Uuid,
        max_invites: u32,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        let old_value = self.effective_max_invites(&realm);
        let new_value = if max_invites == 0 {
            self.default_max_invites(realm.plan_type)
        } else {
            Some(max_invites)
        };

        realm.max_invites = new_value;
        self.save_realm(&realm).await?;
        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmPropertyChanged)
                .with_acting_user(acting_user)
                .with_change(Some("max_invites"), json!(old_value), json!(new_value)),
        )
        .await?;
        Ok(realm)
    }

    /// Invitation cap a plan starts with; `None` defers to the server default.
    pub fn default_max_invites(&self, plan_type: PlanType) -> Option<u32> {
        match plan_type {
            PlanType::Limited => Some(self.config.invites_default_realm_daily_max),
            other => other.limits(0).max_invites,
        }
    }

    /// Effective daily invitation cap.
    pub fn effective_max_invites(&self, realm: &Realm) -> u32 {
        realm
            .max_invites
            .unwrap_or(self.config.invites_default_realm_daily_max)
    }

    /// Check a requested authentication method map.
    pub fn check_authentication_methods(
        &self,
        realm: &Realm,
        methods: &BTreeMap<String, bool>,
    ) -> RealmResult<()> {
        for name in methods.keys() {
            if !self.config.authentication_backends.iter().any(|b| b == name) {
                return Err(RealmError::InvalidArgument(format!(
                    "Invalid authentication method: {}",
                    name
                )));
            }
        }
        if !methods.values().any(|enabled| *enabled) {
            return Err(RealmError::NoAuthenticationMethods);
        }
        if realm.plan_type == PlanType::Limited
            && methods
                .iter()
                .any(|(name, enabled)| *enabled && PAID_AUTHENTICATION_METHODS.contains(&name.as_str()))
        {
            return Err(RealmError::UpgradeRequired(PlanType::Standard.display_name()));
        }
        Ok(())
    }

    /// Replace the enabled authentication methods.
    ///
    /// Methods missing from `methods` keep their current state.
    pub async fn set_realm_authentication_methods(
        &self,
        realm_id: Uuid,
        methods: BTreeMap<String, bool>,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        let mut updated = realm.authentication_methods.clone();
        updated.extend(methods);
        self.check_authentication_methods(&realm, &updated)?;
        if updated == realm.authentication_methods {
            return Ok(realm);
        }

        let old_value = json!(realm.authentication_methods);
        realm.authentication_methods = updated;
        self.save_realm(&realm).await?;

        let new_value = json!(realm.authentication_methods);
        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmAuthenticationMethodsChanged)
                .with_acting_user(acting_user)
                .with_change(Some("authentication_methods"), old_value, new_value.clone()),
        )
        .await?;

        let mut data = serde_json::Map::new();
        data.insert("authentication_methods".to_string(), new_value);
        self.publish(
            realm.id,
            acting_user,
            RealmEvent::UpdateDict {
                property: "default".to_string(),
                data,
            },
        )
        .await;
        Ok(realm)
    }
}
