//! Permission-group setting updates
//!
//! A group setting update is checked in this order: the target group must
//! exist, the realm's plan must allow the value, owner-only settings need an
//! owner, a compare-and-set `old` value must match, and finally the group
//! kind must be acceptable for the setting.

use realm_events::RealmEvent;
use realm_org::groups::{PlanGate, LIMITED_PLAN_GROUPS};
use realm_org::{
    AnonymousGroup, GroupSetting, GroupSettingUpdate, GroupSettingValue, PlanType, Realm,
    RealmError, RealmResult, SystemGroup, UserGroup, UserProfile,
};
use serde_json::json;
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::service::RealmService;

/// A validated group setting change, ready to apply.
#[derive(Debug, Clone)]
pub struct GroupSettingChange {
    pub setting: GroupSetting,
    target: GroupTarget,
    old_value: GroupSettingValue,
    new_value: GroupSettingValue,
}

#[derive(Debug, Clone)]
enum GroupTarget {
    Existing(Uuid),
    NewAnonymous(UserGroup),
}

/// A resolved setting value: the value plus the named group, if any.
struct Resolved {
    value: GroupSettingValue,
    named: Option<UserGroup>,
}

impl RealmService {
    /// Current value of a realm's group setting.
    pub async fn group_setting_value(
        &self,
        realm: &Realm,
        setting: GroupSetting,
    ) -> RealmResult<GroupSettingValue> {
        let group_id = realm
            .group_setting(setting)
            .ok_or_else(|| RealmError::NotFound(format!("Setting {}", setting.name())))?;
        let group = self
            .store
            .get_group(group_id)
            .await?
            .ok_or_else(|| RealmError::InvalidUserGroup(group_id.to_string()))?;
        Ok(value_of(&group))
    }

    /// Validate a group setting update.
    ///
    /// Returns `None` when the setting already has the requested value.
    pub async fn prepare_group_setting_change(
        &self,
        realm: &Realm,
        actor: &UserProfile,
        setting: GroupSetting,
        update: &GroupSettingUpdate,
    ) -> RealmResult<Option<GroupSettingChange>> {
        let config = setting.config();
        let resolved = self.resolve_group_value(realm, update.new.clone()).await?;

        self.check_group_plan_gate(realm, setting, &resolved)?;

        if config.owner_only && !actor.role.is_owner() {
            return Err(RealmError::MustBeOwner);
        }

        let current = self.group_setting_value(realm, setting).await?;
        if let Some(old) = &update.old {
            let expected = self.resolve_group_value(realm, old.clone()).await?;
            if normalized(&expected.value) != normalized(&current) {
                return Err(RealmError::StaleGroupSetting);
            }
        }

        match (&resolved.named, &resolved.value) {
            (Some(group), _) => match group.system_group() {
                Some(kind) => setting.check_system_group(kind)?,
                None if config.require_system_group => {
                    return Err(RealmError::SystemGroupRequired(setting.name().to_string()))
                }
                None => {}
            },
            (None, GroupSettingValue::Anonymous(anonymous)) => {
                if config.require_system_group {
                    return Err(RealmError::SystemGroupRequired(setting.name().to_string()));
                }
                for subgroup_id in &anonymous.direct_subgroups {
                    let kind = self
                        .store
                        .get_group(*subgroup_id)
                        .await?
                        .and_then(|g| g.system_group());
                    if let Some(kind) = kind {
                        setting.check_system_group(kind)?;
                    }
                }
            }
            (None, GroupSettingValue::Named(id)) => {
                return Err(RealmError::InvalidUserGroup(id.to_string()))
            }
        }

        if normalized(&resolved.value) == normalized(&current) {
            return Ok(None);
        }

        let target = match (&resolved.named, &resolved.value) {
            (Some(group), _) => GroupTarget::Existing(group.id),
            (None, GroupSettingValue::Anonymous(anonymous)) => GroupTarget::NewAnonymous(
                UserGroup::anonymous(realm.id, &anonymous.direct_members, &anonymous.direct_subgroups),
            ),
            (None, GroupSettingValue::Named(id)) => GroupTarget::Existing(*id),
        };

        Ok(Some(GroupSettingChange {
            setting,
            target,
            old_value: current,
            new_value: resolved.value,
        }))
    }

    /// Point the setting at its new group in memory, creating an anonymous
    /// group if needed. The caller saves the realm.
    pub(crate) async fn apply_group_setting_change(
        &self,
        realm: &mut Realm,
        change: &GroupSettingChange,
    ) -> RealmResult<()> {
        let group_id = match &change.target {
            GroupTarget::Existing(id) => *id,
            GroupTarget::NewAnonymous(group) => {
                self.store.insert_group(group.clone()).await?;
                group.id
            }
        };
        realm.group_settings.insert(change.setting, group_id);
        Ok(())
    }

    /// Audit and announce an applied group setting change.
    pub(crate) async fn record_group_setting_change(
        &self,
        realm: &Realm,
        acting_user: Option<Uuid>,
        change: &GroupSettingChange,
    ) -> RealmResult<()> {
        let old_value = serde_json::to_value(&change.old_value)
            .map_err(|e| RealmError::Internal(e.to_string()))?;
        let new_value = serde_json::to_value(&change.new_value)
            .map_err(|e| RealmError::Internal(e.to_string()))?;

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmPropertyChanged)
                .with_acting_user(acting_user)
                .with_change(Some(change.setting.name()), old_value, new_value.clone()),
        )
        .await?;

        let mut data = serde_json::Map::new();
        data.insert(change.setting.name().to_string(), new_value);
        self.publish(
            realm.id,
            acting_user,
            RealmEvent::UpdateDict {
                property: "default".to_string(),
                data,
            },
        )
        .await;
        Ok(())
    }

    /// Change one group setting on behalf of a user.
    pub async fn update_realm_group_setting(
        &self,
        realm_id: Uuid,
        acting_user_id: Uuid,
        setting: GroupSetting,
        update: GroupSettingUpdate,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        let actor = self.require_admin(&realm, acting_user_id).await?;

        if let Some(change) = self
            .prepare_group_setting_change(&realm, &actor, setting, &update)
            .await?
        {
            self.apply_group_setting_change(&mut realm, &change).await?;
            self.save_realm(&realm).await?;
            self.record_group_setting_change(&realm, Some(actor.id), &change)
                .await?;
        }
        Ok(realm)
    }

    /// Point a group setting at one of the realm's system groups, bypassing
    /// permission and plan checks.
    pub(crate) async fn reset_group_setting(
        &self,
        realm: &mut Realm,
        setting: GroupSetting,
        group: SystemGroup,
    ) -> RealmResult<bool> {
        let group_id = self.system_group_id(realm.id, group).await?;
        Ok(realm.group_settings.insert(setting, group_id) != Some(group_id))
    }

    async fn resolve_group_value(
        &self,
        realm: &Realm,
        value: GroupSettingValue,
    ) -> RealmResult<Resolved> {
        let value = if value.is_empty_anonymous() {
            GroupSettingValue::Named(self.system_group_id(realm.id, SystemGroup::Nobody).await?)
        } else {
            value.simplify()
        };

        match &value {
            GroupSettingValue::Named(id) => {
                let group = self.realm_group(realm, *id).await?;
                if group.is_anonymous() {
                    // Anonymous groups are only reachable by their contents
                    return Err(RealmError::InvalidUserGroup(id.to_string()));
                }
                Ok(Resolved {
                    value,
                    named: Some(group),
                })
            }
            GroupSettingValue::Anonymous(anonymous) => {
                for user_id in &anonymous.direct_members {
                    let user = self.store.get_user(*user_id).await?;
                    if user.map(|u| u.realm_id) != Some(realm.id) {
                        return Err(RealmError::InvalidArgument(format!(
                            "Invalid user ID: {}",
                            user_id
                        )));
                    }
                }
                for subgroup_id in &anonymous.direct_subgroups {
                    self.realm_group(realm, *subgroup_id).await?;
                }
                Ok(Resolved { value, named: None })
            }
        }
    }

    async fn realm_group(&self, realm: &Realm, group_id: Uuid) -> RealmResult<UserGroup> {
        match self.store.get_group(group_id).await? {
            Some(group) if group.realm_id == realm.id => Ok(group),
            _ => Err(RealmError::InvalidUserGroup(group_id.to_string())),
        }
    }

    fn check_group_plan_gate(
        &self,
        realm: &Realm,
        setting: GroupSetting,
        resolved: &Resolved,
    ) -> RealmResult<()> {
        let named_system_group = resolved.named.as_ref().and_then(|g| g.system_group());
        match setting.config().plan_gate {
            PlanGate::None => Ok(()),
            PlanGate::Standard if realm.plan_type == PlanType::Limited => {
                match named_system_group {
                    Some(kind) if LIMITED_PLAN_GROUPS.contains(&kind) => Ok(()),
                    _ => Err(RealmError::UpgradeRequired(PlanType::Standard.display_name())),
                }
            }
            PlanGate::Standard => Ok(()),
            PlanGate::Plus if !realm.plan_type.has_plus_features() => {
                if named_system_group == Some(SystemGroup::Everyone) {
                    Ok(())
                } else {
                    Err(RealmError::UpgradeRequired(PlanType::Plus.display_name()))
                }
            }
            PlanGate::Plus => Ok(()),
        }
    }
}

fn value_of(group: &UserGroup) -> GroupSettingValue {
    if group.is_anonymous() {
        GroupSettingValue::Anonymous(AnonymousGroup {
            direct_members: group.direct_members.iter().copied().collect(),
            direct_subgroups: group.direct_subgroups.iter().copied().collect(),
        })
    } else {
        GroupSettingValue::Named(group.id)
    }
}

/// Order-insensitive form for comparisons.
fn normalized(value: &GroupSettingValue) -> serde_json::Value {
    match value.clone().simplify() {
        GroupSettingValue::Named(id) => json!(id),
        GroupSettingValue::Anonymous(mut anonymous) => {
            anonymous.direct_members.sort();
            anonymous.direct_members.dedup();
            anonymous.direct_subgroups.sort();
            anonymous.direct_subgroups.dedup();
            json!({
                "direct_members": anonymous.direct_members,
                "direct_subgroups": anonymous.direct_subgroups,
            })
        }
    }
}
