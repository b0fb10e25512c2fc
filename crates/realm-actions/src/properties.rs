//! Realm property updates
//!
//! `update_realm` is the settings PATCH: it validates every parameter before
//! changing anything, then applies the changes one by one, each with its own
//! audit entry and event.

use realm_events::RealmEvent;
use realm_org::groups::PlanGate;
use realm_org::settings::VideoChatProvider;
use realm_org::{
    GroupSetting, GroupSettingUpdate, PlanType, PropertyValue, Realm, RealmError, RealmProperty,
    RealmResult, UserProfile, UserRole,
};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::info;
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::groups::GroupSettingChange;
use crate::service::RealmService;

/// Result of a settings PATCH.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UpdateRealmResponse {
    /// New realm URL, when the subdomain changed
    #[serde(skip_serializing_if = "Option::is_none")]
    pub realm_url: Option<String>,

    /// Parameters that were not recognized
    #[serde(skip_serializing_if = "Vec::is_empty", default)]
    pub ignored_parameters_unsupported: Vec<String>,
}

/// Everything a PATCH will change, collected before anything is applied.
#[derive(Debug, Default)]
struct PendingUpdate {
    properties: Vec<(RealmProperty, PropertyValue)>,
    group_settings: Vec<GroupSettingChange>,
    authentication_methods: Option<BTreeMap<String, bool>>,
    new_subdomain: Option<String>,
    ignored: Vec<String>,
}

impl RealmService {
    /// Apply a settings PATCH on behalf of `acting_user_id`.
    ///
    /// Nothing is changed unless every parameter is valid. Unknown
    /// parameters are reported back rather than rejected.
    pub async fn update_realm(
        &self,
        realm_id: Uuid,
        acting_user_id: Uuid,
        params: &Map<String, Value>,
    ) -> RealmResult<UpdateRealmResponse> {
        let realm = self.get_realm(realm_id).await?;
        let actor = self.require_admin(&realm, acting_user_id).await?;

        let mut pending = PendingUpdate::default();
        for (key, raw) in params {
            if key == "string_id" {
                let subdomain = raw.as_str().ok_or_else(|| RealmError::WrongType {
                    field: "string_id".to_string(),
                    expected: "a string",
                })?;
                self.check_demo_organization_conversion(&realm, &actor, subdomain)
                    .await?;
                pending.new_subdomain = Some(subdomain.to_string());
            } else if key == "authentication_methods" {
                if !actor.role.is_owner() {
                    return Err(RealmError::MustBeOwner);
                }
                let methods: BTreeMap<String, bool> = serde_json::from_value(raw.clone())
                    .map_err(|_| RealmError::Invalid("authentication_methods".to_string()))?;
                let mut merged = realm.authentication_methods.clone();
                merged.extend(methods.clone());
                self.check_authentication_methods(&realm, &merged)?;
                pending.authentication_methods = Some(methods);
            } else if let Some(setting) = GroupSetting::parse(key) {
                let update: GroupSettingUpdate = serde_json::from_value(raw.clone())
                    .map_err(|_| RealmError::Invalid(setting.name().to_string()))?;
                if let Some(change) = self
                    .prepare_group_setting_change(&realm, &actor, setting, &update)
                    .await?
                {
                    pending.group_settings.push(change);
                }
            } else if let Some(property) = RealmProperty::from_api_name(key) {
                if let Some(value) = self
                    .validate_property_change(&realm, &actor, property, raw)
                    .await?
                {
                    pending.properties.push((property, value));
                }
            } else {
                pending.ignored.push(key.clone());
            }
        }

        self.apply_pending_update(realm, actor, pending).await
    }

    async fn apply_pending_update(
        &self,
        mut realm: Realm,
        actor: UserProfile,
        pending: PendingUpdate,
    ) -> RealmResult<UpdateRealmResponse> {
        let acting_user = Some(actor.id);

        for (property, value) in pending.properties {
            self.apply_realm_property(&mut realm, property, value, acting_user)
                .await?;
        }

        if !pending.group_settings.is_empty() {
            for change in &pending.group_settings {
                self.apply_group_setting_change(&mut realm, change).await?;
            }
            self.save_realm(&realm).await?;
            for change in &pending.group_settings {
                self.record_group_setting_change(&realm, acting_user, change)
                    .await?;
            }
        }

        if let Some(methods) = pending.authentication_methods {
            realm = self
                .set_realm_authentication_methods(realm.id, methods, acting_user)
                .await?;
        }

        let mut realm_url = None;
        if let Some(subdomain) = pending.new_subdomain {
            realm.demo_organization_scheduled_deletion_date = None;
            self.save_realm(&realm).await?;
            let renamed = self
                .change_realm_subdomain(realm.id, &subdomain, acting_user, false)
                .await?;
            info!(realm_id = %renamed.id, "Converted demo organization");
            realm_url = Some(renamed.url(&self.config.external_host));
        }

        Ok(UpdateRealmResponse {
            realm_url,
            ignored_parameters_unsupported: pending.ignored,
        })
    }

    /// Validate one property for a PATCH.
    ///
    /// Returns `None` when the property already has the requested value.
    pub async fn validate_property_change(
        &self,
        realm: &Realm,
        actor: &UserProfile,
        property: RealmProperty,
        raw: &Value,
    ) -> RealmResult<Option<PropertyValue>> {
        let spec = property.spec();
        if spec.required_role == UserRole::Owner && !actor.role.is_owner() {
            return Err(RealmError::MustBeOwner);
        }

        // Turning a gated feature off is always allowed
        if spec.plan_gate == PlanGate::Standard
            && realm.plan_type == PlanType::Limited
            && *raw != Value::Bool(false)
        {
            return Err(RealmError::UpgradeRequired(PlanType::Standard.display_name()));
        }

        let value = property.validate(raw)?;

        match &value {
            PropertyValue::Channel(Some(stream_id)) => {
                let stream = match self.store.get_stream(*stream_id).await? {
                    Some(stream) if stream.realm_id == realm.id && !stream.deactivated => stream,
                    _ => return Err(RealmError::InvalidChannel),
                };
                if property == RealmProperty::ModerationRequestChannel && !stream.is_private() {
                    return Err(RealmError::ModerationChannelNotPrivate);
                }
            }
            PropertyValue::VideoChatProvider(provider) => {
                if !self.video_chat_provider_available(*provider) {
                    return Err(RealmError::invalid_id(property.name(), provider.id()));
                }
            }
            PropertyValue::Bool(false)
                if property == RealmProperty::InviteRequired
                    && realm.is_demo_organization()
                    && !actor.has_delivery_email() =>
            {
                return Err(RealmError::OwnerEmailRequired);
            }
            _ => {}
        }

        if realm.property(property) == property_wire_value(realm, property, &value) {
            return Ok(None);
        }
        Ok(Some(value))
    }

    /// Set a property without permission checks.
    ///
    /// Used by server-side jobs and other actions; the PATCH path validates
    /// first and then comes through here too.
    pub async fn set_realm_property(
        &self,
        realm_id: Uuid,
        property: RealmProperty,
        value: PropertyValue,
        acting_user: Option<Uuid>,
    ) -> RealmResult<Realm> {
        let mut realm = self.get_realm(realm_id).await?;
        self.apply_realm_property(&mut realm, property, value, acting_user)
            .await?;
        Ok(realm)
    }

    pub(crate) async fn apply_realm_property(
        &self,
        realm: &mut Realm,
        property: RealmProperty,
        value: PropertyValue,
        acting_user: Option<Uuid>,
    ) -> RealmResult<()> {
        if property == RealmProperty::OrgType {
            if let PropertyValue::OrgType(org_type) = value {
                *realm = self.change_realm_org_type(realm.id, org_type, acting_user).await?;
                return Ok(());
            }
        }

        let old_value = realm.property(property);
        if !realm.set_property(property, value) {
            return Err(RealmError::Internal(format!(
                "Value does not fit property {}",
                property.name()
            )));
        }
        let new_value = realm.property(property);
        if old_value == new_value {
            return Ok(());
        }

        self.save_realm(realm).await?;
        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmPropertyChanged)
                .with_acting_user(acting_user)
                .with_change(Some(property.name()), old_value, new_value.clone()),
        )
        .await?;
        self.publish(
            realm.id,
            acting_user,
            RealmEvent::Update {
                property: property.name().to_string(),
                value: new_value,
            },
        )
        .await;

        if property == RealmProperty::WaitingPeriodThreshold {
            self.sync_system_groups(realm, chrono::Utc::now()).await?;
        }
        Ok(())
    }

    async fn check_demo_organization_conversion(
        &self,
        realm: &Realm,
        actor: &UserProfile,
        subdomain: &str,
    ) -> RealmResult<()> {
        if !actor.role.is_owner() {
            return Err(RealmError::MustBeOwner);
        }
        if !realm.is_demo_organization() {
            return Err(RealmError::NotDemoOrganization);
        }
        if !actor.has_delivery_email() {
            return Err(RealmError::OwnerEmailRequired);
        }
        self.check_subdomain_available(subdomain).await
    }

    fn video_chat_provider_available(&self, provider: VideoChatProvider) -> bool {
        match provider {
            VideoChatProvider::Disabled | VideoChatProvider::JitsiMeet => true,
            VideoChatProvider::Zoom => self.config.zoom_configured,
            VideoChatProvider::ZoomServerToServer => self.config.zoom_server_to_server_configured,
            VideoChatProvider::BigBlueButton => self.config.big_blue_button_configured,
        }
    }
}

/// Wire form a validated value would have once stored.
fn property_wire_value(realm: &Realm, property: RealmProperty, value: &PropertyValue) -> Value {
    let mut scratch = realm.clone();
    scratch.set_property(property, value.clone());
    scratch.property(property)
}
