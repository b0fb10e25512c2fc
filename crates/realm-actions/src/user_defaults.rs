//! Realm-wide defaults for new users' settings

use realm_events::RealmEvent;
use realm_org::user_defaults::user_default_spec;
use realm_org::{RealmError, RealmResult, RealmUserDefault};
use serde_json::{json, Map, Value};
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::service::RealmService;

impl RealmService {
    /// Current defaults of a realm.
    pub async fn realm_user_defaults(&self, realm_id: Uuid) -> RealmResult<RealmUserDefault> {
        self.store
            .get_user_defaults(realm_id)
            .await?
            .ok_or_else(|| RealmError::NotFound(format!("User defaults of realm {}", realm_id)))
    }

    /// Change one default, skipping unchanged values.
    pub async fn set_realm_user_default_setting(
        &self,
        realm_id: Uuid,
        name: &str,
        raw: &Value,
        acting_user: Option<Uuid>,
    ) -> RealmResult<RealmUserDefault> {
        let spec = user_default_spec(name)
            .ok_or_else(|| RealmError::InvalidArgument(format!("Unknown setting: {}", name)))?;
        let value = spec.validate(raw)?;

        let mut defaults = self.realm_user_defaults(realm_id).await?;
        if defaults.get(name) == Some(&value) {
            return Ok(defaults);
        }
        let old_value = defaults.set(name, value.clone()).unwrap_or(Value::Null);
        self.store.save_user_defaults(&defaults).await?;

        self.audit(
            AuditLogEntry::new(realm_id, AuditLogEventType::RealmDefaultUserSettingsChanged)
                .with_acting_user(acting_user)
                .with_extra("property", json!(name))
                .with_extra("old_value", old_value)
                .with_extra("new_value", value.clone()),
        )
        .await?;
        self.publish(
            realm_id,
            acting_user,
            RealmEvent::UserSettingsDefaultsUpdate {
                property: name.to_string(),
                value,
            },
        )
        .await;
        Ok(defaults)
    }

    /// PATCH of the realm's user defaults by an administrator.
    ///
    /// Every value is validated before any is stored. Returns the names of
    /// unknown parameters, which are ignored.
    pub async fn update_realm_user_settings_defaults(
        &self,
        realm_id: Uuid,
        acting_user_id: Uuid,
        params: &Map<String, Value>,
    ) -> RealmResult<Vec<String>> {
        let realm = self.get_realm(realm_id).await?;
        let actor = self.require_admin(&realm, acting_user_id).await?;

        let mut ignored = Vec::new();
        let mut valid = Vec::new();
        for (name, raw) in params {
            match user_default_spec(name) {
                Some(spec) => valid.push((name.as_str(), spec.validate(raw)?)),
                None => ignored.push(name.clone()),
            }
        }

        for (name, value) in valid {
            self.set_realm_user_default_setting(realm.id, name, &value, Some(actor.id))
                .await?;
        }
        Ok(ignored)
    }
}
