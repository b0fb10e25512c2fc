//! Realm-wide defaults for new users' personal settings
//!
//! Each realm has one `RealmUserDefault` row. Administrators edit it; new
//! accounts copy it. Values are kept by setting name so that the catalogue
//! below is the single place that knows each setting's shape.

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::error::{RealmError, RealmResult};

/// Longest allowed email notification batching period (one week).
pub const MAX_EMAIL_BATCHING_PERIOD_SECONDS: i64 = 7 * 24 * 60 * 60;

/// Emoji sets users can pick.
pub const EMOJISETS: &[&str] = &["google", "twitter", "text", "google-blob"];

/// Notification sounds shipped with the application.
pub const NOTIFICATION_SOUNDS: &[&str] = &[
    "zulip",
    "ding",
    "chime",
    "chirp",
    "clink",
    "ping",
    "retro",
    "sparkle",
    "none",
];

/// Shape of a user default setting.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UserDefaultKind {
    Bool,
    IntRange { min: i64, max: i64 },
    IntChoice(&'static [i64]),
    StrChoice(&'static [&'static str]),
    Emojiset,
    NotificationSound,
    BatchingPeriod,
}

/// Catalogue entry: setting name, shape and default value.
#[derive(Debug, Clone, Copy)]
pub struct UserDefaultSpec {
    pub name: &'static str,
    pub kind: UserDefaultKind,
    default: DefaultValue,
}

#[derive(Debug, Clone, Copy)]
enum DefaultValue {
    Bool(bool),
    Int(i64),
    Str(&'static str),
}

impl UserDefaultSpec {
    const fn new(name: &'static str, kind: UserDefaultKind, default: DefaultValue) -> Self {
        Self {
            name,
            kind,
            default,
        }
    }

    /// Default value in wire form.
    pub fn default_value(&self) -> Value {
        match self.default {
            DefaultValue::Bool(b) => json!(b),
            DefaultValue::Int(n) => json!(n),
            DefaultValue::Str(s) => json!(s),
        }
    }

    /// Validate a raw client value.
    pub fn validate(&self, raw: &Value) -> RealmResult<Value> {
        let name = self.name;
        match self.kind {
            UserDefaultKind::Bool => raw
                .as_bool()
                .map(Value::Bool)
                .ok_or_else(|| RealmError::WrongType {
                    field: name.to_string(),
                    expected: "a boolean",
                }),
            UserDefaultKind::IntRange { min, max } => {
                let n = raw.as_i64().ok_or_else(|| RealmError::WrongType {
                    field: name.to_string(),
                    expected: "an integer",
                })?;
                if !(min..=max).contains(&n) {
                    return Err(RealmError::bad_value(name, n));
                }
                Ok(json!(n))
            }
            UserDefaultKind::IntChoice(choices) => raw
                .as_i64()
                .filter(|n| choices.contains(n))
                .map(|n| json!(n))
                .ok_or_else(|| RealmError::Invalid(name.to_string())),
            UserDefaultKind::StrChoice(choices) => raw
                .as_str()
                .filter(|s| choices.contains(s))
                .map(|s| json!(s))
                .ok_or_else(|| RealmError::Invalid(name.to_string())),
            UserDefaultKind::Emojiset => raw
                .as_str()
                .filter(|s| EMOJISETS.contains(s))
                .map(|s| json!(s))
                .ok_or_else(|| RealmError::NotAChoice(name.to_string())),
            UserDefaultKind::NotificationSound => {
                let s = raw.as_str().unwrap_or_default();
                if NOTIFICATION_SOUNDS.contains(&s) {
                    Ok(json!(s))
                } else {
                    Err(RealmError::InvalidNotificationSound(s.to_string()))
                }
            }
            UserDefaultKind::BatchingPeriod => {
                let n = raw.as_i64().ok_or_else(|| RealmError::WrongType {
                    field: name.to_string(),
                    expected: "an integer",
                })?;
                if n <= 0 || n > MAX_EMAIL_BATCHING_PERIOD_SECONDS {
                    return Err(RealmError::InvalidBatchingPeriod(n));
                }
                Ok(json!(n))
            }
        }
    }
}

use DefaultValue::{Bool as B, Int as I, Str as S};
use UserDefaultKind as K;

/// Every user default setting.
pub const USER_DEFAULT_SETTINGS: &[UserDefaultSpec] = &[
    UserDefaultSpec::new("web_font_size_px", K::IntRange { min: 12, max: 20 }, I(16)),
    UserDefaultSpec::new("web_line_height_percent", K::IntRange { min: 122, max: 158 }, I(140)),
    UserDefaultSpec::new("color_scheme", K::IntChoice(&[1, 2, 3]), I(1)),
    UserDefaultSpec::new(
        "web_home_view",
        K::StrChoice(&["recent_topics", "inbox", "all_messages"]),
        S("inbox"),
    ),
    UserDefaultSpec::new("emojiset", K::Emojiset, S("google")),
    UserDefaultSpec::new("demote_inactive_streams", K::IntChoice(&[1, 2, 3]), I(1)),
    UserDefaultSpec::new("user_list_style", K::IntChoice(&[1, 2, 3]), I(2)),
    UserDefaultSpec::new(
        "web_animate_image_previews",
        K::StrChoice(&["always", "on_hover", "never"]),
        S("on_hover"),
    ),
    UserDefaultSpec::new("notification_sound", K::NotificationSound, S("zulip")),
    UserDefaultSpec::new(
        "email_notifications_batching_period_seconds",
        K::BatchingPeriod,
        I(120),
    ),
    UserDefaultSpec::new("email_address_visibility", K::IntChoice(&[1, 2, 3, 4, 5]), I(1)),
    UserDefaultSpec::new(
        "automatically_follow_topics_policy",
        K::IntChoice(&[1, 2, 3, 4]),
        I(3),
    ),
    UserDefaultSpec::new(
        "resolved_topic_notice_auto_read_policy",
        K::StrChoice(&["always", "except_followed", "never"]),
        S("except_followed"),
    ),
    UserDefaultSpec::new("enter_sends", K::Bool, B(false)),
    UserDefaultSpec::new("starred_message_counts", K::Bool, B(true)),
    UserDefaultSpec::new("twenty_four_hour_time", K::Bool, B(false)),
    UserDefaultSpec::new("fluid_layout_width", K::Bool, B(false)),
    UserDefaultSpec::new("high_contrast_mode", K::Bool, B(false)),
    UserDefaultSpec::new("translate_emoticons", K::Bool, B(false)),
    UserDefaultSpec::new("display_emoji_reaction_users", K::Bool, B(true)),
    UserDefaultSpec::new("enable_desktop_notifications", K::Bool, B(true)),
    UserDefaultSpec::new("enable_sounds", K::Bool, B(true)),
    UserDefaultSpec::new("enable_offline_email_notifications", K::Bool, B(true)),
    UserDefaultSpec::new("enable_digest_emails", K::Bool, B(true)),
    UserDefaultSpec::new("send_read_receipts", K::Bool, B(true)),
    UserDefaultSpec::new("presence_enabled", K::Bool, B(true)),
    UserDefaultSpec::new("automatically_follow_topics_where_mentioned", K::Bool, B(true)),
];

/// Look up a user default setting by name.
pub fn user_default_spec(name: &str) -> Option<&'static UserDefaultSpec> {
    USER_DEFAULT_SETTINGS.iter().find(|spec| spec.name == name)
}

/// Realm-wide defaults for new users.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmUserDefault {
    /// Realm the defaults belong to
    pub realm_id: Uuid,

    /// Current value of each setting
    pub values: BTreeMap<String, Value>,
}

impl RealmUserDefault {
    /// Create the defaults row for a realm.
    pub fn new(realm_id: Uuid) -> Self {
        let values = USER_DEFAULT_SETTINGS
            .iter()
            .map(|spec| (spec.name.to_string(), spec.default_value()))
            .collect();
        Self { realm_id, values }
    }

    /// Current value of a setting.
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Store an already validated value, returning the previous one.
    pub fn set(&mut self, name: &str, value: Value) -> Option<Value> {
        self.values.insert(name.to_string(), value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_cover_catalogue() {
        let defaults = RealmUserDefault::new(Uuid::now_v7());
        assert_eq!(defaults.values.len(), USER_DEFAULT_SETTINGS.len());
        assert_eq!(defaults.get("emojiset"), Some(&json!("google")));
        for spec in USER_DEFAULT_SETTINGS {
            let value = defaults.get(spec.name).cloned().unwrap();
            assert!(spec.validate(&value).is_ok(), "default of {} invalid", spec.name);
        }
    }

    #[test]
    fn test_notification_sound() {
        let spec = user_default_spec("notification_sound").unwrap();
        let err = spec.validate(&json!("invalid")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid notification sound 'invalid'");
        assert_eq!(spec.validate(&json!("ding")).unwrap(), json!("ding"));
    }

    #[test]
    fn test_batching_period() {
        let spec = user_default_spec("email_notifications_batching_period_seconds").unwrap();
        let err = spec.validate(&json!(-1)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email batching period: -1 seconds");

        let err = spec.validate(&json!(7 * 24 * 60 * 60 + 10)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid email batching period: 604810 seconds");

        assert!(spec.validate(&json!(300)).is_ok());
    }

    #[test]
    fn test_choices() {
        let err = user_default_spec("emojiset")
            .unwrap()
            .validate(&json!("invalid"))
            .unwrap_err();
        assert_eq!(
            err.to_string(),
            "Invalid emojiset: Value error, Not in the list of possible values"
        );

        let err = user_default_spec("resolved_topic_notice_auto_read_policy")
            .unwrap()
            .validate(&json!("invalid"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid resolved_topic_notice_auto_read_policy");

        assert!(user_default_spec("web_font_size_px")
            .unwrap()
            .validate(&json!(20))
            .is_ok());
        assert!(user_default_spec("web_line_height_percent")
            .unwrap()
            .validate(&json!(100))
            .is_err());
    }
}
