//! Realm property catalogue and validation
//!
//! Every property settable through a realm update has a declared kind, the
//! minimum role allowed to change it and the plan it requires. `validate`
//! turns a raw JSON value from a client into a typed [`PropertyValue`] or the
//! user-visible error explaining why it was rejected.
//!
//! Validation here is context-free. Checks that need realm state (channel
//! existence, configured video providers, plan gates) happen in the service
//! layer after this step.

use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{RealmError, RealmResult};
use crate::groups::PlanGate;
use crate::plans::OrgType;
use crate::roles::UserRole;

/// Maximum length of a realm name.
pub const MAX_REALM_NAME_LENGTH: usize = 40;

/// Maximum length of a realm description.
pub const MAX_REALM_DESCRIPTION_LENGTH: usize = 1000;

/// Maximum length of a realm subdomain.
pub const MAX_REALM_SUBDOMAIN_LENGTH: usize = 40;

/// Maximum length of a custom Jitsi server URL.
pub const MAX_JITSI_SERVER_URL_LENGTH: usize = 200;

/// Language codes a realm may use as its default language.
pub const LANGUAGES: &[&str] = &[
    "ar", "be", "bg", "bn", "ca", "cs", "cy", "da", "de", "el", "en", "en-gb", "eo", "es", "fa",
    "fi", "fr", "gl", "gu", "hi", "hu", "id", "it", "ja", "ko", "lt", "lv", "ml", "mn", "nl", "no",
    "pl", "pt", "pt-br", "pt-pt", "ro", "ru", "si", "sk", "sr", "sv", "ta", "te", "tl", "tr",
    "uk", "uz", "vi", "zh-hans", "zh-hant",
];

/// Video call integration offered in the compose box.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum VideoChatProvider {
    Disabled,
    JitsiMeet,
    Zoom,
    BigBlueButton,
    ZoomServerToServer,
}

impl VideoChatProvider {
    /// Every provider.
    pub const ALL: [VideoChatProvider; 5] = [
        VideoChatProvider::Disabled,
        VideoChatProvider::JitsiMeet,
        VideoChatProvider::Zoom,
        VideoChatProvider::BigBlueButton,
        VideoChatProvider::ZoomServerToServer,
    ];

    /// Stable numeric id.
    pub fn id(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::JitsiMeet => 1,
            Self::Zoom => 3,
            Self::BigBlueButton => 4,
            Self::ZoomServerToServer => 5,
        }
    }

    /// Look up a provider by id.
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.id() == id)
    }

    /// Get string representation.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Disabled => "disabled",
            Self::JitsiMeet => "jitsi_meet",
            Self::Zoom => "zoom",
            Self::BigBlueButton => "big_blue_button",
            Self::ZoomServerToServer => "zoom_server_to_server",
        }
    }
}

/// Maximum GIPHY content rating offered in the GIF picker.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GiphyRating {
    Disabled,
    Y,
    G,
    Pg,
    Pg13,
    R,
}

impl GiphyRating {
    /// Every rating.
    pub const ALL: [GiphyRating; 6] = [
        GiphyRating::Disabled,
        GiphyRating::Y,
        GiphyRating::G,
        GiphyRating::Pg,
        GiphyRating::Pg13,
        GiphyRating::R,
    ];

    /// Stable numeric id.
    pub fn id(&self) -> i64 {
        match self {
            Self::Disabled => 0,
            Self::Y => 1,
            Self::G => 2,
            Self::Pg => 3,
            Self::Pg13 => 4,
            Self::R => 5,
        }
    }

    /// Look up a rating by id.
    pub fn from_id(id: i64) -> Option<Self> {
        Self::ALL.into_iter().find(|r| r.id() == id)
    }
}

/// Who can see the edit history of messages.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum EditHistoryVisibilityPolicy {
    /// Full history visible
    All,
    /// Only topic and channel moves visible
    Moves,
    /// No history visible
    None,
}

impl EditHistoryVisibilityPolicy {
    /// Parse the API name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "all" => Some(Self::All),
            "moves" => Some(Self::Moves),
            "none" => Some(Self::None),
            _ => Option::None,
        }
    }

    /// Get the API name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::All => "all",
            Self::Moves => "moves",
            Self::None => "none",
        }
    }
}

/// Whether messages may be sent without a topic.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum TopicsPolicy {
    AllowEmptyTopic,
    DisableEmptyTopic,
}

impl TopicsPolicy {
    /// Parse the API name.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "allow_empty_topic" => Some(Self::AllowEmptyTopic),
            "disable_empty_topic" => Some(Self::DisableEmptyTopic),
            _ => None,
        }
    }

    /// Get the API name.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AllowEmptyTopic => "allow_empty_topic",
            Self::DisableEmptyTopic => "disable_empty_topic",
        }
    }
}

/// Shape of a property's value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PropertyKind {
    /// JSON boolean
    Bool,
    /// Integer with an inclusive lower bound
    Int { min: i64 },
    /// Day of week, 0 (Monday) to 6
    Weekday,
    /// Positive integer, or `"unlimited"` for no limit
    Unlimitable,
    /// String with a maximum length
    Text { max_len: usize },
    /// Known language code
    Language,
    /// Free-form code block language; empty string clears it
    CodeBlockLanguage,
    /// Absolute http(s) URL, or `"default"` to clear
    JitsiUrl,
    VideoChatProvider,
    GiphyRating,
    EditHistoryPolicy,
    TopicsPolicy,
    /// Channel id, or -1 to clear
    Channel,
    OrgType,
}

/// Validated property value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PropertyValue {
    Bool(bool),
    Int(i64),
    /// `None` means unlimited
    Limit(Option<i64>),
    Text(String),
    OptionalText(Option<String>),
    Channel(Option<Uuid>),
    VideoChatProvider(VideoChatProvider),
    GiphyRating(GiphyRating),
    EditHistoryPolicy(EditHistoryVisibilityPolicy),
    TopicsPolicy(TopicsPolicy),
    OrgType(OrgType),
}

/// Declared constraints of a property.
#[derive(Debug, Clone, Copy)]
pub struct PropertySpec {
    /// Value shape
    pub kind: PropertyKind,
    /// Minimum role allowed to change the property
    pub required_role: UserRole,
    /// Plan required to change the property
    pub plan_gate: PlanGate,
}

/// A realm property settable through a realm update.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum RealmProperty {
    Name,
    Description,
    InviteRequired,
    EmailsRestrictedToDomains,
    DisallowDisposableEmailAddresses,
    EnableSpectatorAccess,
    EnableReadReceipts,
    NameChangesDisabled,
    EmailChangesDisabled,
    AvatarChangesDisabled,
    InlineImagePreview,
    MandatoryTopics,
    SendWelcomeEmails,
    DigestEmailsEnabled,
    WaitingPeriodThreshold,
    MessageRetentionDays,
    DigestWeekday,
    MessageContentDeleteLimitSeconds,
    MessageContentEditLimitSeconds,
    MoveMessagesWithinStreamLimitSeconds,
    MoveMessagesBetweenStreamsLimitSeconds,
    VideoChatProvider,
    JitsiServerUrl,
    GiphyRating,
    MessageEditHistoryVisibilityPolicy,
    TopicsPolicy,
    DefaultLanguage,
    DefaultCodeBlockLanguage,
    NewStreamAnnouncementsStream,
    SignupAnnouncementsStream,
    ZulipUpdateAnnouncementsStream,
    ModerationRequestChannel,
    OrgType,
}

impl RealmProperty {
    /// Every settable property.
    pub const ALL: [RealmProperty; 33] = [
        RealmProperty::Name,
        RealmProperty::Description,
        RealmProperty::InviteRequired,
        RealmProperty::EmailsRestrictedToDomains,
        RealmProperty::DisallowDisposableEmailAddresses,
        RealmProperty::EnableSpectatorAccess,
        RealmProperty::EnableReadReceipts,
        RealmProperty::NameChangesDisabled,
        RealmProperty::EmailChangesDisabled,
        RealmProperty::AvatarChangesDisabled,
        RealmProperty::InlineImagePreview,
        RealmProperty::MandatoryTopics,
        RealmProperty::SendWelcomeEmails,
        RealmProperty::DigestEmailsEnabled,
        RealmProperty::WaitingPeriodThreshold,
        RealmProperty::MessageRetentionDays,
        RealmProperty::DigestWeekday,
        RealmProperty::MessageContentDeleteLimitSeconds,
        RealmProperty::MessageContentEditLimitSeconds,
        RealmProperty::MoveMessagesWithinStreamLimitSeconds,
        RealmProperty::MoveMessagesBetweenStreamsLimitSeconds,
        RealmProperty::VideoChatProvider,
        RealmProperty::JitsiServerUrl,
        RealmProperty::GiphyRating,
        RealmProperty::MessageEditHistoryVisibilityPolicy,
        RealmProperty::TopicsPolicy,
        RealmProperty::DefaultLanguage,
        RealmProperty::DefaultCodeBlockLanguage,
        RealmProperty::NewStreamAnnouncementsStream,
        RealmProperty::SignupAnnouncementsStream,
        RealmProperty::ZulipUpdateAnnouncementsStream,
        RealmProperty::ModerationRequestChannel,
        RealmProperty::OrgType,
    ];

    /// Property name as stored and reported in events and audit records.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Name => "name",
            Self::Description => "description",
            Self::InviteRequired => "invite_required",
            Self::EmailsRestrictedToDomains => "emails_restricted_to_domains",
            Self::DisallowDisposableEmailAddresses => "disallow_disposable_email_addresses",
            Self::EnableSpectatorAccess => "enable_spectator_access",
            Self::EnableReadReceipts => "enable_read_receipts",
            Self::NameChangesDisabled => "name_changes_disabled",
            Self::EmailChangesDisabled => "email_changes_disabled",
            Self::AvatarChangesDisabled => "avatar_changes_disabled",
            Self::InlineImagePreview => "inline_image_preview",
            Self::MandatoryTopics => "mandatory_topics",
            Self::SendWelcomeEmails => "send_welcome_emails",
            Self::DigestEmailsEnabled => "digest_emails_enabled",
            Self::WaitingPeriodThreshold => "waiting_period_threshold",
            Self::MessageRetentionDays => "message_retention_days",
            Self::DigestWeekday => "digest_weekday",
            Self::MessageContentDeleteLimitSeconds => "message_content_delete_limit_seconds",
            Self::MessageContentEditLimitSeconds => "message_content_edit_limit_seconds",
            Self::MoveMessagesWithinStreamLimitSeconds => {
                "move_messages_within_stream_limit_seconds"
            }
            Self::MoveMessagesBetweenStreamsLimitSeconds => {
                "move_messages_between_streams_limit_seconds"
            }
            Self::VideoChatProvider => "video_chat_provider",
            Self::JitsiServerUrl => "jitsi_server_url",
            Self::GiphyRating => "giphy_rating",
            Self::MessageEditHistoryVisibilityPolicy => "message_edit_history_visibility_policy",
            Self::TopicsPolicy => "topics_policy",
            Self::DefaultLanguage => "default_language",
            Self::DefaultCodeBlockLanguage => "default_code_block_language",
            Self::NewStreamAnnouncementsStream => "new_stream_announcements_stream",
            Self::SignupAnnouncementsStream => "signup_announcements_stream",
            Self::ZulipUpdateAnnouncementsStream => "zulip_update_announcements_stream",
            Self::ModerationRequestChannel => "moderation_request_channel",
            Self::OrgType => "org_type",
        }
    }

    /// Parameter name used by update requests.
    ///
    /// Channel designations are sent as `<name>_id`.
    pub fn api_name(&self) -> String {
        match self.spec().kind {
            PropertyKind::Channel => format!("{}_id", self.name()),
            _ => self.name().to_string(),
        }
    }

    /// Look up a property by its request parameter name.
    pub fn from_api_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.api_name() == name)
    }

    /// Declared constraints.
    pub fn spec(&self) -> PropertySpec {
        let (kind, required_role, plan_gate) = match self {
            Self::Name => (
                PropertyKind::Text { max_len: MAX_REALM_NAME_LENGTH },
                UserRole::Administrator,
                PlanGate::None,
            ),
            Self::Description => (
                PropertyKind::Text { max_len: MAX_REALM_DESCRIPTION_LENGTH },
                UserRole::Administrator,
                PlanGate::None,
            ),
            Self::InviteRequired
            | Self::EmailsRestrictedToDomains
            | Self::DisallowDisposableEmailAddresses => {
                (PropertyKind::Bool, UserRole::Owner, PlanGate::None)
            }
            Self::EnableSpectatorAccess => {
                (PropertyKind::Bool, UserRole::Administrator, PlanGate::Standard)
            }
            Self::EnableReadReceipts
            | Self::NameChangesDisabled
            | Self::EmailChangesDisabled
            | Self::AvatarChangesDisabled
            | Self::InlineImagePreview
            | Self::MandatoryTopics
            | Self::SendWelcomeEmails
            | Self::DigestEmailsEnabled => {
                (PropertyKind::Bool, UserRole::Administrator, PlanGate::None)
            }
            Self::WaitingPeriodThreshold => {
                (PropertyKind::Int { min: 0 }, UserRole::Owner, PlanGate::None)
            }
            Self::MessageRetentionDays => {
                (PropertyKind::Unlimitable, UserRole::Owner, PlanGate::Standard)
            }
            Self::DigestWeekday => (PropertyKind::Weekday, UserRole::Administrator, PlanGate::None),
            Self::MessageContentDeleteLimitSeconds
            | Self::MessageContentEditLimitSeconds
            | Self::MoveMessagesWithinStreamLimitSeconds
            | Self::MoveMessagesBetweenStreamsLimitSeconds => {
                (PropertyKind::Unlimitable, UserRole::Administrator, PlanGate::None)
            }
            Self::VideoChatProvider => (
                PropertyKind::VideoChatProvider,
                UserRole::Administrator,
                PlanGate::None,
            ),
            Self::JitsiServerUrl => (PropertyKind::JitsiUrl, UserRole::Administrator, PlanGate::None),
            Self::GiphyRating => (PropertyKind::GiphyRating, UserRole::Administrator, PlanGate::None),
            Self::MessageEditHistoryVisibilityPolicy => (
                PropertyKind::EditHistoryPolicy,
                UserRole::Administrator,
                PlanGate::None,
            ),
            Self::TopicsPolicy => (PropertyKind::TopicsPolicy, UserRole::Administrator, PlanGate::None),
            Self::DefaultLanguage => (PropertyKind::Language, UserRole::Administrator, PlanGate::None),
            Self::DefaultCodeBlockLanguage => (
                PropertyKind::CodeBlockLanguage,
                UserRole::Administrator,
                PlanGate::None,
            ),
            Self::NewStreamAnnouncementsStream
            | Self::SignupAnnouncementsStream
            | Self::ZulipUpdateAnnouncementsStream
            | Self::ModerationRequestChannel => {
                (PropertyKind::Channel, UserRole::Administrator, PlanGate::None)
            }
            Self::OrgType => (PropertyKind::OrgType, UserRole::Administrator, PlanGate::None),
        };

        PropertySpec {
            kind,
            required_role,
            plan_gate,
        }
    }

    /// Validate a raw client value for this property.
    ///
    /// # Examples
    ///
    /// ```
    /// use realm_org::settings::{PropertyValue, RealmProperty};
    /// use serde_json::json;
    ///
    /// let value = RealmProperty::MessageRetentionDays.validate(&json!("unlimited")).unwrap();
    /// assert_eq!(value, PropertyValue::Limit(None));
    ///
    /// let err = RealmProperty::MessageRetentionDays.validate(&json!(0)).unwrap_err();
    /// assert_eq!(err.to_string(), "Bad value for 'message_retention_days': 0");
    /// ```
    pub fn validate(&self, raw: &serde_json::Value) -> RealmResult<PropertyValue> {
        let field = self.name();
        match self.spec().kind {
            PropertyKind::Bool => raw
                .as_bool()
                .map(PropertyValue::Bool)
                .ok_or_else(|| wrong_type(field, "a boolean")),

            PropertyKind::Int { min } => {
                let n = raw.as_i64().ok_or_else(|| wrong_type(field, "an integer"))?;
                if n < min {
                    return Err(RealmError::bad_value(field, n));
                }
                Ok(PropertyValue::Int(n))
            }

            PropertyKind::Weekday => {
                let n = raw.as_i64().ok_or_else(|| wrong_type(field, "an integer"))?;
                if !(0..=6).contains(&n) {
                    return Err(RealmError::Invalid(field.to_string()));
                }
                Ok(PropertyValue::Int(n))
            }

            PropertyKind::Unlimitable => match raw {
                serde_json::Value::String(s) if s == "unlimited" => Ok(PropertyValue::Limit(None)),
                serde_json::Value::Number(n) => match n.as_i64() {
                    Some(v) if v >= 1 => Ok(PropertyValue::Limit(Some(v))),
                    _ => Err(RealmError::bad_value(field, n)),
                },
                serde_json::Value::String(s) => Err(RealmError::bad_value(field, s)),
                other => Err(RealmError::bad_value(field, other)),
            },

            PropertyKind::Text { max_len } => {
                let s = raw.as_str().ok_or_else(|| wrong_type(field, "a string"))?;
                if s.chars().count() > max_len {
                    return Err(RealmError::TooLong {
                        field: field.to_string(),
                        limit: max_len,
                    });
                }
                Ok(PropertyValue::Text(s.to_string()))
            }

            PropertyKind::Language => {
                let s = raw.as_str().ok_or_else(|| wrong_type(field, "a string"))?;
                if !LANGUAGES.contains(&s) {
                    return Err(RealmError::InvalidLanguage(s.to_string()));
                }
                Ok(PropertyValue::Text(s.to_string()))
            }

            PropertyKind::CodeBlockLanguage => {
                let s = raw.as_str().ok_or_else(|| wrong_type(field, "a string"))?;
                let trimmed = s.trim();
                Ok(PropertyValue::OptionalText(
                    (!trimmed.is_empty()).then(|| trimmed.to_string()),
                ))
            }

            PropertyKind::JitsiUrl => {
                let s = raw.as_str().ok_or_else(|| wrong_type(field, "a string"))?;
                if s == "default" {
                    return Ok(PropertyValue::OptionalText(None));
                }
                if !is_valid_server_url(s) {
                    return Err(RealmError::NotAllowedType(field.to_string()));
                }
                Ok(PropertyValue::OptionalText(Some(s.to_string())))
            }

            PropertyKind::VideoChatProvider => {
                let id = int_or_numeric_string(raw).ok_or_else(|| wrong_type(field, "an integer"))?;
                VideoChatProvider::from_id(id)
                    .map(PropertyValue::VideoChatProvider)
                    .ok_or_else(|| RealmError::invalid_id(field, id))
            }

            PropertyKind::GiphyRating => {
                let id = int_or_numeric_string(raw).ok_or_else(|| wrong_type(field, "an integer"))?;
                GiphyRating::from_id(id)
                    .map(PropertyValue::GiphyRating)
                    .ok_or_else(|| RealmError::invalid_id(field, id))
            }

            PropertyKind::EditHistoryPolicy => raw
                .as_str()
                .and_then(EditHistoryVisibilityPolicy::parse)
                .map(PropertyValue::EditHistoryPolicy)
                .ok_or_else(|| RealmError::Invalid(field.to_string())),

            PropertyKind::TopicsPolicy => raw
                .as_str()
                .and_then(TopicsPolicy::parse)
                .map(PropertyValue::TopicsPolicy)
                .ok_or_else(|| RealmError::Invalid(field.to_string())),

            PropertyKind::Channel => {
                if raw.as_i64() == Some(-1) {
                    return Ok(PropertyValue::Channel(None));
                }
                raw.as_str()
                    .and_then(|s| Uuid::parse_str(s).ok())
                    .map(|id| PropertyValue::Channel(Some(id)))
                    .ok_or(RealmError::InvalidChannel)
            }

            PropertyKind::OrgType => int_or_numeric_string(raw)
                .and_then(|id| u32::try_from(id).ok())
                .and_then(crate::plans::OrgType::from_id)
                .map(PropertyValue::OrgType)
                .ok_or_else(|| RealmError::Invalid(field.to_string())),
        }
    }
}

fn wrong_type(field: &str, expected: &'static str) -> RealmError {
    RealmError::WrongType {
        field: field.to_string(),
        expected,
    }
}

fn int_or_numeric_string(raw: &serde_json::Value) -> Option<i64> {
    match raw {
        serde_json::Value::Number(n) => n.as_i64(),
        serde_json::Value::String(s) => s.parse().ok(),
        _ => None,
    }
}

/// Absolute http(s) URL with a host, within the length limit.
///
/// The parser silently strips surrounding whitespace, so it is rejected first.
fn is_valid_server_url(s: &str) -> bool {
    if s.len() > MAX_JITSI_SERVER_URL_LENGTH || s.chars().any(char::is_whitespace) {
        return false;
    }
    match Url::parse(s) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

/// Check that a subdomain is well formed.
///
/// Only lowercase letters, digits and interior hyphens are allowed.
pub fn check_subdomain_format(subdomain: &str) -> RealmResult<()> {
    let well_formed = !subdomain.is_empty()
        && subdomain.len() <= MAX_REALM_SUBDOMAIN_LENGTH
        && subdomain
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        && !subdomain.starts_with('-')
        && !subdomain.ends_with('-');
    if well_formed {
        Ok(())
    } else {
        Err(RealmError::SubdomainInvalid)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_property_names_roundtrip() {
        for prop in RealmProperty::ALL {
            assert_eq!(RealmProperty::from_api_name(&prop.api_name()), Some(prop));
        }
        assert_eq!(
            RealmProperty::from_api_name("new_stream_announcements_stream_id"),
            Some(RealmProperty::NewStreamAnnouncementsStream)
        );
        assert_eq!(RealmProperty::from_api_name("new_stream_announcements_stream"), None);
    }

    #[test]
    fn test_owner_only_properties() {
        for prop in [
            RealmProperty::InviteRequired,
            RealmProperty::EmailsRestrictedToDomains,
            RealmProperty::DisallowDisposableEmailAddresses,
            RealmProperty::WaitingPeriodThreshold,
            RealmProperty::MessageRetentionDays,
        ] {
            assert_eq!(prop.spec().required_role, UserRole::Owner);
        }
        assert_eq!(RealmProperty::Name.spec().required_role, UserRole::Administrator);
    }

    #[test]
    fn test_text_length_limits() {
        let long_name = "A".repeat(MAX_REALM_NAME_LENGTH + 1);
        let err = RealmProperty::Name.validate(&json!(long_name)).unwrap_err();
        assert_eq!(err.to_string(), "name is too long (limit: 40 characters)");

        let long_description = "A".repeat(MAX_REALM_DESCRIPTION_LENGTH + 1);
        let err = RealmProperty::Description
            .validate(&json!(long_description))
            .unwrap_err();
        assert_eq!(err.to_string(), "description is too long (limit: 1000 characters)");
    }

    #[test]
    fn test_unlimitable_values() {
        let prop = RealmProperty::MessageRetentionDays;
        assert_eq!(prop.validate(&json!(10)).unwrap(), PropertyValue::Limit(Some(10)));
        for (raw, shown) in [(json!(0), "0"), (json!(-10), "-10"), (json!("invalid"), "invalid")] {
            let err = prop.validate(&raw).unwrap_err();
            assert_eq!(
                err.to_string(),
                format!("Bad value for 'message_retention_days': {}", shown)
            );
        }
    }

    #[test]
    fn test_integer_choices() {
        let err = RealmProperty::VideoChatProvider.validate(&json!(10)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid video_chat_provider 10");

        let err = RealmProperty::GiphyRating.validate(&json!(10)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid giphy_rating 10");

        let err = RealmProperty::DigestWeekday.validate(&json!(10)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid digest_weekday");

        let err = RealmProperty::WaitingPeriodThreshold
            .validate(&json!(-10))
            .unwrap_err();
        assert_eq!(err.to_string(), "Bad value for 'waiting_period_threshold': -10");

        let err = RealmProperty::MessageEditHistoryVisibilityPolicy
            .validate(&json!("invalid"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid message_edit_history_visibility_policy");

        let err = RealmProperty::TopicsPolicy.validate(&json!("invalid")).unwrap_err();
        assert_eq!(err.to_string(), "Invalid topics_policy");

        let err = RealmProperty::OrgType.validate(&json!(1)).unwrap_err();
        assert_eq!(err.to_string(), "Invalid org_type");
    }

    #[test]
    fn test_jitsi_server_url() {
        let prop = RealmProperty::JitsiServerUrl;
        for bad in ["", "invalidURL"] {
            let err = prop.validate(&json!(bad)).unwrap_err();
            assert_eq!(err.to_string(), "jitsi_server_url is not an allowed_type");
        }
        let err = prop.validate(&json!(12)).unwrap_err();
        assert_eq!(err.to_string(), "jitsi_server_url is not a string");

        let long_url = format!("https://jitsi.example.com/{}", "z".repeat(180));
        assert!(prop.validate(&json!(long_url)).is_err());

        assert_eq!(
            prop.validate(&json!("https://jitsi.example.com")).unwrap(),
            PropertyValue::OptionalText(Some("https://jitsi.example.com".to_string()))
        );
        assert_eq!(
            prop.validate(&json!("default")).unwrap(),
            PropertyValue::OptionalText(None)
        );
    }

    #[test]
    fn test_jitsi_server_url_parsing() {
        let prop = RealmProperty::JitsiServerUrl;
        for bad in [
            "https://jitsi.example.com:notaport",
            "https://jitsi.example.com:99999999",
            "ftp://jitsi.example.com",
            "mailto:admin@example.com",
            "https://",
        ] {
            assert!(prop.validate(&json!(bad)).is_err(), "{} should be rejected", bad);
        }
        for good in [
            "https://[2001:db8::1]/",
            "http://localhost:8443/meet",
            "https://jitsi.example.com:8443",
        ] {
            assert_eq!(
                prop.validate(&json!(good)).unwrap(),
                PropertyValue::OptionalText(Some(good.to_string()))
            );
        }
    }

    #[test]
    fn test_language_and_channel() {
        let err = RealmProperty::DefaultLanguage
            .validate(&json!("invalid_lang"))
            .unwrap_err();
        assert_eq!(err.to_string(), "Invalid language 'invalid_lang'");
        assert!(RealmProperty::DefaultLanguage.validate(&json!("de")).is_ok());

        let prop = RealmProperty::SignupAnnouncementsStream;
        assert_eq!(prop.validate(&json!(-1)).unwrap(), PropertyValue::Channel(None));
        assert_eq!(prop.validate(&json!(1234)).unwrap_err(), RealmError::InvalidChannel);
    }

    #[test]
    fn test_subdomain_format() {
        assert!(check_subdomain_format("acme-corp").is_ok());
        assert!(check_subdomain_format("Acme").is_err());
        assert!(check_subdomain_format("-acme").is_err());
        assert!(check_subdomain_format("").is_err());
    }
}
