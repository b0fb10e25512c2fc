//! Realm domain model
//!
//! A realm is a tenant organization. It owns users, channels, groups and
//! messages, and carries the organization-wide configuration that the rest
//! of the application consults.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::collections::BTreeMap;
use uuid::Uuid;

use crate::groups::GroupSetting;
use crate::plans::{OrgType, PlanType};
use crate::settings::{
    EditHistoryVisibilityPolicy, GiphyRating, PropertyValue, RealmProperty, TopicsPolicy,
    VideoChatProvider,
};

/// Authentication methods that require a paid plan.
pub const PAID_AUTHENTICATION_METHODS: &[&str] = &["AzureAD", "SAML"];

/// A realm represents a tenant organization.
///
/// # Lifecycle
///
/// ```text
/// create ──→ ACTIVE ──deactivate──→ DEACTIVATED ──scrub──→ SCRUBBED
///              ↑                        │
///              └──────reactivate────────┘
/// ```
///
/// A deactivated realm keeps its data until its `scheduled_deletion_date`
/// passes. `None` means the data is kept until someone scrubs it explicitly.
///
/// # Examples
///
/// ```
/// use realm_org::{PlanType, Realm};
///
/// let realm = Realm::new("acme", "Acme Corp", PlanType::SelfHosted);
/// assert!(!realm.deactivated);
/// assert_eq!(realm.url("example.com"), "https://acme.example.com");
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Realm {
    /// Unique identifier
    pub id: Uuid,

    /// Subdomain (unique among realms; empty for the root domain realm)
    pub string_id: String,

    /// Display name
    pub name: String,

    /// Markdown description shown on the login page
    #[serde(default)]
    pub description: String,

    /// Billing plan
    pub plan_type: PlanType,

    /// Organization type
    #[serde(default)]
    pub org_type: OrgType,

    /// When the realm was created
    pub date_created: DateTime<Utc>,

    // ---- lifecycle ----
    /// Whether the realm is deactivated
    #[serde(default)]
    pub deactivated: bool,

    /// Where visitors of a deactivated realm are sent
    pub deactivated_redirect: Option<String>,

    /// When a deactivated realm's data will be scrubbed
    pub scheduled_deletion_date: Option<DateTime<Utc>>,

    /// When a demo organization expires (None for regular realms)
    pub demo_organization_scheduled_deletion_date: Option<DateTime<Utc>>,

    // ---- joining ----
    /// New users need an invitation
    pub invite_required: bool,

    /// Only addresses in the realm's domains may join
    pub emails_restricted_to_domains: bool,

    /// Disposable email addresses may not join
    pub disallow_disposable_email_addresses: bool,

    /// Days a member must wait before becoming a full member
    pub waiting_period_threshold: i64,

    /// Daily invitation cap (None = server default)
    pub max_invites: Option<u32>,

    // ---- visibility ----
    /// Logged-out visitors may read web-public channels
    pub enable_spectator_access: bool,

    /// Read receipts are shown
    pub enable_read_receipts: bool,

    /// Number of most recent messages visible (None = unlimited)
    pub message_visibility_limit: Option<u32>,

    // ---- user profile restrictions ----
    /// Users cannot change their names
    pub name_changes_disabled: bool,

    /// Users cannot change their email addresses
    pub email_changes_disabled: bool,

    /// Users cannot change their avatars
    pub avatar_changes_disabled: bool,

    // ---- messages ----
    /// Days messages are kept (None = forever)
    pub message_retention_days: Option<i64>,

    /// Seconds after sending a message can be deleted (None = always)
    pub message_content_delete_limit_seconds: Option<i64>,

    /// Seconds after sending a message can be edited (None = always)
    pub message_content_edit_limit_seconds: Option<i64>,

    /// Seconds after sending a message can be moved between topics
    pub move_messages_within_stream_limit_seconds: Option<i64>,

    /// Seconds after sending a message can be moved between channels
    pub move_messages_between_streams_limit_seconds: Option<i64>,

    /// Who sees message edit history
    pub message_edit_history_visibility_policy: EditHistoryVisibilityPolicy,

    /// Whether empty topics are allowed
    pub topics_policy: TopicsPolicy,

    /// Image links get inline previews
    pub inline_image_preview: bool,

    /// Messages must have a topic
    pub mandatory_topics: bool,

    // ---- integrations ----
    /// Video call provider
    pub video_chat_provider: VideoChatProvider,

    /// Custom Jitsi server (None = server default)
    pub jitsi_server_url: Option<String>,

    /// GIPHY content rating
    pub giphy_rating: GiphyRating,

    // ---- localization ----
    /// Default language for new users
    pub default_language: String,

    /// Default syntax highlighting language for code blocks
    pub default_code_block_language: Option<String>,

    // ---- email ----
    /// Welcome emails are sent to new users
    pub send_welcome_emails: bool,

    /// Digest emails are sent
    pub digest_emails_enabled: bool,

    /// Weekday digests go out, 0 = Monday
    pub digest_weekday: i64,

    // ---- designated channels ----
    /// Channel where new channels are announced
    pub new_stream_announcements_stream: Option<Uuid>,

    /// Channel where new signups are announced
    pub signup_announcements_stream: Option<Uuid>,

    /// Channel receiving product update announcements
    pub zulip_update_announcements_stream: Option<Uuid>,

    /// Private channel receiving moderation requests
    pub moderation_request_channel: Option<Uuid>,

    // ---- permissions and auth ----
    /// Group each permission setting points at
    #[serde(default)]
    pub group_settings: BTreeMap<GroupSetting, Uuid>,

    /// Enabled state of each authentication backend
    #[serde(default)]
    pub authentication_methods: BTreeMap<String, bool>,

    /// Custom upload quota in GB, overriding the plan's quota
    pub custom_upload_quota_gb: Option<u64>,

    /// Mobile push notifications are delivered (server-maintained)
    pub push_notifications_enabled: bool,

    /// When `push_notifications_enabled` stops being true
    pub push_notifications_enabled_end_timestamp: Option<DateTime<Utc>>,
}

impl Realm {
    /// Creates a new realm with default settings.
    ///
    /// Group settings and designated channels are empty; the realm
    /// creation action fills them in once the groups and channels exist.
    pub fn new(string_id: impl Into<String>, name: impl Into<String>, plan_type: PlanType) -> Self {
        Self {
            id: Uuid::now_v7(),
            string_id: string_id.into(),
            name: name.into(),
            description: String::new(),
            plan_type,
            org_type: OrgType::Unspecified,
            date_created: Utc::now(),
            deactivated: false,
            deactivated_redirect: None,
            scheduled_deletion_date: None,
            demo_organization_scheduled_deletion_date: None,
            invite_required: true,
            emails_restricted_to_domains: false,
            disallow_disposable_email_addresses: true,
            waiting_period_threshold: 0,
            max_invites: None,
            enable_spectator_access: false,
            enable_read_receipts: false,
            message_visibility_limit: None,
            name_changes_disabled: false,
            email_changes_disabled: false,
            avatar_changes_disabled: false,
            message_retention_days: None,
            message_content_delete_limit_seconds: Some(600),
            message_content_edit_limit_seconds: Some(600),
            move_messages_within_stream_limit_seconds: Some(604_800),
            move_messages_between_streams_limit_seconds: Some(604_800),
            message_edit_history_visibility_policy: EditHistoryVisibilityPolicy::All,
            topics_policy: TopicsPolicy::DisableEmptyTopic,
            inline_image_preview: true,
            mandatory_topics: false,
            video_chat_provider: VideoChatProvider::JitsiMeet,
            jitsi_server_url: None,
            giphy_rating: GiphyRating::G,
            default_language: "en".to_string(),
            default_code_block_language: None,
            send_welcome_emails: true,
            digest_emails_enabled: false,
            digest_weekday: 1,
            new_stream_announcements_stream: None,
            signup_announcements_stream: None,
            zulip_update_announcements_stream: None,
            moderation_request_channel: None,
            group_settings: BTreeMap::new(),
            authentication_methods: BTreeMap::new(),
            custom_upload_quota_gb: None,
            push_notifications_enabled: false,
            push_notifications_enabled_end_timestamp: None,
        }
    }

    /// Host serving this realm.
    pub fn host(&self, external_host: &str) -> String {
        if self.string_id.is_empty() {
            external_host.to_string()
        } else {
            format!("{}.{}", self.string_id, external_host)
        }
    }

    /// Base URL of this realm.
    pub fn url(&self, external_host: &str) -> String {
        format!("https://{}", self.host(external_host))
    }

    /// Whether this realm is a demo organization.
    pub fn is_demo_organization(&self) -> bool {
        self.demo_organization_scheduled_deletion_date.is_some()
    }

    /// Whether web-public channels are usable in this realm.
    ///
    /// Requires the server-wide switch and spectator access.
    pub fn web_public_streams_enabled(&self, server_enabled: bool) -> bool {
        server_enabled && self.enable_spectator_access
    }

    /// Upload quota in GB for the given seat count (None = unlimited).
    pub fn upload_quota_gb(&self, seat_count: u32) -> Option<u64> {
        self.custom_upload_quota_gb
            .or_else(|| self.plan_type.limits(seat_count).upload_quota_gb)
    }

    /// Names of the enabled authentication methods.
    pub fn enabled_authentication_methods(&self) -> Vec<&str> {
        self.authentication_methods
            .iter()
            .filter(|(_, enabled)| **enabled)
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Group a permission setting points at.
    pub fn group_setting(&self, setting: GroupSetting) -> Option<Uuid> {
        self.group_settings.get(&setting).copied()
    }

    /// Current value of a property, in its wire representation.
    pub fn property(&self, property: RealmProperty) -> serde_json::Value {
        match property {
            RealmProperty::Name => json!(self.name),
            RealmProperty::Description => json!(self.description),
            RealmProperty::InviteRequired => json!(self.invite_required),
            RealmProperty::EmailsRestrictedToDomains => json!(self.emails_restricted_to_domains),
            RealmProperty::DisallowDisposableEmailAddresses => {
                json!(self.disallow_disposable_email_addresses)
            }
            RealmProperty::EnableSpectatorAccess => json!(self.enable_spectator_access),
            RealmProperty::EnableReadReceipts => json!(self.enable_read_receipts),
            RealmProperty::NameChangesDisabled => json!(self.name_changes_disabled),
            RealmProperty::EmailChangesDisabled => json!(self.email_changes_disabled),
            RealmProperty::AvatarChangesDisabled => json!(self.avatar_changes_disabled),
            RealmProperty::InlineImagePreview => json!(self.inline_image_preview),
            RealmProperty::MandatoryTopics => json!(self.mandatory_topics),
            RealmProperty::SendWelcomeEmails => json!(self.send_welcome_emails),
            RealmProperty::DigestEmailsEnabled => json!(self.digest_emails_enabled),
            RealmProperty::WaitingPeriodThreshold => json!(self.waiting_period_threshold),
            RealmProperty::MessageRetentionDays => json!(self.message_retention_days),
            RealmProperty::DigestWeekday => json!(self.digest_weekday),
            RealmProperty::MessageContentDeleteLimitSeconds => {
                json!(self.message_content_delete_limit_seconds)
            }
            RealmProperty::MessageContentEditLimitSeconds => {
                json!(self.message_content_edit_limit_seconds)
            }
            RealmProperty::MoveMessagesWithinStreamLimitSeconds => {
                json!(self.move_messages_within_stream_limit_seconds)
            }
            RealmProperty::MoveMessagesBetweenStreamsLimitSeconds => {
                json!(self.move_messages_between_streams_limit_seconds)
            }
            RealmProperty::VideoChatProvider => json!(self.video_chat_provider.id()),
            RealmProperty::JitsiServerUrl => json!(self.jitsi_server_url),
            RealmProperty::GiphyRating => json!(self.giphy_rating.id()),
            RealmProperty::MessageEditHistoryVisibilityPolicy => {
                json!(self.message_edit_history_visibility_policy.as_str())
            }
            RealmProperty::TopicsPolicy => json!(self.topics_policy.as_str()),
            RealmProperty::DefaultLanguage => json!(self.default_language),
            RealmProperty::DefaultCodeBlockLanguage => json!(self.default_code_block_language),
            RealmProperty::NewStreamAnnouncementsStream => {
                json!(self.new_stream_announcements_stream)
            }
            RealmProperty::SignupAnnouncementsStream => json!(self.signup_announcements_stream),
            RealmProperty::ZulipUpdateAnnouncementsStream => {
                json!(self.zulip_update_announcements_stream)
            }
            RealmProperty::ModerationRequestChannel => json!(self.moderation_request_channel),
            RealmProperty::OrgType => json!(self.org_type.id()),
        }
    }

    /// Store a validated property value.
    ///
    /// Returns `false` when the value's shape does not fit the property,
    /// which only happens if the value was validated for another property.
    pub fn set_property(&mut self, property: RealmProperty, value: PropertyValue) -> bool {
        use PropertyValue as V;
        use RealmProperty as P;

        match (property, value) {
            (P::Name, V::Text(s)) => self.name = s,
            (P::Description, V::Text(s)) => self.description = s,
            (P::DefaultLanguage, V::Text(s)) => self.default_language = s,
            (P::InviteRequired, V::Bool(b)) => self.invite_required = b,
            (P::EmailsRestrictedToDomains, V::Bool(b)) => self.emails_restricted_to_domains = b,
            (P::DisallowDisposableEmailAddresses, V::Bool(b)) => {
                self.disallow_disposable_email_addresses = b
            }
            (P::EnableSpectatorAccess, V::Bool(b)) => self.enable_spectator_access = b,
            (P::EnableReadReceipts, V::Bool(b)) => self.enable_read_receipts = b,
            (P::NameChangesDisabled, V::Bool(b)) => self.name_changes_disabled = b,
            (P::EmailChangesDisabled, V::Bool(b)) => self.email_changes_disabled = b,
            (P::AvatarChangesDisabled, V::Bool(b)) => self.avatar_changes_disabled = b,
            (P::InlineImagePreview, V::Bool(b)) => self.inline_image_preview = b,
            (P::MandatoryTopics, V::Bool(b)) => self.mandatory_topics = b,
            (P::SendWelcomeEmails, V::Bool(b)) => self.send_welcome_emails = b,
            (P::DigestEmailsEnabled, V::Bool(b)) => self.digest_emails_enabled = b,
            (P::WaitingPeriodThreshold, V::Int(n)) => self.waiting_period_threshold = n,
            (P::DigestWeekday, V::Int(n)) => self.digest_weekday = n,
            (P::MessageRetentionDays, V::Limit(n)) => self.message_retention_days = n,
            (P::MessageContentDeleteLimitSeconds, V::Limit(n)) => {
                self.message_content_delete_limit_seconds = n
            }
            (P::MessageContentEditLimitSeconds, V::Limit(n)) => {
                self.message_content_edit_limit_seconds = n
            }
            (P::MoveMessagesWithinStreamLimitSeconds, V::Limit(n)) => {
                self.move_messages_within_stream_limit_seconds = n
            }
            (P::MoveMessagesBetweenStreamsLimitSeconds, V::Limit(n)) => {
                self.move_messages_between_streams_limit_seconds = n
            }
            (P::VideoChatProvider, V::VideoChatProvider(p)) => self.video_chat_provider = p,
            (P::JitsiServerUrl, V::OptionalText(s)) => self.jitsi_server_url = s,
            (P::GiphyRating, V::GiphyRating(r)) => self.giphy_rating = r,
            (P::MessageEditHistoryVisibilityPolicy, V::EditHistoryPolicy(p)) => {
                self.message_edit_history_visibility_policy = p
            }
            (P::TopicsPolicy, V::TopicsPolicy(p)) => self.topics_policy = p,
            (P::DefaultCodeBlockLanguage, V::OptionalText(s)) => {
                self.default_code_block_language = s
            }
            (P::NewStreamAnnouncementsStream, V::Channel(c)) => {
                self.new_stream_announcements_stream = c
            }
            (P::SignupAnnouncementsStream, V::Channel(c)) => self.signup_announcements_stream = c,
            (P::ZulipUpdateAnnouncementsStream, V::Channel(c)) => {
                self.zulip_update_announcements_stream = c
            }
            (P::ModerationRequestChannel, V::Channel(c)) => self.moderation_request_channel = c,
            (P::OrgType, V::OrgType(t)) => self.org_type = t,
            _ => return false,
        }
        true
    }

    /// Designations that point at the given channel.
    pub fn channel_designations(&self, stream_id: Uuid) -> Vec<RealmProperty> {
        [
            (RealmProperty::NewStreamAnnouncementsStream, self.new_stream_announcements_stream),
            (RealmProperty::SignupAnnouncementsStream, self.signup_announcements_stream),
            (
                RealmProperty::ZulipUpdateAnnouncementsStream,
                self.zulip_update_announcements_stream,
            ),
            (RealmProperty::ModerationRequestChannel, self.moderation_request_channel),
        ]
        .into_iter()
        .filter(|(_, current)| *current == Some(stream_id))
        .map(|(property, _)| property)
        .collect()
    }
}
