//! User groups and permission-group settings
//!
//! Every realm owns eight role-derived system groups. Realm permissions
//! ("who can create channels", "who can invite users", ...) are expressed as
//! settings that point at a group: either a named group, usually a system
//! group, or an anonymous group holding an ad-hoc list of members and
//! subgroups.
//!
//! ```text
//! Realm
//!   └─ GroupSetting ──→ UserGroup (named or anonymous)
//!                          ├─ direct_members
//!                          └─ direct_subgroups ──→ UserGroup
//! ```

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use uuid::Uuid;

use crate::error::{RealmError, RealmResult};
use crate::roles::UserRole;

/// The role-derived groups present in every realm.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SystemGroup {
    /// Owners
    Owners,
    /// Administrators and owners
    Administrators,
    /// Moderators and above
    Moderators,
    /// Members past the realm's waiting period, and everyone above member
    FullMembers,
    /// Every non-guest user
    Members,
    /// Every user, guests included
    Everyone,
    /// Everyone, plus logged-out spectators
    Internet,
    /// No one
    Nobody,
}

impl SystemGroup {
    /// Every system group, in creation order.
    pub const ALL: [SystemGroup; 8] = [
        SystemGroup::Owners,
        SystemGroup::Administrators,
        SystemGroup::Moderators,
        SystemGroup::FullMembers,
        SystemGroup::Members,
        SystemGroup::Everyone,
        SystemGroup::Internet,
        SystemGroup::Nobody,
    ];

    /// Group name as stored on the group record.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Owners => "role:owners",
            Self::Administrators => "role:administrators",
            Self::Moderators => "role:moderators",
            Self::FullMembers => "role:fullmembers",
            Self::Members => "role:members",
            Self::Everyone => "role:everyone",
            Self::Internet => "role:internet",
            Self::Nobody => "role:nobody",
        }
    }

    /// Look up a system group by its stored name.
    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|g| g.name() == name)
    }

    /// Human-readable description shown in settings UIs.
    pub fn description(&self) -> &'static str {
        match self {
            Self::Owners => "Owners of this organization",
            Self::Administrators => "Administrators of this organization, including owners",
            Self::Moderators => "Moderators of this organization, including administrators",
            Self::FullMembers => "Members of this organization, not including new accounts",
            Self::Members => "Members of this organization, not including guests",
            Self::Everyone => "Everyone in this organization, including guests",
            Self::Internet => "Everyone on the internet",
            Self::Nobody => "Nobody",
        }
    }

    /// Whether a user with `role` belongs to this group.
    ///
    /// `is_full_member` is the caller's verdict on the waiting period and is
    /// only consulted for `FullMembers`.
    pub fn includes(&self, role: UserRole, is_full_member: bool) -> bool {
        match self {
            Self::Owners => role == UserRole::Owner,
            Self::Administrators => role.is_administrator(),
            Self::Moderators => role.is_moderator(),
            Self::FullMembers => {
                role.is_moderator() || (role == UserRole::Member && is_full_member)
            }
            Self::Members => role >= UserRole::Member,
            Self::Everyone | Self::Internet => true,
            Self::Nobody => false,
        }
    }
}

/// A user group.
///
/// Named groups carry a name; anonymous groups exist only to back a
/// permission setting and have none.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserGroup {
    /// Unique identifier
    pub id: Uuid,

    /// Realm the group belongs to
    pub realm_id: Uuid,

    /// Group name (None for anonymous groups)
    pub name: Option<String>,

    /// Description shown in the UI
    #[serde(default)]
    pub description: String,

    /// Whether this is one of the role-derived system groups
    pub is_system_group: bool,

    /// Users who are direct members
    #[serde(default)]
    pub direct_members: BTreeSet<Uuid>,

    /// Groups whose members are also members of this group
    #[serde(default)]
    pub direct_subgroups: BTreeSet<Uuid>,

    /// When the group was created
    pub date_created: DateTime<Utc>,
}

impl UserGroup {
    /// Create a system group for a realm.
    pub fn system(realm_id: Uuid, group: SystemGroup) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: Some(group.name().to_string()),
            description: group.description().to_string(),
            is_system_group: true,
            direct_members: BTreeSet::new(),
            direct_subgroups: BTreeSet::new(),
            date_created: Utc::now(),
        }
    }

    /// Create a user-defined named group.
    pub fn named(realm_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: Some(name.into()),
            description: String::new(),
            is_system_group: false,
            direct_members: BTreeSet::new(),
            direct_subgroups: BTreeSet::new(),
            date_created: Utc::now(),
        }
    }

    /// Create an anonymous group backing a permission setting.
    pub fn anonymous(realm_id: Uuid, members: &[Uuid], subgroups: &[Uuid]) -> Self {
        Self {
            id: Uuid::now_v7(),
            realm_id,
            name: None,
            description: String::new(),
            is_system_group: false,
            direct_members: members.iter().copied().collect(),
            direct_subgroups: subgroups.iter().copied().collect(),
            date_created: Utc::now(),
        }
    }

    /// Add direct members.
    pub fn with_members(mut self, members: impl IntoIterator<Item = Uuid>) -> Self {
        self.direct_members.extend(members);
        self
    }

    /// The system group this record represents, if any.
    pub fn system_group(&self) -> Option<SystemGroup> {
        if !self.is_system_group {
            return None;
        }
        self.name.as_deref().and_then(SystemGroup::from_name)
    }

    /// Whether the group has no name.
    pub fn is_anonymous(&self) -> bool {
        self.name.is_none()
    }

    /// Name used in error messages.
    pub fn display_name(&self) -> &str {
        self.name.as_deref().unwrap_or("")
    }
}

/// Members and subgroups of an anonymous group, as sent by clients.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnonymousGroup {
    /// Direct member user ids
    #[serde(default)]
    pub direct_members: Vec<Uuid>,

    /// Direct subgroup ids
    #[serde(default)]
    pub direct_subgroups: Vec<Uuid>,
}

/// Value of a permission-group setting.
///
/// Serialized untagged: a bare group id, or an object with
/// `direct_members` and `direct_subgroups`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum GroupSettingValue {
    /// A named group, referenced by id
    Named(Uuid),

    /// An ad-hoc group
    Anonymous(AnonymousGroup),
}

impl GroupSettingValue {
    /// Build an anonymous value.
    pub fn anonymous(members: Vec<Uuid>, subgroups: Vec<Uuid>) -> Self {
        Self::Anonymous(AnonymousGroup {
            direct_members: members,
            direct_subgroups: subgroups,
        })
    }

    /// Collapse an anonymous value that is just one subgroup into a named
    /// reference to that subgroup.
    pub fn simplify(self) -> Self {
        match self {
            Self::Anonymous(AnonymousGroup {
                direct_members,
                direct_subgroups,
            }) if direct_members.is_empty() && direct_subgroups.len() == 1 => {
                Self::Named(direct_subgroups[0])
            }
            other => other,
        }
    }

    /// Whether this is an anonymous value with no members and no subgroups.
    pub fn is_empty_anonymous(&self) -> bool {
        matches!(
            self,
            Self::Anonymous(g) if g.direct_members.is_empty() && g.direct_subgroups.is_empty()
        )
    }
}

/// Client update for a permission-group setting.
///
/// When `old` is present the update is a compare-and-set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GroupSettingUpdate {
    /// Desired value
    pub new: GroupSettingValue,

    /// Expected current value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub old: Option<GroupSettingValue>,
}

impl GroupSettingUpdate {
    /// Update without a compare-and-set guard.
    pub fn set(new: GroupSettingValue) -> Self {
        Self { new, old: None }
    }

    /// Update guarded by the expected current value.
    pub fn replace(new: GroupSettingValue, old: GroupSettingValue) -> Self {
        Self { new, old: Some(old) }
    }
}

/// Plan required before a setting may leave its default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlanGate {
    /// Available on every plan
    None,
    /// Free plan restricted to administrative groups
    Standard,
    /// Only Plus and self-hosted may change it
    Plus,
}

/// Constraints on the groups a permission setting may point at.
#[derive(Debug, Clone)]
pub struct GroupSettingConfig {
    /// Setting accepts only named system groups
    pub require_system_group: bool,
    /// `role:internet` is accepted
    pub allow_internet_group: bool,
    /// `role:nobody` is accepted
    pub allow_nobody_group: bool,
    /// `role:everyone` is accepted
    pub allow_everyone_group: bool,
    /// Explicit allow-list of system groups (empty = any)
    pub allowed_system_groups: &'static [SystemGroup],
    /// Default for new realms
    pub default_group: SystemGroup,
    /// Default for education realms, when stricter
    pub default_for_education: Option<SystemGroup>,
    /// Only owners may change the setting
    pub owner_only: bool,
    /// Plan gate
    pub plan_gate: PlanGate,
}

/// Groups the free plan may use for settings gated on Cloud Standard.
pub const LIMITED_PLAN_GROUPS: &[SystemGroup] = &[
    SystemGroup::Owners,
    SystemGroup::Administrators,
    SystemGroup::Moderators,
    SystemGroup::Nobody,
];

/// Realm permissions governed by a group.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum GroupSetting {
    CanAccessAllUsersGroup,
    CanAddSubscribersGroup,
    CanCreateGroups,
    CanCreatePrivateChannelGroup,
    CanCreatePublicChannelGroup,
    CanCreateWebPublicChannelGroup,
    CanDeleteAnyMessageGroup,
    CanDeleteOwnMessageGroup,
    CanInviteUsersGroup,
    CanManageAllGroups,
    CanMoveMessagesBetweenChannelsGroup,
    CanMoveMessagesBetweenTopicsGroup,
    CreateMultiuseInviteGroup,
    DirectMessagePermissionGroup,
}

impl GroupSetting {
    /// Every realm permission-group setting.
    pub const ALL: [GroupSetting; 14] = [
        GroupSetting::CanAccessAllUsersGroup,
        GroupSetting::CanAddSubscribersGroup,
        GroupSetting::CanCreateGroups,
        GroupSetting::CanCreatePrivateChannelGroup,
        GroupSetting::CanCreatePublicChannelGroup,
        GroupSetting::CanCreateWebPublicChannelGroup,
        GroupSetting::CanDeleteAnyMessageGroup,
        GroupSetting::CanDeleteOwnMessageGroup,
        GroupSetting::CanInviteUsersGroup,
        GroupSetting::CanManageAllGroups,
        GroupSetting::CanMoveMessagesBetweenChannelsGroup,
        GroupSetting::CanMoveMessagesBetweenTopicsGroup,
        GroupSetting::CreateMultiuseInviteGroup,
        GroupSetting::DirectMessagePermissionGroup,
    ];

    /// API name of the setting.
    pub fn name(&self) -> &'static str {
        match self {
            Self::CanAccessAllUsersGroup => "can_access_all_users_group",
            Self::CanAddSubscribersGroup => "can_add_subscribers_group",
            Self::CanCreateGroups => "can_create_groups",
            Self::CanCreatePrivateChannelGroup => "can_create_private_channel_group",
            Self::CanCreatePublicChannelGroup => "can_create_public_channel_group",
            Self::CanCreateWebPublicChannelGroup => "can_create_web_public_channel_group",
            Self::CanDeleteAnyMessageGroup => "can_delete_any_message_group",
            Self::CanDeleteOwnMessageGroup => "can_delete_own_message_group",
            Self::CanInviteUsersGroup => "can_invite_users_group",
            Self::CanManageAllGroups => "can_manage_all_groups",
            Self::CanMoveMessagesBetweenChannelsGroup => "can_move_messages_between_channels_group",
            Self::CanMoveMessagesBetweenTopicsGroup => "can_move_messages_between_topics_group",
            Self::CreateMultiuseInviteGroup => "create_multiuse_invite_group",
            Self::DirectMessagePermissionGroup => "direct_message_permission_group",
        }
    }

    /// Look up a setting by API name.
    pub fn parse(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|s| s.name() == name)
    }

    /// Constraints for this setting.
    pub fn config(&self) -> GroupSettingConfig {
        let base = GroupSettingConfig {
            require_system_group: false,
            allow_internet_group: false,
            allow_nobody_group: true,
            allow_everyone_group: false,
            allowed_system_groups: &[],
            default_group: SystemGroup::Members,
            default_for_education: None,
            owner_only: false,
            plan_gate: PlanGate::None,
        };

        match self {
            Self::CanAccessAllUsersGroup => GroupSettingConfig {
                require_system_group: true,
                allow_nobody_group: false,
                allow_everyone_group: true,
                allowed_system_groups: &[SystemGroup::Everyone, SystemGroup::Members],
                default_group: SystemGroup::Everyone,
                plan_gate: PlanGate::Plus,
                ..base
            },
            Self::CanAddSubscribersGroup => GroupSettingConfig {
                default_for_education: Some(SystemGroup::Moderators),
                ..base
            },
            Self::CanCreateGroups => GroupSettingConfig {
                default_for_education: Some(SystemGroup::Moderators),
                owner_only: true,
                plan_gate: PlanGate::Standard,
                ..base
            },
            Self::CanCreatePrivateChannelGroup => base,
            Self::CanCreatePublicChannelGroup => GroupSettingConfig {
                default_for_education: Some(SystemGroup::Administrators),
                ..base
            },
            Self::CanCreateWebPublicChannelGroup => GroupSettingConfig {
                require_system_group: true,
                allowed_system_groups: &[
                    SystemGroup::Moderators,
                    SystemGroup::Administrators,
                    SystemGroup::Owners,
                    SystemGroup::Nobody,
                ],
                default_group: SystemGroup::Owners,
                ..base
            },
            Self::CanDeleteAnyMessageGroup => GroupSettingConfig {
                allow_everyone_group: true,
                default_group: SystemGroup::Administrators,
                ..base
            },
            Self::CanDeleteOwnMessageGroup => GroupSettingConfig {
                allow_everyone_group: true,
                default_group: SystemGroup::Everyone,
                ..base
            },
            Self::CanInviteUsersGroup => GroupSettingConfig {
                default_for_education: Some(SystemGroup::Administrators),
                owner_only: true,
                ..base
            },
            Self::CanManageAllGroups => GroupSettingConfig {
                default_group: SystemGroup::Owners,
                owner_only: true,
                plan_gate: PlanGate::Standard,
                ..base
            },
            Self::CanMoveMessagesBetweenChannelsGroup => GroupSettingConfig {
                allow_everyone_group: true,
                default_for_education: Some(SystemGroup::Moderators),
                ..base
            },
            Self::CanMoveMessagesBetweenTopicsGroup => GroupSettingConfig {
                allow_everyone_group: true,
                default_group: SystemGroup::Everyone,
                ..base
            },
            Self::CreateMultiuseInviteGroup => GroupSettingConfig {
                require_system_group: true,
                default_group: SystemGroup::Administrators,
                ..base
            },
            Self::DirectMessagePermissionGroup => GroupSettingConfig {
                allow_everyone_group: true,
                default_group: SystemGroup::Everyone,
                ..base
            },
        }
    }

    /// Default group for a new realm.
    pub fn default_group(&self, is_education: bool) -> SystemGroup {
        let config = self.config();
        match config.default_for_education {
            Some(group) if is_education => group,
            _ => config.default_group,
        }
    }

    /// Check that a system group is acceptable for this setting.
    pub fn check_system_group(&self, group: SystemGroup) -> RealmResult<()> {
        let config = self.config();
        let disallowed = (group == SystemGroup::Internet && !config.allow_internet_group)
            || (group == SystemGroup::Nobody && !config.allow_nobody_group)
            || (group == SystemGroup::Everyone && !config.allow_everyone_group)
            || (!config.allowed_system_groups.is_empty()
                && !config.allowed_system_groups.contains(&group));

        if disallowed {
            return Err(RealmError::GroupNotAllowed {
                setting: self.name().to_string(),
                group: group.name().to_string(),
            });
        }
        Ok(())
    }
}
