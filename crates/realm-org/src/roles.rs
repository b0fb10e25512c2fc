//! User roles within a realm
//!
//! Roles are hierarchical. Each role implies every permission of the roles
//! below it, and each role maps onto one of the role-derived system groups.

use serde::{Deserialize, Serialize};

use crate::groups::SystemGroup;

/// Role of a user within a realm.
///
/// The hierarchy is: Guest < Member < Moderator < Administrator < Owner
///
/// # Examples
///
/// ```
/// use realm_org::UserRole;
///
/// assert!(UserRole::Owner.is_administrator());
/// assert!(!UserRole::Moderator.is_administrator());
/// assert!(UserRole::Member > UserRole::Guest);
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(rename_all = "snake_case")]
pub enum UserRole {
    /// Limited access, sees only channels they are subscribed to
    Guest = 0,

    /// Regular member
    Member = 1,

    /// Can moderate content
    Moderator = 2,

    /// Can change most realm settings
    Administrator = 3,

    /// Full realm control, including owner-only settings and deactivation
    Owner = 4,
}

impl UserRole {
    /// Check if this role has administrator privileges.
    ///
    /// # Returns
    ///
    /// `true` for Administrator and Owner roles
    pub fn is_administrator(&self) -> bool {
        *self >= UserRole::Administrator
    }

    /// Check if this role is the owner role.
    pub fn is_owner(&self) -> bool {
        *self == UserRole::Owner
    }

    /// Check if this role has moderator privileges.
    pub fn is_moderator(&self) -> bool {
        *self >= UserRole::Moderator
    }

    /// The system group holding exactly the users with this role.
    pub fn system_group(&self) -> SystemGroup {
        match self {
            Self::Guest => SystemGroup::Everyone,
            Self::Member => SystemGroup::Members,
            Self::Moderator => SystemGroup::Moderators,
            Self::Administrator => SystemGroup::Administrators,
            Self::Owner => SystemGroup::Owners,
        }
    }

    /// Parse role from string representation.
    ///
    /// # Examples
    ///
    /// ```
    /// use realm_org::UserRole;
    ///
    /// assert_eq!(UserRole::parse("owner"), Some(UserRole::Owner));
    /// assert_eq!(UserRole::parse("ADMINISTRATOR"), Some(UserRole::Administrator));
    /// assert_eq!(UserRole::parse("invalid"), None);
    /// ```
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "guest" => Some(Self::Guest),
            "member" => Some(Self::Member),
            "moderator" => Some(Self::Moderator),
            "administrator" | "admin" => Some(Self::Administrator),
            "owner" => Some(Self::Owner),
            _ => None,
        }
    }

    /// Get string representation of the role.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Guest => "guest",
            Self::Member => "member",
            Self::Moderator => "moderator",
            Self::Administrator => "administrator",
            Self::Owner => "owner",
        }
    }

    /// Get a human-readable display name for the role.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Guest => "Guest",
            Self::Member => "Member",
            Self::Moderator => "Moderator",
            Self::Administrator => "Administrator",
            Self::Owner => "Owner",
        }
    }
}

impl Default for UserRole {
    fn default() -> Self {
        Self::Member
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_hierarchy() {
        assert!(UserRole::Owner > UserRole::Administrator);
        assert!(UserRole::Administrator > UserRole::Moderator);
        assert!(UserRole::Moderator > UserRole::Member);
        assert!(UserRole::Member > UserRole::Guest);
    }

    #[test]
    fn test_role_privileges() {
        assert!(UserRole::Owner.is_owner());
        assert!(!UserRole::Administrator.is_owner());
        assert!(UserRole::Administrator.is_administrator());
        assert!(!UserRole::Moderator.is_administrator());
        assert!(UserRole::Moderator.is_moderator());
        assert!(!UserRole::Member.is_moderator());
    }

    #[test]
    fn test_role_parse_roundtrip() {
        for role in [
            UserRole::Guest,
            UserRole::Member,
            UserRole::Moderator,
            UserRole::Administrator,
            UserRole::Owner,
        ] {
            assert_eq!(UserRole::parse(role.as_str()), Some(role));
        }
    }
}
