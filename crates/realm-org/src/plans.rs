//! Plan types, organization types and plan limits
//!
//! The plan type gates paid features and sets per-realm limits. The
//! organization type only changes defaults (education realms get stricter
//! permission defaults) and is otherwise informational.

use serde::{Deserialize, Serialize};

/// Daily invitation cap for realms on a paid or sponsored plan.
pub const INVITES_STANDARD_REALM_DAILY_MAX: u32 = 3000;

/// Message history visible to users of a realm on the free plan.
pub const MESSAGE_VISIBILITY_LIMITED: u32 = 10_000;

/// Upload quota of the free plan, in GB.
pub const UPLOAD_QUOTA_LIMITED_GB: u64 = 5;

/// Upload quota of the sponsored plan, in GB.
pub const UPLOAD_QUOTA_STANDARD_FREE_GB: u64 = 50;

/// Upload quota granted per paid seat on Standard and Plus, in GB.
pub const UPLOAD_QUOTA_PER_USER_GB: u64 = 5;

/// Billing plan of a realm.
///
/// # Examples
///
/// ```
/// use realm_org::PlanType;
///
/// let limits = PlanType::Limited.limits(10);
/// assert_eq!(limits.upload_quota_gb, Some(5));
/// assert_eq!(limits.message_visibility_limit, Some(10_000));
/// assert_eq!(PlanType::from_id(10), Some(PlanType::Plus));
/// ```
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum PlanType {
    /// Self-hosted server; every feature available, no limits
    SelfHosted,

    /// Cloud Free
    Limited,

    /// Cloud Standard
    Standard,

    /// Cloud Standard, sponsored
    StandardFree,

    /// Cloud Plus
    Plus,
}

impl PlanType {
    /// Stable numeric id used on the wire and in audit records.
    pub fn id(&self) -> u32 {
        match self {
            Self::SelfHosted => 1,
            Self::Limited => 2,
            Self::Standard => 3,
            Self::StandardFree => 4,
            Self::Plus => 10,
        }
    }

    /// Look up a plan by numeric id.
    pub fn from_id(id: u32) -> Option<Self> {
        match id {
            1 => Some(Self::SelfHosted),
            2 => Some(Self::Limited),
            3 => Some(Self::Standard),
            4 => Some(Self::StandardFree),
            10 => Some(Self::Plus),
            _ => None,
        }
    }

    /// Get a human-readable display name for the plan.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::SelfHosted => "Self-hosted",
            Self::Limited => "Cloud Free",
            Self::Standard => "Cloud Standard",
            Self::StandardFree => "Cloud Standard (sponsored)",
            Self::Plus => "Cloud Plus",
        }
    }

    /// Whether features gated on Cloud Standard are available.
    pub fn has_standard_features(&self) -> bool {
        !matches!(self, Self::Limited)
    }

    /// Whether features gated on Cloud Plus are available.
    pub fn has_plus_features(&self) -> bool {
        matches!(self, Self::Plus | Self::SelfHosted)
    }

    /// Get the limits for this plan.
    ///
    /// `seat_count` is the number of paid seats; it only matters for plans
    /// whose upload quota scales with seats.
    pub fn limits(&self, seat_count: u32) -> PlanLimits {
        match self {
            Self::SelfHosted => PlanLimits {
                max_invites: None,
                message_visibility_limit: None,
                upload_quota_gb: None,
            },
            Self::Limited => PlanLimits {
                max_invites: None,
                message_visibility_limit: Some(MESSAGE_VISIBILITY_LIMITED),
                upload_quota_gb: Some(UPLOAD_QUOTA_LIMITED_GB),
            },
            Self::StandardFree => PlanLimits {
                max_invites: Some(INVITES_STANDARD_REALM_DAILY_MAX),
                message_visibility_limit: None,
                upload_quota_gb: Some(UPLOAD_QUOTA_STANDARD_FREE_GB),
            },
            Self::Standard | Self::Plus => PlanLimits {
                max_invites: Some(INVITES_STANDARD_REALM_DAILY_MAX),
                message_visibility_limit: None,
                upload_quota_gb: Some(u64::from(seat_count) * UPLOAD_QUOTA_PER_USER_GB),
            },
        }
    }
}

/// Limits attached to a plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanLimits {
    /// Daily invitation cap (None = server default)
    pub max_invites: Option<u32>,

    /// Number of most recent messages visible (None = unlimited)
    pub message_visibility_limit: Option<u32>,

    /// Total upload quota in GB (None = unlimited)
    pub upload_quota_gb: Option<u64>,
}

/// Kind of organization a realm represents.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum OrgType {
    Unspecified,
    Business,
    Opensource,
    EducationNonprofit,
    Education,
    Research,
    Event,
    Nonprofit,
    Government,
    PoliticalGroup,
    Community,
    Personal,
    Other,
}

impl OrgType {
    /// Every organization type, in display order.
    pub const ALL: [OrgType; 13] = [
        OrgType::Unspecified,
        OrgType::Business,
        OrgType::Opensource,
        OrgType::EducationNonprofit,
        OrgType::Education,
        OrgType::Research,
        OrgType::Event,
        OrgType::Nonprofit,
        OrgType::Government,
        OrgType::PoliticalGroup,
        OrgType::Community,
        OrgType::Personal,
        OrgType::Other,
    ];

    /// Stable numeric id.
    pub fn id(&self) -> u32 {
        match self {
            Self::Unspecified => 0,
            Self::Business => 10,
            Self::Opensource => 20,
            Self::EducationNonprofit => 30,
            Self::Education => 35,
            Self::Research => 40,
            Self::Event => 50,
            Self::Nonprofit => 60,
            Self::Government => 70,
            Self::PoliticalGroup => 80,
            Self::Community => 90,
            Self::Personal => 100,
            Self::Other => 1000,
        }
    }

    /// Look up an organization type by numeric id.
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.id() == id)
    }

    /// Get a human-readable display name.
    pub fn display_name(&self) -> &'static str {
        match self {
            Self::Unspecified => "Unspecified",
            Self::Business => "Business",
            Self::Opensource => "Open-source project",
            Self::EducationNonprofit => "Education (non-profit)",
            Self::Education => "Education (for-profit)",
            Self::Research => "Research",
            Self::Event => "Event or conference",
            Self::Nonprofit => "Non-profit (registered)",
            Self::Government => "Government",
            Self::PoliticalGroup => "Political group",
            Self::Community => "Community",
            Self::Personal => "Personal",
            Self::Other => "Other",
        }
    }

    /// Education realms get stricter permission defaults.
    pub fn is_education(&self) -> bool {
        matches!(self, Self::EducationNonprofit | Self::Education)
    }
}

impl Default for OrgType {
    fn default() -> Self {
        Self::Unspecified
    }
}
