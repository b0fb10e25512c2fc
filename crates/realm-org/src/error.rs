//! Error types for realm operations
//!
//! Every failure a realm action or settings validator can report is a
//! `RealmError`. The `Display` text is the user-visible message returned by
//! the API, so the wording of each variant is part of the contract.

use thiserror::Error;

/// Realm error types.
///
/// Validation errors name the offending field. Authorization errors
/// distinguish administrator-only from owner-only operations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RealmError {
    /// Acting user is not an administrator
    #[error("Must be an organization administrator")]
    MustBeAdministrator,

    /// Acting user is not an owner
    #[error("Must be an organization owner")]
    MustBeOwner,

    /// Setting requires a higher plan (e.g. "Cloud Standard")
    #[error("Available on {0}. Upgrade to access.")]
    UpgradeRequired(&'static str),

    /// String value exceeds the field's limit
    #[error("{field} is too long (limit: {limit} characters)")]
    TooLong {
        /// Field name
        field: String,
        /// Maximum number of characters
        limit: usize,
    },

    /// Value has the right type but is out of range
    #[error("Bad value for '{field}': {value}")]
    BadValue {
        /// Field name
        field: String,
        /// Rejected value as sent by the client
        value: String,
    },

    /// Value is not one of the known ids for an id-valued field
    #[error("Invalid {field} {value}")]
    InvalidId {
        /// Field name
        field: String,
        /// Rejected id
        value: String,
    },

    /// Value is not accepted for this field
    #[error("Invalid {0}")]
    Invalid(String),

    /// Value is not one of the declared choices
    #[error("Invalid {0}: Value error, Not in the list of possible values")]
    NotAChoice(String),

    /// Value has the wrong JSON type
    #[error("{field} is not {expected}")]
    WrongType {
        /// Field name
        field: String,
        /// Expected type, with article ("a string")
        expected: &'static str,
    },

    /// Value matches none of the accepted shapes
    #[error("{0} is not an allowed_type")]
    NotAllowedType(String),

    /// Designated channel does not exist in the realm
    #[error("Invalid channel ID")]
    InvalidChannel,

    /// Moderation request channel is public
    #[error("Moderation request channel must be private.")]
    ModerationChannelNotPrivate,

    /// Unknown language code
    #[error("Invalid language '{0}'")]
    InvalidLanguage(String),

    /// Group is not permitted for a permission setting
    #[error("'{setting}' setting cannot be set to '{group}' group.")]
    GroupNotAllowed {
        /// Setting name
        setting: String,
        /// Group name
        group: String,
    },

    /// Setting only accepts named system groups
    #[error("'{0}' must be a system user group.")]
    SystemGroupRequired(String),

    /// Compare-and-set mismatch on a permission setting
    #[error("'old' value does not match the expected value.")]
    StaleGroupSetting,

    /// Group id does not exist in the realm
    #[error("Invalid user group ID: {0}")]
    InvalidUserGroup(String),

    /// Operation only applies to demo organizations
    #[error("Must be a demo organization.")]
    NotDemoOrganization,

    /// Demo organization owner has no email address yet
    #[error("Configure owner account email address.")]
    OwnerEmailRequired,

    /// Subdomain is taken
    #[error("Subdomain is already in use. Please choose a different one.")]
    SubdomainUnavailable,

    /// Subdomain is reserved for the server
    #[error("Subdomain reserved. Please choose a different one.")]
    SubdomainReserved,

    /// Subdomain contains characters other than `[a-z0-9-]`
    #[error("Subdomain can only have lowercase letters, numbers, and '-'s.")]
    SubdomainInvalid,

    /// Deletion delay below the configured minimum
    #[error("Data deletion time must be at least {0} days in the future.")]
    DeletionTooSoon(u32),

    /// Deletion delay above the configured maximum
    #[error("Data deletion time must be at most {0} days in the future.")]
    DeletionTooLate(u32),

    /// Reactivation confirmation key is unknown or already used
    #[error("The organization reactivation link has expired or is not valid.")]
    InvalidReactivationLink,

    /// Notification sound is not one of the shipped sounds
    #[error("Invalid notification sound '{0}'")]
    InvalidNotificationSound(String),

    /// Email batching period outside `1..=7 days`
    #[error("Invalid email batching period: {0} seconds")]
    InvalidBatchingPeriod(i64),

    /// Turning off every authentication method
    #[error("At least one authentication method must be enabled.")]
    NoAuthenticationMethods,

    /// Other invalid input, message passed through verbatim
    #[error("{0}")]
    InvalidArgument(String),

    /// Referenced record does not exist
    #[error("{0} not found")]
    NotFound(String),

    /// Storage or collaborator failure
    #[error("Internal error: {0}")]
    Internal(String),
}

/// Result type for realm operations.
pub type RealmResult<T> = Result<T, RealmError>;

impl RealmError {
    /// Shorthand for a `BadValue` error.
    pub fn bad_value(field: impl Into<String>, value: impl ToString) -> Self {
        RealmError::BadValue {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Shorthand for an `InvalidId` error.
    pub fn invalid_id(field: impl Into<String>, value: impl ToString) -> Self {
        RealmError::InvalidId {
            field: field.into(),
            value: value.to_string(),
        }
    }

    /// Check if this error should be logged at error level.
    ///
    /// Validation and authorization failures are expected client errors.
    pub fn is_server_error(&self) -> bool {
        matches!(self, RealmError::Internal(_))
    }

    /// Get HTTP status code for this error.
    pub fn status_code(&self) -> u16 {
        match self {
            RealmError::MustBeAdministrator | RealmError::MustBeOwner => 403,
            RealmError::NotFound(_) => 404,
            RealmError::SubdomainUnavailable => 409,
            RealmError::Internal(_) => 500,
            _ => 400,
        }
    }

    /// Get error code for API responses.
    pub fn error_code(&self) -> &'static str {
        match self {
            RealmError::MustBeAdministrator | RealmError::MustBeOwner => "UNAUTHORIZED_PRINCIPAL",
            RealmError::UpgradeRequired(_) => "PLAN_UPGRADE_REQUIRED",
            RealmError::GroupNotAllowed { .. }
            | RealmError::SystemGroupRequired(_)
            | RealmError::InvalidUserGroup(_) => "BAD_GROUP_SETTING",
            RealmError::StaleGroupSetting => "EXPECTATION_MISMATCH",
            RealmError::SubdomainUnavailable
            | RealmError::SubdomainReserved
            | RealmError::SubdomainInvalid => "BAD_SUBDOMAIN",
            RealmError::InvalidReactivationLink => "CONFIRMATION_INVALID",
            RealmError::NotFound(_) => "NOT_FOUND",
            RealmError::Internal(_) => "INTERNAL_ERROR",
            _ => "BAD_REQUEST",
        }
    }
}
