//! # Realm Organization Model
//!
//! This crate provides the domain model for realms: the tenant
//! organizations of the messaging platform.
//!
//! ## Overview
//!
//! The realm-org crate handles:
//! - **Realms**: Tenant organizations and their configuration
//! - **Plans**: Billing plans, plan limits and organization types
//! - **Roles**: Hierarchical user roles
//! - **Groups**: System groups and permission-group settings
//! - **Settings**: The catalogue of settable realm properties and their validation
//! - **User defaults**: Realm-wide defaults for new users' personal settings
//! - **Content**: Users, channels, messages and uploads that realm actions touch
//!
//! ## Architecture
//!
//! ```text
//! Realm
//!   ├─ PlanType (limits, feature gates)
//!   ├─ RealmProperty values (validated settings)
//!   ├─ GroupSetting ──→ UserGroup
//!   ├─ RealmUserDefault
//!   └─ UserProfile / Stream / Message / Attachment
//! ```
//!
//! ## Usage
//!
//! ```rust,no_run
//! use realm_org::{PlanType, Realm, RealmProperty};
//! use serde_json::json;
//!
//! let mut realm = Realm::new("acme", "Acme Corp", PlanType::SelfHosted);
//!
//! let value = RealmProperty::Description.validate(&json!("We make anvils")).unwrap();
//! realm.set_property(RealmProperty::Description, value);
//! ```
//!
//! Persistence, events and side effects live in `realm-actions`.

pub mod content;
pub mod error;
pub mod groups;
pub mod plans;
pub mod realm;
pub mod roles;
pub mod settings;
pub mod streams;
pub mod user_defaults;
pub mod users;

// Re-export main types for convenience
pub use content::{Attachment, CustomProfileField, Message, ScheduledEmail, ScheduledEmailType, UserMessage};
pub use error::{RealmError, RealmResult};
pub use groups::{
    AnonymousGroup, GroupSetting, GroupSettingConfig, GroupSettingUpdate, GroupSettingValue,
    PlanGate, SystemGroup, UserGroup,
};
pub use plans::{OrgType, PlanLimits, PlanType};
pub use realm::Realm;
pub use roles::UserRole;
pub use settings::{PropertyValue, RealmProperty};
pub use streams::Stream;
pub use user_defaults::RealmUserDefault;
pub use users::UserProfile;
