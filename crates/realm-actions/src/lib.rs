//! # Realm Actions
//!
//! Service layer for realm settings and lifecycle. Every action persists
//! through a [`RealmStore`], appends to the realm audit log and publishes a
//! [`realm_events::RealmEvent`].
//!
//! ## Overview
//!
//! - **Creation**: New realms with system groups, a default channel and user defaults
//! - **Settings**: Validated property PATCHes, group settings, plans and auth methods
//! - **Lifecycle**: Deactivation, reactivation links, subdomain changes, scrubbing
//! - **Sweeps**: Deleting data of expired deactivated realms and demo organizations
//!
//! ## Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use realm_actions::{
//!     CreateRealmOptions, MemoryOutbox, MemoryRealmStore, MemoryUploadBackend, RealmConfig,
//!     RealmService,
//! };
//! use realm_events::MemoryEventBus;
//!
//! async fn example() {
//!     let service = RealmService::new(
//!         Arc::new(MemoryRealmStore::new()),
//!         Arc::new(MemoryEventBus::new()),
//!         Arc::new(MemoryOutbox::new()),
//!         Arc::new(MemoryUploadBackend::new()),
//!         RealmConfig::default(),
//!     );
//!
//!     let realm = service
//!         .create_realm("acme", "Acme Corp", CreateRealmOptions::default())
//!         .await
//!         .unwrap();
//!     assert_eq!(realm.string_id, "acme");
//! }
//! ```

pub mod audit;
pub mod cache;
pub mod config;
pub mod confirmation;
pub mod create;
pub mod email;
pub mod groups;
pub mod lifecycle;
pub mod plan;
pub mod properties;
pub mod scrub;
pub mod service;
pub mod store;
pub mod streams;
pub mod uploads;
pub mod user_defaults;

pub use audit::{AuditLogEntry, AuditLogEventType};
pub use cache::{RealmCache, RenderedDescription};
pub use config::{ConfigError, RealmConfig};
pub use confirmation::{Confirmation, ConfirmationType};
pub use create::CreateRealmOptions;
pub use email::{EmailSender, MemoryOutbox, OutgoingEmail};
pub use groups::GroupSettingChange;
pub use lifecycle::{DeactivationOptions, DeactivationReason};
pub use properties::UpdateRealmResponse;
pub use service::RealmService;
pub use store::{MemoryRealmStore, RealmStore};
pub use uploads::{MemoryUploadBackend, UploadBackend};
