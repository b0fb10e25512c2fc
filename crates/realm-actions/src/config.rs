//! Server configuration for realm actions.
//!
//! Configuration is loaded from environment variables with defaults suitable
//! for local development and tests.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Configuration errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Missing required environment variable.
    #[error("Missing required environment variable: {0}")]
    MissingEnvVar(String),

    /// Invalid configuration value.
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue {
        /// Configuration key.
        key: String,
        /// Error message.
        message: String,
    },
}

/// Authentication backends a realm can enable.
pub const DEFAULT_AUTHENTICATION_BACKENDS: &[&str] =
    &["Email", "Dev", "GitHub", "Google", "AzureAD", "SAML"];

/// Server-wide settings consulted by realm actions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RealmConfig {
    /// Host realms are served under (realm `acme` lives at `acme.<host>`).
    pub external_host: String,

    /// Whether billing is enabled (new realms start on the free plan).
    pub billing_enabled: bool,

    /// Subdomain of the realm holding the system bots.
    pub system_bot_realm: String,

    /// The root domain serves a landing page, so no realm may live there.
    pub root_domain_landing_page: bool,

    /// Subdomain used for the social authentication flow (reserved).
    pub social_auth_subdomain: Option<String>,

    /// Subdomain used for self-hosting management (reserved).
    pub self_hosting_management_subdomain: Option<String>,

    /// Minimum deletion delay owners may request, in days (None = no minimum).
    pub min_deactivated_realm_deletion_days: Option<u32>,

    /// Maximum deletion delay owners may request, in days (None = no maximum).
    pub max_deactivated_realm_deletion_days: Option<u32>,

    /// Daily invitation cap for realms without a plan-specific cap.
    pub invites_default_realm_daily_max: u32,

    /// Days a confirmation link stays valid.
    pub confirmation_link_validity_days: i64,

    /// Days until a new demo organization expires.
    pub demo_org_deadline_days: i64,

    /// Attachments deleted per storage call when scrubbing.
    pub attachment_delete_batch_size: usize,

    /// Whether web-public channels are allowed on this server.
    pub web_public_streams_enabled: bool,

    /// BigBlueButton credentials are configured.
    pub big_blue_button_configured: bool,

    /// Zoom OAuth credentials are configured.
    pub zoom_configured: bool,

    /// Zoom server-to-server credentials are configured.
    pub zoom_server_to_server_configured: bool,

    /// Authentication backends enabled on the server.
    pub authentication_backends: Vec<String>,
}

impl Default for RealmConfig {
    /// Returns default configuration suitable for local development.
    fn default() -> Self {
        Self {
            external_host: "localhost:9991".to_string(),
            billing_enabled: false,
            system_bot_realm: "zulipinternal".to_string(),
            root_domain_landing_page: false,
            social_auth_subdomain: Some("auth".to_string()),
            self_hosting_management_subdomain: Some("selfhosting".to_string()),
            min_deactivated_realm_deletion_days: Some(14),
            max_deactivated_realm_deletion_days: None,
            invites_default_realm_daily_max: 100,
            confirmation_link_validity_days: 1,
            demo_org_deadline_days: 30,
            attachment_delete_batch_size: 1000,
            web_public_streams_enabled: true,
            big_blue_button_configured: false,
            zoom_configured: false,
            zoom_server_to_server_configured: false,
            authentication_backends: DEFAULT_AUTHENTICATION_BACKENDS
                .iter()
                .map(|s| s.to_string())
                .collect(),
        }
    }
}

impl RealmConfig {
    /// Load configuration from environment variables.
    ///
    /// Environment variables:
    /// - `EXTERNAL_HOST`: Host realms are served under (default: localhost:9991)
    /// - `BILLING_ENABLED`: Whether billing is enabled (default: false)
    /// - `SYSTEM_BOT_REALM`: Internal realm subdomain (default: zulipinternal)
    /// - `ROOT_DOMAIN_LANDING_PAGE`: Keep the root domain free of realms (default: false)
    /// - `SOCIAL_AUTH_SUBDOMAIN`: Reserved auth subdomain (default: auth)
    /// - `SELF_HOSTING_MANAGEMENT_SUBDOMAIN`: Reserved subdomain (default: selfhosting)
    /// - `MIN_DEACTIVATED_REALM_DELETION_DAYS`: Minimum deletion delay, `none` to disable (default: 14)
    /// - `MAX_DEACTIVATED_REALM_DELETION_DAYS`: Maximum deletion delay (default: unset)
    /// - `INVITES_DEFAULT_REALM_DAILY_MAX`: Default daily invitation cap (default: 100)
    /// - `CONFIRMATION_LINK_DEFAULT_VALIDITY_DAYS`: Link validity (default: 1)
    /// - `DEMO_ORG_DEADLINE_DAYS`: Demo organization lifetime (default: 30)
    /// - `ATTACHMENT_DELETE_BATCH_SIZE`: Files per storage delete call (default: 1000)
    /// - `WEB_PUBLIC_STREAMS_ENABLED`: Allow web-public channels (default: true)
    /// - `BIG_BLUE_BUTTON_SECRET`: Enables the BigBlueButton provider when set
    /// - `VIDEO_ZOOM_CLIENT_ID`: Enables the Zoom provider when set
    /// - `VIDEO_ZOOM_SERVER_TO_SERVER_ACCOUNT_ID`: Enables Zoom server-to-server when set
    /// - `AUTHENTICATION_BACKENDS`: Comma-separated backend names
    pub fn from_env() -> Self {
        let default = Self::default();

        Self {
            external_host: std::env::var("EXTERNAL_HOST").unwrap_or(default.external_host),
            billing_enabled: env_flag("BILLING_ENABLED").unwrap_or(default.billing_enabled),
            system_bot_realm: std::env::var("SYSTEM_BOT_REALM").unwrap_or(default.system_bot_realm),
            root_domain_landing_page: env_flag("ROOT_DOMAIN_LANDING_PAGE")
                .unwrap_or(default.root_domain_landing_page),
            social_auth_subdomain: env_optional("SOCIAL_AUTH_SUBDOMAIN")
                .unwrap_or(default.social_auth_subdomain),
            self_hosting_management_subdomain: env_optional("SELF_HOSTING_MANAGEMENT_SUBDOMAIN")
                .unwrap_or(default.self_hosting_management_subdomain),
            min_deactivated_realm_deletion_days: env_optional_number(
                "MIN_DEACTIVATED_REALM_DELETION_DAYS",
            )
            .unwrap_or(default.min_deactivated_realm_deletion_days),
            max_deactivated_realm_deletion_days: env_optional_number(
                "MAX_DEACTIVATED_REALM_DELETION_DAYS",
            )
            .unwrap_or(default.max_deactivated_realm_deletion_days),
            invites_default_realm_daily_max: env_number("INVITES_DEFAULT_REALM_DAILY_MAX")
                .unwrap_or(default.invites_default_realm_daily_max),
            confirmation_link_validity_days: env_number("CONFIRMATION_LINK_DEFAULT_VALIDITY_DAYS")
                .unwrap_or(default.confirmation_link_validity_days),
            demo_org_deadline_days: env_number("DEMO_ORG_DEADLINE_DAYS")
                .unwrap_or(default.demo_org_deadline_days),
            attachment_delete_batch_size: env_number("ATTACHMENT_DELETE_BATCH_SIZE")
                .unwrap_or(default.attachment_delete_batch_size),
            web_public_streams_enabled: env_flag("WEB_PUBLIC_STREAMS_ENABLED")
                .unwrap_or(default.web_public_streams_enabled),
            big_blue_button_configured: std::env::var("BIG_BLUE_BUTTON_SECRET").is_ok(),
            zoom_configured: std::env::var("VIDEO_ZOOM_CLIENT_ID").is_ok(),
            zoom_server_to_server_configured: std::env::var(
                "VIDEO_ZOOM_SERVER_TO_SERVER_ACCOUNT_ID",
            )
            .is_ok(),
            authentication_backends: std::env::var("AUTHENTICATION_BACKENDS")
                .map(|s| {
                    s.split(',')
                        .map(str::trim)
                        .filter(|b| !b.is_empty())
                        .map(String::from)
                        .collect()
                })
                .unwrap_or(default.authentication_backends),
        }
    }

    /// Check that the configuration is internally consistent.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.external_host.is_empty() {
            return Err(ConfigError::MissingEnvVar("EXTERNAL_HOST".to_string()));
        }
        if let (Some(min), Some(max)) = (
            self.min_deactivated_realm_deletion_days,
            self.max_deactivated_realm_deletion_days,
        ) {
            if min > max {
                return Err(ConfigError::InvalidValue {
                    key: "MIN_DEACTIVATED_REALM_DELETION_DAYS".to_string(),
                    message: format!("{} exceeds the maximum of {}", min, max),
                });
            }
        }
        if self.attachment_delete_batch_size == 0 {
            return Err(ConfigError::InvalidValue {
                key: "ATTACHMENT_DELETE_BATCH_SIZE".to_string(),
                message: "must be positive".to_string(),
            });
        }
        if self.authentication_backends.is_empty() {
            return Err(ConfigError::MissingEnvVar("AUTHENTICATION_BACKENDS".to_string()));
        }
        Ok(())
    }

    /// Whether a subdomain is reserved for the server itself.
    pub fn is_reserved_subdomain(&self, subdomain: &str) -> bool {
        [
            self.social_auth_subdomain.as_deref(),
            self.self_hosting_management_subdomain.as_deref(),
        ]
        .into_iter()
        .flatten()
        .any(|reserved| reserved == subdomain)
    }

    /// Base URL of the server.
    pub fn server_url(&self) -> String {
        format!("https://{}", self.external_host)
    }
}

fn env_flag(key: &str) -> Option<bool> {
    std::env::var(key).ok().map(|s| s != "false" && s != "0")
}

fn env_number<T: std::str::FromStr>(key: &str) -> Option<T> {
    std::env::var(key).ok().and_then(|s| s.parse().ok())
}

/// `Some(None)` when the variable is set to `none` or empty.
fn env_optional(key: &str) -> Option<Option<String>> {
    std::env::var(key).ok().map(|s| {
        if s.is_empty() || s.eq_ignore_ascii_case("none") {
            None
        } else {
            Some(s)
        }
    })
}

fn env_optional_number<T: std::str::FromStr>(key: &str) -> Option<Option<T>> {
    env_optional(key).map(|value| value.and_then(|s| s.parse().ok()))
}
