//! Single-use confirmation links
//!
//! Links carry a random key. A key is valid until it is used or its
//! validity window passes; every failure looks the same to the caller.

use chrono::{DateTime, Utc};
use rand::Rng;
use realm_org::RealmResult;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::service::days_after;

/// Length of confirmation keys.
pub const CONFIRMATION_KEY_LENGTH: usize = 24;

const TOKEN_ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyz0123456789";

/// Random lowercase alphanumeric string.
pub fn generate_random_token(length: usize) -> String {
    let mut rng = rand::thread_rng();
    (0..length)
        .map(|_| TOKEN_ALPHABET[rng.gen_range(0..TOKEN_ALPHABET.len())] as char)
        .collect()
}

/// What a confirmation link confirms.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ConfirmationType {
    RealmReactivation,
}

impl ConfirmationType {
    /// URL path segment for links of this type.
    pub fn url_path(&self) -> &'static str {
        match self {
            Self::RealmReactivation => "reactivate",
        }
    }
}

/// A pending confirmation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Confirmation {
    /// Secret key embedded in the link
    pub key: String,
    /// Kind of confirmation
    pub confirmation_type: ConfirmationType,
    /// Object the link acts on
    pub object_id: Uuid,
    /// When the link was created
    pub date_sent: DateTime<Utc>,
    /// When the link stops working
    pub expiry_date: DateTime<Utc>,
    /// Whether the link has been used
    pub used: bool,
}

impl Confirmation {
    /// Create a link valid for `validity_days` from now.
    pub fn new(
        confirmation_type: ConfirmationType,
        object_id: Uuid,
        validity_days: i64,
    ) -> RealmResult<Self> {
        let date_sent = Utc::now();
        Ok(Self {
            key: generate_random_token(CONFIRMATION_KEY_LENGTH),
            confirmation_type,
            object_id,
            date_sent,
            expiry_date: days_after(date_sent, validity_days, "confirmation link validity")?,
            used: false,
        })
    }

    /// Link for this confirmation under a server URL.
    pub fn url(&self, server_url: &str) -> String {
        format!(
            "{}/{}/{}",
            server_url.trim_end_matches('/'),
            self.confirmation_type.url_path(),
            self.key
        )
    }

    /// Whether the link can still be used at `now`.
    pub fn is_usable(&self, confirmation_type: ConfirmationType, now: DateTime<Utc>) -> bool {
        !self.used && self.confirmation_type == confirmation_type && now < self.expiry_date
    }
}
