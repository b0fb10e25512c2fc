//! Realm scrubbing
//!
//! Scrubbing permanently removes a realm's content and anonymizes its users.
//! The realm row, its users and its audit log survive.

use realm_events::RealmEvent;
use realm_org::RealmResult;
use tracing::{info, warn};
use uuid::Uuid;

use crate::audit::{AuditLogEntry, AuditLogEventType};
use crate::confirmation::generate_random_token;
use crate::service::RealmService;

/// Length of the random part of scrubbed names and addresses.
const SCRUBBED_TOKEN_LENGTH: usize = 15;

impl RealmService {
    /// Delete a realm's content and anonymize its users.
    pub async fn scrub_realm(&self, realm_id: Uuid, acting_user: Option<Uuid>) -> RealmResult<()> {
        let realm = self.get_realm(realm_id).await?;

        let already_scrubbed = self
            .store
            .list_audit_log(realm.id)
            .await?
            .iter()
            .any(|entry| entry.event_type == AuditLogEventType::RealmScrubbed);
        if already_scrubbed {
            warn!(realm_id = %realm.id, "Realm has already been scrubbed");
        }

        let attachments = self
            .delete_all_realm_attachments(realm.id, self.config.attachment_delete_batch_size)
            .await?;

        let users = self.store.list_users(realm.id).await?;
        let user_ids: Vec<Uuid> = users.iter().map(|u| u.id).collect();
        let messages = self.store.delete_realm_messages(realm.id).await?;
        self.store.delete_user_messages_for_users(&user_ids).await?;
        self.store.delete_custom_profile_fields(realm.id).await?;
        self.store.delete_scheduled_emails(realm.id).await?;

        let host = realm.host(&self.config.external_host);
        for mut user in users {
            let token = generate_random_token(SCRUBBED_TOKEN_LENGTH);
            user.full_name = format!("Scrubbed {}", token);
            let address = format!("scrubbed-{}@{}", token, host);
            user.email = address.clone();
            user.delivery_email = address;
            self.store.update_user(&user).await?;
        }

        self.audit(
            AuditLogEntry::new(realm.id, AuditLogEventType::RealmScrubbed)
                .with_acting_user(acting_user),
        )
        .await?;
        self.publish(realm.id, acting_user, RealmEvent::Scrubbed { realm_id: realm.id })
            .await;

        info!(
            realm_id = %realm.id,
            messages,
            attachments,
            "Scrubbed realm"
        );
        Ok(())
    }

    /// Delete every upload of a realm, `batch_size` files at a time.
    ///
    /// Returns the number of attachments deleted.
    pub async fn delete_all_realm_attachments(
        &self,
        realm_id: Uuid,
        batch_size: usize,
    ) -> RealmResult<usize> {
        let mut attachments = self.store.list_attachments(realm_id).await?;
        attachments.sort_by(|a, b| a.create_time.cmp(&b.create_time).then(a.id.cmp(&b.id)));

        let mut deleted = 0;
        for chunk in attachments.chunks(batch_size.max(1)) {
            let paths: Vec<String> = chunk.iter().map(|a| a.path_id.clone()).collect();
            let ids: Vec<Uuid> = chunk.iter().map(|a| a.id).collect();
            self.uploads.delete_files(&paths).await?;
            deleted += self.store.delete_attachments(&ids).await?;
        }
        Ok(deleted)
    }
}
