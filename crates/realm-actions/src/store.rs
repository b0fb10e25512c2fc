//! Persistence for realms and the records realm actions touch.
//!
//! The [`RealmStore`] trait is the seam between realm actions and the
//! database. [`MemoryRealmStore`] keeps everything in process and backs
//! single-node deployments and tests.

use async_trait::async_trait;
use realm_org::{
    Attachment, CustomProfileField, Message, Realm, RealmError, RealmResult, RealmUserDefault,
    ScheduledEmail, Stream, UserGroup, UserMessage, UserProfile,
};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::audit::AuditLogEntry;
use crate::confirmation::Confirmation;

/// Storage backend for realm data.
///
/// Lookups of missing records return `Ok(None)`; updates of missing records
/// return [`RealmError::NotFound`].
#[async_trait]
pub trait RealmStore: Send + Sync {
    // ---- realms ----
    async fn insert_realm(&self, realm: Realm) -> RealmResult<()>;
    async fn update_realm(&self, realm: &Realm) -> RealmResult<()>;
    async fn get_realm(&self, realm_id: Uuid) -> RealmResult<Option<Realm>>;
    async fn get_realm_by_string_id(&self, string_id: &str) -> RealmResult<Option<Realm>>;
    async fn list_realms(&self) -> RealmResult<Vec<Realm>>;

    // ---- users ----
    async fn insert_user(&self, user: UserProfile) -> RealmResult<()>;
    async fn update_user(&self, user: &UserProfile) -> RealmResult<()>;
    async fn get_user(&self, user_id: Uuid) -> RealmResult<Option<UserProfile>>;
    async fn list_users(&self, realm_id: Uuid) -> RealmResult<Vec<UserProfile>>;

    // ---- groups ----
    async fn insert_group(&self, group: UserGroup) -> RealmResult<()>;
    async fn update_group(&self, group: &UserGroup) -> RealmResult<()>;
    async fn get_group(&self, group_id: Uuid) -> RealmResult<Option<UserGroup>>;
    async fn list_groups(&self, realm_id: Uuid) -> RealmResult<Vec<UserGroup>>;

    // ---- channels ----
    async fn insert_stream(&self, stream: Stream) -> RealmResult<()>;
    async fn update_stream(&self, stream: &Stream) -> RealmResult<()>;
    async fn get_stream(&self, stream_id: Uuid) -> RealmResult<Option<Stream>>;
    async fn list_streams(&self, realm_id: Uuid) -> RealmResult<Vec<Stream>>;

    // ---- messages ----
    async fn insert_message(&self, message: Message) -> RealmResult<()>;
    async fn list_messages(&self, realm_id: Uuid) -> RealmResult<Vec<Message>>;
    /// Delete a realm's messages and every user message row pointing at them.
    async fn delete_realm_messages(&self, realm_id: Uuid) -> RealmResult<usize>;
    async fn insert_user_message(&self, user_message: UserMessage) -> RealmResult<()>;
    async fn list_user_messages(&self, user_id: Uuid) -> RealmResult<Vec<UserMessage>>;
    async fn delete_user_messages_for_users(&self, user_ids: &[Uuid]) -> RealmResult<usize>;

    // ---- uploads ----
    async fn insert_attachment(&self, attachment: Attachment) -> RealmResult<()>;
    async fn list_attachments(&self, realm_id: Uuid) -> RealmResult<Vec<Attachment>>;
    async fn delete_attachments(&self, attachment_ids: &[Uuid]) -> RealmResult<usize>;

    // ---- profile fields ----
    async fn insert_custom_profile_field(&self, field: CustomProfileField) -> RealmResult<()>;
    async fn list_custom_profile_fields(&self, realm_id: Uuid)
        -> RealmResult<Vec<CustomProfileField>>;
    async fn delete_custom_profile_fields(&self, realm_id: Uuid) -> RealmResult<usize>;

    // ---- scheduled emails ----
    async fn insert_scheduled_email(&self, email: ScheduledEmail) -> RealmResult<()>;
    async fn list_scheduled_emails(&self, realm_id: Uuid) -> RealmResult<Vec<ScheduledEmail>>;
    async fn delete_scheduled_emails(&self, realm_id: Uuid) -> RealmResult<usize>;

    // ---- audit log ----
    async fn append_audit_log(&self, entry: AuditLogEntry) -> RealmResult<()>;
    async fn list_audit_log(&self, realm_id: Uuid) -> RealmResult<Vec<AuditLogEntry>>;

    // ---- user defaults ----
    async fn get_user_defaults(&self, realm_id: Uuid) -> RealmResult<Option<RealmUserDefault>>;
    async fn save_user_defaults(&self, defaults: &RealmUserDefault) -> RealmResult<()>;

    // ---- confirmations ----
    async fn insert_confirmation(&self, confirmation: Confirmation) -> RealmResult<()>;
    async fn get_confirmation(&self, key: &str) -> RealmResult<Option<Confirmation>>;
    async fn update_confirmation(&self, confirmation: &Confirmation) -> RealmResult<()>;
}

#[derive(Debug, Default)]
struct Tables {
    realms: HashMap<Uuid, Realm>,
    users: HashMap<Uuid, UserProfile>,
    groups: HashMap<Uuid, UserGroup>,
    streams: HashMap<Uuid, Stream>,
    messages: HashMap<Uuid, Message>,
    user_messages: HashMap<Uuid, UserMessage>,
    attachments: HashMap<Uuid, Attachment>,
    custom_profile_fields: HashMap<Uuid, CustomProfileField>,
    scheduled_emails: HashMap<Uuid, ScheduledEmail>,
    audit_log: Vec<AuditLogEntry>,
    user_defaults: HashMap<Uuid, RealmUserDefault>,
    confirmations: HashMap<String, Confirmation>,
}

/// In-memory store.
///
/// All tables sit behind one lock so that multi-table deletes are atomic.
#[derive(Debug, Clone, Default)]
pub struct MemoryRealmStore {
    tables: Arc<RwLock<Tables>>,
}

impl MemoryRealmStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }
}

/// Sort by creation order; ids are time-ordered.
fn sorted<T: Clone>(items: impl Iterator<Item = T>, key: impl Fn(&T) -> Uuid) -> Vec<T> {
    let mut items: Vec<T> = items.collect();
    items.sort_by_key(|item| key(item));
    items
}

fn replace<T: Clone>(table: &mut HashMap<Uuid, T>, id: Uuid, value: &T, kind: &str) -> RealmResult<()> {
    match table.get_mut(&id) {
        Some(slot) => {
            *slot = value.clone();
            Ok(())
        }
        None => Err(RealmError::NotFound(format!("{} {}", kind, id))),
    }
}

#[async_trait]
impl RealmStore for MemoryRealmStore {
    async fn insert_realm(&self, realm: Realm) -> RealmResult<()> {
        let mut tables = self.tables.write().await;
        if tables.realms.values().any(|r| r.string_id == realm.string_id) {
            return Err(RealmError::SubdomainUnavailable);
        }
        tables.realms.insert(realm.id, realm);
        Ok(())
    }

    async fn update_realm(&self, realm: &Realm) -> RealmResult<()> {
        let mut tables = self.tables.write().await;
        if tables
            .realms
            .values()
            .any(|r| r.id != realm.id && r.string_id == realm.string_id)
        {
            return Err(RealmError::SubdomainUnavailable);
        }
        replace(&mut tables.realms, realm.id, realm, "Realm")
    }

    async fn get_realm(&self, realm_id: Uuid) -> RealmResult<Option<Realm>> {
        Ok(self.tables.read().await.realms.get(&realm_id).cloned())
    }

    async fn get_realm_by_string_id(&self, string_id: &str) -> RealmResult<Option<Realm>> {
        Ok(self
            .tables
            .read()
            .await
            .realms
            .values()
            .find(|r| r.string_id == string_id)
            .cloned())
    }

    async fn list_realms(&self) -> RealmResult<Vec<Realm>> {
        let tables = self.tables.read().await;
        Ok(sorted(tables.realms.values().cloned(), |r| r.id))
    }

    async fn insert_user(&self, user: UserProfile) -> RealmResult<()> {
        self.tables.write().await.users.insert(user.id, user);
        Ok(())
    }

    async fn update_user(&self, user: &UserProfile) -> RealmResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.users, user.id, user, "User")
    }

    async fn get_user(&self, user_id: Uuid) -> RealmResult<Option<UserProfile>> {
        Ok(self.tables.read().await.users.get(&user_id).cloned())
    }

    async fn list_users(&self, realm_id: Uuid) -> RealmResult<Vec<UserProfile>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.users.values().filter(|u| u.realm_id == realm_id).cloned(),
            |u| u.id,
        ))
    }

    async fn insert_group(&self, group: UserGroup) -> RealmResult<()> {
        self.tables.write().await.groups.insert(group.id, group);
        Ok(())
    }

    async fn update_group(&self, group: &UserGroup) -> RealmResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.groups, group.id, group, "User group")
    }

    async fn get_group(&self, group_id: Uuid) -> RealmResult<Option<UserGroup>> {
        Ok(self.tables.read().await.groups.get(&group_id).cloned())
    }

    async fn list_groups(&self, realm_id: Uuid) -> RealmResult<Vec<UserGroup>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.groups.values().filter(|g| g.realm_id == realm_id).cloned(),
            |g| g.id,
        ))
    }

    async fn insert_stream(&self, stream: Stream) -> RealmResult<()> {
        self.tables.write().await.streams.insert(stream.id, stream);
        Ok(())
    }

    async fn update_stream(&self, stream: &Stream) -> RealmResult<()> {
        let mut tables = self.tables.write().await;
        replace(&mut tables.streams, stream.id, stream, "Channel")
    }

    async fn get_stream(&self, stream_id: Uuid) -> RealmResult<Option<Stream>> {
        Ok(self.tables.read().await.streams.get(&stream_id).cloned())
    }

    async fn list_streams(&self, realm_id: Uuid) -> RealmResult<Vec<Stream>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.streams.values().filter(|s| s.realm_id == realm_id).cloned(),
            |s| s.id,
        ))
    }

    async fn insert_message(&self, message: Message) -> RealmResult<()> {
        self.tables.write().await.messages.insert(message.id, message);
        Ok(())
    }

    async fn list_messages(&self, realm_id: Uuid) -> RealmResult<Vec<Message>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables.messages.values().filter(|m| m.realm_id == realm_id).cloned(),
            |m| m.id,
        ))
    }

    async fn delete_realm_messages(&self, realm_id: Uuid) -> RealmResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.messages.len();
        tables.messages.retain(|_, m| m.realm_id != realm_id);
        let deleted = before - tables.messages.len();

        let Tables {
            messages,
            user_messages,
            ..
        } = &mut *tables;
        user_messages.retain(|_, um| messages.contains_key(&um.message_id));
        Ok(deleted)
    }

    async fn insert_user_message(&self, user_message: UserMessage) -> RealmResult<()> {
        self.tables
            .write()
            .await
            .user_messages
            .insert(user_message.id, user_message);
        Ok(())
    }

    async fn list_user_messages(&self, user_id: Uuid) -> RealmResult<Vec<UserMessage>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables
                .user_messages
                .values()
                .filter(|um| um.user_id == user_id)
                .cloned(),
            |um| um.id,
        ))
    }

    async fn delete_user_messages_for_users(&self, user_ids: &[Uuid]) -> RealmResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.user_messages.len();
        tables
            .user_messages
            .retain(|_, um| !user_ids.contains(&um.user_id));
        Ok(before - tables.user_messages.len())
    }

    async fn insert_attachment(&self, attachment: Attachment) -> RealmResult<()> {
        self.tables
            .write()
            .await
            .attachments
            .insert(attachment.id, attachment);
        Ok(())
    }

    async fn list_attachments(&self, realm_id: Uuid) -> RealmResult<Vec<Attachment>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables
                .attachments
                .values()
                .filter(|a| a.realm_id == realm_id)
                .cloned(),
            |a| a.id,
        ))
    }

    async fn delete_attachments(&self, attachment_ids: &[Uuid]) -> RealmResult<usize> {
        let mut tables = self.tables.write().await;
        Ok(attachment_ids
            .iter()
            .filter(|id| tables.attachments.remove(id).is_some())
            .count())
    }

    async fn insert_custom_profile_field(&self, field: CustomProfileField) -> RealmResult<()> {
        self.tables
            .write()
            .await
            .custom_profile_fields
            .insert(field.id, field);
        Ok(())
    }

    async fn list_custom_profile_fields(
        &self,
        realm_id: Uuid,
    ) -> RealmResult<Vec<CustomProfileField>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables
                .custom_profile_fields
                .values()
                .filter(|f| f.realm_id == realm_id)
                .cloned(),
            |f| f.id,
        ))
    }

    async fn delete_custom_profile_fields(&self, realm_id: Uuid) -> RealmResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.custom_profile_fields.len();
        tables
            .custom_profile_fields
            .retain(|_, f| f.realm_id != realm_id);
        Ok(before - tables.custom_profile_fields.len())
    }

    async fn insert_scheduled_email(&self, email: ScheduledEmail) -> RealmResult<()> {
        self.tables
            .write()
            .await
            .scheduled_emails
            .insert(email.id, email);
        Ok(())
    }

    async fn list_scheduled_emails(&self, realm_id: Uuid) -> RealmResult<Vec<ScheduledEmail>> {
        let tables = self.tables.read().await;
        Ok(sorted(
            tables
                .scheduled_emails
                .values()
                .filter(|e| e.realm_id == realm_id)
                .cloned(),
            |e| e.id,
        ))
    }

    async fn delete_scheduled_emails(&self, realm_id: Uuid) -> RealmResult<usize> {
        let mut tables = self.tables.write().await;
        let before = tables.scheduled_emails.len();
        tables.scheduled_emails.retain(|_, e| e.realm_id != realm_id);
        Ok(before - tables.scheduled_emails.len())
    }

    async fn append_audit_log(&self, entry: AuditLogEntry) -> RealmResult<()> {
        self.tables.write().await.audit_log.push(entry);
        Ok(())
    }

    async fn list_audit_log(&self, realm_id: Uuid) -> RealmResult<Vec<AuditLogEntry>> {
        Ok(self
            .tables
            .read()
            .await
            .audit_log
            .iter()
            .filter(|e| e.realm_id == realm_id)
            .cloned()
            .collect())
    }

    async fn get_user_defaults(&self, realm_id: Uuid) -> RealmResult<Option<RealmUserDefault>> {
        Ok(self.tables.read().await.user_defaults.get(&realm_id).cloned())
    }

    async fn save_user_defaults(&self, defaults: &RealmUserDefault) -> RealmResult<()> {
        self.tables
            .write()
            .await
            .user_defaults
            .insert(defaults.realm_id, defaults.clone());
        Ok(())
    }

    async fn insert_confirmation(&self, confirmation: Confirmation) -> RealmResult<()> {
        self.tables
            .write()
            .await
            .confirmations
            .insert(confirmation.key.clone(), confirmation);
        Ok(())
    }

    async fn get_confirmation(&self, key: &str) -> RealmResult<Option<Confirmation>> {
        Ok(self.tables.read().await.confirmations.get(key).cloned())
    }

    async fn update_confirmation(&self, confirmation: &Confirmation) -> RealmResult<()> {
        let mut tables = self.tables.write().await;
        match tables.confirmations.get_mut(&confirmation.key) {
            Some(slot) => {
                *slot = confirmation.clone();
                Ok(())
            }
            None => Err(RealmError::NotFound("Confirmation".to_string())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use realm_org::{PlanType, UserRole};

    #[tokio::test]
    async fn test_realm_string_id_unique() {
        let store = MemoryRealmStore::new();
        store
            .insert_realm(Realm::new("acme", "Acme", PlanType::SelfHosted))
            .await
            .unwrap();

        let err = store
            .insert_realm(Realm::new("acme", "Other", PlanType::SelfHosted))
            .await
            .unwrap_err();
        assert_eq!(err, RealmError::SubdomainUnavailable);

        let found = store.get_realm_by_string_id("acme").await.unwrap().unwrap();
        assert_eq!(found.name, "Acme");
    }

    #[tokio::test]
    async fn test_update_missing_realm() {
        let store = MemoryRealmStore::new();
        let realm = Realm::new("ghost", "Ghost", PlanType::SelfHosted);
        assert!(matches!(
            store.update_realm(&realm).await,
            Err(RealmError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn test_delete_realm_messages_is_scoped() {
        let store = MemoryRealmStore::new();
        let zulip = Uuid::now_v7();
        let lear = Uuid::now_v7();
        let hamlet = UserProfile::new(zulip, "Hamlet", "hamlet@zulip.com", UserRole::Member);
        let cordelia = UserProfile::new(lear, "Cordelia", "cordelia@lear.org", UserRole::Member);

        for (realm_id, user) in [(zulip, &hamlet), (lear, &cordelia)] {
            let message = Message::new(realm_id, user.id, None, "topic", "hello");
            store
                .insert_user_message(UserMessage::new(user.id, message.id))
                .await
                .unwrap();
            store.insert_message(message).await.unwrap();
        }

        assert_eq!(store.delete_realm_messages(zulip).await.unwrap(), 1);
        assert!(store.list_messages(zulip).await.unwrap().is_empty());
        assert!(store.list_user_messages(hamlet.id).await.unwrap().is_empty());
        assert_eq!(store.list_messages(lear).await.unwrap().len(), 1);
        assert_eq!(store.list_user_messages(cordelia.id).await.unwrap().len(), 1);
    }
}
