//! End-to-end tests for realm lifecycle actions.
//!
//! Covered flows:
//! 1. Deactivation, including owner requests and their deletion bounds
//! 2. Reactivation, directly and through emailed links
//! 3. Scrubbing and the deletion sweeps
//! 4. Subdomain changes

mod common;

use chrono::{Duration, Utc};
use common::TestFixture;
use realm_actions::{
    AuditLogEventType, DeactivationOptions, DeactivationReason, RealmConfig, RealmStore,
};
use realm_org::{
    Attachment, CustomProfileField, Message, RealmError, ScheduledEmail, ScheduledEmailType,
    Stream, UserMessage, UserProfile, UserRole,
};
use serde_json::json;

fn deactivation(reason: DeactivationReason) -> DeactivationOptions {
    DeactivationOptions::new(reason)
}

// =============================================================================
// Deactivation
// =============================================================================

#[tokio::test]
async fn test_deactivate_realm_is_idempotent() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    let realm = fixture
        .service
        .deactivate_realm(zulip.realm.id, None, deactivation(DeactivationReason::Tos))
        .await
        .unwrap();
    assert!(realm.deactivated);
    assert!(realm.scheduled_deletion_date.is_none());

    fixture
        .service
        .deactivate_realm(zulip.realm.id, None, deactivation(DeactivationReason::Tos))
        .await
        .unwrap();

    let entries = fixture
        .audit_entries(zulip.realm.id, AuditLogEventType::RealmDeactivated)
        .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].extra_data["deactivation_reason"], json!("tos"));

    let events: Vec<_> = fixture
        .events
        .published_matching("realm.deactivated")
        .await
        .into_iter()
        .filter(|e| e.realm_id == zulip.realm.id)
        .collect();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_deactivation_cancels_scheduled_emails() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;
    let lear = fixture.realm("lear").await;

    for realm in [&zulip.realm, &lear.realm] {
        fixture
            .store
            .insert_scheduled_email(ScheduledEmail::new(
                realm.id,
                vec![],
                ScheduledEmailType::Digest,
                Utc::now() + Duration::days(1),
            ))
            .await
            .unwrap();
    }

    fixture
        .service
        .deactivate_realm(zulip.realm.id, None, deactivation(DeactivationReason::Tos))
        .await
        .unwrap();

    assert!(fixture.store.list_scheduled_emails(zulip.realm.id).await.unwrap().is_empty());
    assert_eq!(fixture.store.list_scheduled_emails(lear.realm.id).await.unwrap().len(), 1);
}

#[tokio::test]
async fn test_deactivate_realm_request_checks_role_and_bounds() {
    let config = RealmConfig {
        max_deactivated_realm_deletion_days: Some(30),
        ..RealmConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let zulip = fixture.realm("zulip").await;
    let realm_id = zulip.realm.id;

    let err = fixture
        .service
        .deactivate_realm_request(realm_id, zulip.admin.id, Some(20))
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::MustBeOwner);

    let err = fixture
        .service
        .deactivate_realm_request(realm_id, zulip.owner.id, Some(1))
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Data deletion time must be at least 14 days in the future."
    );

    let err = fixture
        .service
        .deactivate_realm_request(realm_id, zulip.owner.id, Some(31))
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::DeletionTooLate(30));

    // Keeping the data forever exceeds any maximum
    let err = fixture
        .service
        .deactivate_realm_request(realm_id, zulip.owner.id, None)
        .await
        .unwrap_err();
    assert_eq!(
        err.to_string(),
        "Data deletion time must be at most 30 days in the future."
    );
    assert!(!fixture.reload(realm_id).await.deactivated);

    let realm = fixture
        .service
        .deactivate_realm_request(realm_id, zulip.owner.id, Some(20))
        .await
        .unwrap();
    assert!(realm.deactivated);
    let deletion = realm.scheduled_deletion_date.unwrap();
    let expected = Utc::now() + Duration::days(20);
    assert!((deletion - expected).num_seconds().abs() < 60);
}

#[tokio::test]
async fn test_deactivate_realm_request_without_bounds() {
    let config = RealmConfig {
        min_deactivated_realm_deletion_days: None,
        ..RealmConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let zulip = fixture.realm("zulip").await;

    let realm = fixture
        .service
        .deactivate_realm_request(zulip.realm.id, zulip.owner.id, None)
        .await
        .unwrap();
    assert!(realm.deactivated);
    assert!(realm.scheduled_deletion_date.is_none());

    let entries = fixture
        .audit_entries(zulip.realm.id, AuditLogEventType::RealmDeactivated)
        .await;
    assert_eq!(entries[0].acting_user_id, Some(zulip.owner.id));
    assert_eq!(entries[0].extra_data["deactivation_reason"], json!("owner_request"));
}

#[tokio::test]
async fn test_deactivate_realm_request_rejects_unrepresentable_delay() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    let err = fixture
        .service
        .deactivate_realm_request(zulip.realm.id, zulip.owner.id, Some(u32::MAX))
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RealmError::InvalidArgument("Invalid deletion_delay_days".to_string())
    );

    let realm = fixture.reload(zulip.realm.id).await;
    assert!(!realm.deactivated);
    assert!(realm.scheduled_deletion_date.is_none());
    assert!(fixture
        .audit_entries(zulip.realm.id, AuditLogEventType::RealmDeactivated)
        .await
        .is_empty());
    assert!(fixture.outbox.sent().await.is_empty());
}

#[tokio::test]
async fn test_demo_organization_deadline_out_of_range() {
    let config = RealmConfig {
        demo_org_deadline_days: i64::MAX,
        ..RealmConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let options = realm_actions::CreateRealmOptions {
        is_demo_organization: true,
        ..Default::default()
    };

    let err = fixture
        .service
        .create_realm("demo", "Demo org", options)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        RealmError::InvalidArgument("Invalid demo organization deadline".to_string())
    );
}

#[tokio::test]
async fn test_deactivation_emails_every_owner() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;
    let second_owner = fixture
        .add_user(&zulip.realm, "Cordelia", "cordelia@zulip.test", UserRole::Owner)
        .await;

    fixture
        .service
        .deactivate_realm_request(zulip.realm.id, zulip.owner.id, Some(30))
        .await
        .unwrap();

    let own = fixture.outbox.sent_to(&zulip.owner.delivery_email).await;
    assert_eq!(own.len(), 1);
    assert!(own[0]
        .body
        .starts_with("You have deactivated your organization, zulip org, on "));
    assert!(own[0]
        .body
        .contains("All data associated with this organization will be permanently deleted on"));
    assert_eq!(own[0].from_name, "Account Security");

    let other = fixture.outbox.sent_to(&second_owner.delivery_email).await;
    assert_eq!(other.len(), 1);
    assert!(other[0]
        .body
        .starts_with("Your organization, zulip org, was deactivated by Desdemona on "));

    // Administrators and members are not told
    assert!(fixture.outbox.sent_to(&zulip.admin.delivery_email).await.is_empty());
    assert!(fixture.outbox.sent_to(&zulip.member.delivery_email).await.is_empty());
}

#[tokio::test]
async fn test_immediate_deletion_scrubs_realm() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    let realm = fixture
        .service
        .deactivate_realm(
            zulip.realm.id,
            None,
            deactivation(DeactivationReason::InactiveRealm)
                .with_deletion_delay_days(Some(0))
                .with_email_owners(true),
        )
        .await
        .unwrap();

    assert!(realm.deactivated);
    assert!(realm.scheduled_deletion_date.is_none());
    assert_eq!(
        fixture
            .audit_entries(zulip.realm.id, AuditLogEventType::RealmScrubbed)
            .await
            .len(),
        1
    );

    // The email goes out before the owner's address is scrubbed
    let sent = fixture.outbox.sent_to(&zulip.owner.delivery_email).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].body.starts_with("Your organization, zulip org, was deactivated on "));
    assert!(sent[0]
        .body
        .contains("All data associated with this organization has been permanently deleted."));
}

// =============================================================================
// Reactivation
// =============================================================================

#[tokio::test]
async fn test_reactivate_active_realm_does_nothing() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    let realm = fixture
        .service
        .reactivate_realm(zulip.realm.id, None)
        .await
        .unwrap();
    assert!(!realm.deactivated);
    assert!(fixture
        .audit_entries(zulip.realm.id, AuditLogEventType::RealmReactivated)
        .await
        .is_empty());
}

#[tokio::test]
async fn test_reactivate_realm_clears_deletion_date() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    fixture
        .service
        .deactivate_realm(
            zulip.realm.id,
            None,
            deactivation(DeactivationReason::Tos).with_deletion_delay_days(Some(30)),
        )
        .await
        .unwrap();
    let realm = fixture
        .service
        .reactivate_realm(zulip.realm.id, None)
        .await
        .unwrap();

    assert!(!realm.deactivated);
    assert!(realm.scheduled_deletion_date.is_none());
    assert_eq!(
        fixture
            .audit_entries(zulip.realm.id, AuditLogEventType::RealmReactivated)
            .await
            .len(),
        1
    );
    assert_eq!(fixture.events.published_matching("realm.reactivated").await.len(), 1);
}

#[tokio::test]
async fn test_reactivation_link_is_single_use() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;
    fixture
        .service
        .deactivate_realm(zulip.realm.id, None, deactivation(DeactivationReason::Tos))
        .await
        .unwrap();

    let key = fixture
        .service
        .send_realm_reactivation_email(zulip.realm.id, None)
        .await
        .unwrap();

    let sent = fixture.outbox.sent_to(&zulip.admin.delivery_email).await;
    assert_eq!(sent.len(), 1);
    assert!(sent[0].to.contains(&zulip.owner.delivery_email));
    assert!(!sent[0].to.contains(&zulip.member.delivery_email));
    assert!(sent[0].body.starts_with("Dear former administrators of zulip org"));
    assert!(sent[0]
        .body
        .contains(&format!("https://localhost:9991/reactivate/{}", key)));
    assert_eq!(
        fixture
            .audit_entries(zulip.realm.id, AuditLogEventType::RealmReactivationEmailSent)
            .await
            .len(),
        1
    );

    let realm = fixture.service.confirm_reactivation(&key).await.unwrap();
    assert!(!realm.deactivated);

    let err = fixture.service.confirm_reactivation(&key).await.unwrap_err();
    assert_eq!(
        err.to_string(),
        "The organization reactivation link has expired or is not valid."
    );
    let err = fixture
        .service
        .confirm_reactivation("not-a-real-key")
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::InvalidReactivationLink);
}

#[tokio::test]
async fn test_reactivation_link_expires() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;
    fixture
        .service
        .deactivate_realm(zulip.realm.id, None, deactivation(DeactivationReason::Tos))
        .await
        .unwrap();

    let key = fixture
        .service
        .send_realm_reactivation_email(zulip.realm.id, None)
        .await
        .unwrap();

    let err = fixture
        .service
        .confirm_reactivation_at(&key, Utc::now() + Duration::days(2))
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::InvalidReactivationLink);
    assert!(fixture.reload(zulip.realm.id).await.deactivated);
}

// =============================================================================
// Scrubbing and sweeps
// =============================================================================

#[tokio::test]
async fn test_scrub_realm_only_touches_target_realm() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;
    let lear = fixture.realm("lear").await;

    let internal_realm = fixture
        .service
        .get_realm_by_subdomain(&fixture.service.config().system_bot_realm)
        .await
        .unwrap()
        .unwrap();
    let notification_bot = fixture
        .service
        .add_user(UserProfile::bot(
            internal_realm.id,
            "Notification Bot",
            "notification-bot@zulip.com",
        ))
        .await
        .unwrap();

    let mut kept_paths = Vec::new();
    for test_realm in [&zulip, &lear] {
        let realm = &test_realm.realm;
        let stream = Stream::new(realm.id, "Denmark");
        fixture.store.insert_stream(stream.clone()).await.unwrap();

        let message = Message::new(realm.id, test_realm.owner.id, Some(stream.id), "topic", "hello");
        fixture.store.insert_message(message.clone()).await.unwrap();
        for content in ["Welcome!", "Reminder"] {
            let bot_message =
                Message::new(realm.id, notification_bot.id, Some(stream.id), "topic", content);
            fixture.store.insert_message(bot_message).await.unwrap();
        }
        fixture
            .store
            .insert_user_message(UserMessage::new(test_realm.member.id, message.id))
            .await
            .unwrap();

        let attachment = Attachment::new(realm.id, test_realm.owner.id, "dummy.txt", 42);
        fixture.uploads.store_file(attachment.path_id.clone()).await;
        if realm.id == lear.realm.id {
            kept_paths.push(attachment.path_id.clone());
        }
        fixture.store.insert_attachment(attachment).await.unwrap();

        fixture
            .store
            .insert_custom_profile_field(CustomProfileField::new(realm.id, "Phone", "Number"))
            .await
            .unwrap();
    }

    let store = &fixture.store;
    assert_eq!(store.list_messages(zulip.realm.id).await.unwrap().len(), 3);
    assert_eq!(store.list_messages(lear.realm.id).await.unwrap().len(), 3);

    fixture.service.scrub_realm(zulip.realm.id, None).await.unwrap();

    assert!(store.list_messages(zulip.realm.id).await.unwrap().is_empty());
    assert!(store.list_attachments(zulip.realm.id).await.unwrap().is_empty());
    assert!(store.list_custom_profile_fields(zulip.realm.id).await.unwrap().is_empty());
    assert!(store.list_user_messages(zulip.member.id).await.unwrap().is_empty());

    let lear_messages = store.list_messages(lear.realm.id).await.unwrap();
    assert_eq!(lear_messages.len(), 3);
    assert_eq!(
        lear_messages
            .iter()
            .filter(|m| m.sender_id == notification_bot.id)
            .count(),
        2
    );
    let bot = fixture.service.get_user(notification_bot.id).await.unwrap();
    assert_eq!(bot.full_name, "Notification Bot");
    assert_eq!(store.list_attachments(lear.realm.id).await.unwrap().len(), 1);
    assert_eq!(store.list_custom_profile_fields(lear.realm.id).await.unwrap().len(), 1);
    assert_eq!(store.list_user_messages(lear.member.id).await.unwrap().len(), 1);
    assert_eq!(fixture.uploads.file_count().await, 1);
    assert!(fixture.uploads.contains(&kept_paths[0]).await);

    for user in store.list_users(zulip.realm.id).await.unwrap() {
        assert!(user.full_name.starts_with("Scrubbed "));
        assert!(user.email.starts_with("scrubbed-"));
        assert!(user.email.ends_with("@zulip.localhost:9991"));
        assert_eq!(user.email, user.delivery_email);
    }
    let hamlet = fixture.service.get_user(lear.member.id).await.unwrap();
    assert_eq!(hamlet.full_name, "Hamlet");
    assert_eq!(hamlet.delivery_email, "hamlet@lear.test");

    assert_eq!(fixture.events.published_matching("realm.scrubbed").await.len(), 1);
}

#[tokio::test]
async fn test_scrub_realm_twice_records_both_runs() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    fixture.service.scrub_realm(zulip.realm.id, None).await.unwrap();
    fixture
        .service
        .scrub_realm(zulip.realm.id, Some(zulip.owner.id))
        .await
        .unwrap();

    let entries = fixture
        .audit_entries(zulip.realm.id, AuditLogEventType::RealmScrubbed)
        .await;
    assert_eq!(entries.len(), 2);
    assert_eq!(entries[1].acting_user_id, Some(zulip.owner.id));
}

#[tokio::test]
async fn test_attachments_are_deleted_in_batches() {
    let config = RealmConfig {
        attachment_delete_batch_size: 2,
        ..RealmConfig::default()
    };
    let fixture = TestFixture::with_config(config);
    let zulip = fixture.realm("zulip").await;

    for i in 0..5 {
        let attachment = Attachment::new(zulip.realm.id, zulip.owner.id, format!("file{}.txt", i), 10);
        fixture.uploads.store_file(attachment.path_id.clone()).await;
        fixture.store.insert_attachment(attachment).await.unwrap();
    }

    fixture.service.scrub_realm(zulip.realm.id, None).await.unwrap();

    let batches: Vec<usize> = fixture
        .uploads
        .delete_batches()
        .await
        .iter()
        .map(Vec::len)
        .collect();
    assert_eq!(batches, vec![2, 2, 1]);
    assert_eq!(fixture.uploads.file_count().await, 0);
}

#[tokio::test]
async fn test_clean_deactivated_realm_data_sweeps_due_realms_once() {
    let fixture = TestFixture::new();
    let due = fixture.realm("due").await;
    let later = fixture.realm("later").await;
    let kept = fixture.realm("kept").await;
    let active = fixture.realm("active").await;

    for (realm_id, delay) in [(due.realm.id, Some(14)), (later.realm.id, Some(30)), (kept.realm.id, None)] {
        fixture
            .service
            .deactivate_realm(
                realm_id,
                None,
                deactivation(DeactivationReason::OwnerRequest).with_deletion_delay_days(delay),
            )
            .await
            .unwrap();
    }

    let now = Utc::now() + Duration::days(20);
    let scrubbed = fixture.service.clean_deactivated_realm_data_at(now).await.unwrap();
    assert_eq!(scrubbed, vec![due.realm.id]);
    assert!(fixture.reload(due.realm.id).await.scheduled_deletion_date.is_none());

    let scrubbed = fixture.service.clean_deactivated_realm_data_at(now).await.unwrap();
    assert!(scrubbed.is_empty());

    for realm_id in [due.realm.id, later.realm.id, kept.realm.id, active.realm.id] {
        let expected = usize::from(realm_id == due.realm.id);
        assert_eq!(
            fixture
                .audit_entries(realm_id, AuditLogEventType::RealmScrubbed)
                .await
                .len(),
            expected
        );
    }
}

#[tokio::test]
async fn test_delete_expired_demo_organizations() {
    let fixture = TestFixture::new();
    let demo = fixture.demo_realm("demo").await;
    let regular = fixture.realm("zulip").await;

    let deadline = demo.realm.demo_organization_scheduled_deletion_date.unwrap();

    let deleted = fixture
        .service
        .delete_expired_demo_organizations_at(deadline - Duration::days(1))
        .await
        .unwrap();
    assert!(deleted.is_empty());

    let deleted = fixture
        .service
        .delete_expired_demo_organizations_at(deadline + Duration::days(1))
        .await
        .unwrap();
    assert_eq!(deleted, vec![demo.realm.id]);

    let realm = fixture.reload(demo.realm.id).await;
    assert!(realm.deactivated);
    assert!(realm.scheduled_deletion_date.is_none());
    let entries = fixture
        .audit_entries(demo.realm.id, AuditLogEventType::RealmDeactivated)
        .await;
    assert_eq!(entries[0].extra_data["deactivation_reason"], json!("demo_expired"));
    assert_eq!(
        fixture
            .audit_entries(demo.realm.id, AuditLogEventType::RealmScrubbed)
            .await
            .len(),
        1
    );

    // The demo owner never configured an email address
    assert!(fixture.outbox.sent().await.is_empty());
    assert!(!fixture.reload(regular.realm.id).await.deactivated);
}

// =============================================================================
// Subdomain changes
// =============================================================================

#[tokio::test]
async fn test_change_realm_subdomain_flushes_cache() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    let cached = fixture.service.get_realm_by_subdomain("zulip").await.unwrap();
    assert_eq!(cached.map(|r| r.id), Some(zulip.realm.id));

    let realm = fixture
        .service
        .change_realm_subdomain(zulip.realm.id, "newzulip", Some(zulip.owner.id), false)
        .await
        .unwrap();
    assert_eq!(realm.string_id, "newzulip");

    assert!(fixture.service.get_realm_by_subdomain("zulip").await.unwrap().is_none());
    let renamed = fixture.service.get_realm_by_subdomain("newzulip").await.unwrap();
    assert_eq!(renamed.map(|r| r.id), Some(zulip.realm.id));

    let entries = fixture
        .audit_entries(zulip.realm.id, AuditLogEventType::RealmSubdomainChanged)
        .await;
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].extra_data["old_subdomain"], json!("zulip"));
    assert_eq!(entries[0].extra_data["new_subdomain"], json!("newzulip"));

    let events = fixture.events.published_matching("realm.subdomain_changed").await;
    assert_eq!(events.len(), 1);
    assert_eq!(
        events[0].payload["realm_url"],
        json!("https://newzulip.localhost:9991")
    );
}

#[tokio::test]
async fn test_change_realm_subdomain_with_redirect() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    fixture
        .service
        .change_realm_subdomain(zulip.realm.id, "newzulip", None, true)
        .await
        .unwrap();

    let placeholder = fixture
        .service
        .get_realm_by_subdomain("zulip")
        .await
        .unwrap()
        .unwrap();
    assert_ne!(placeholder.id, zulip.realm.id);
    assert!(placeholder.deactivated);
    assert_eq!(
        placeholder.deactivated_redirect.as_deref(),
        Some("https://newzulip.localhost:9991")
    );
    let entries = fixture
        .audit_entries(placeholder.id, AuditLogEventType::RealmDeactivated)
        .await;
    assert_eq!(entries[0].extra_data["deactivation_reason"], json!("subdomain_change"));
}

#[tokio::test]
async fn test_change_realm_subdomain_rejects_taken_and_malformed() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;
    fixture.realm("lear").await;

    let err = fixture
        .service
        .change_realm_subdomain(zulip.realm.id, "lear", None, false)
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::SubdomainUnavailable);

    let err = fixture
        .service
        .change_realm_subdomain(zulip.realm.id, "Not_Valid", None, false)
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::SubdomainInvalid);
    assert_eq!(fixture.reload(zulip.realm.id).await.string_id, "zulip");
}

#[tokio::test]
async fn test_repeated_subdomain_change_retargets_placeholders() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    for subdomain in ["zulip2", "zulip3"] {
        fixture
            .service
            .change_realm_subdomain(zulip.realm.id, subdomain, None, true)
            .await
            .unwrap();
    }

    for old_subdomain in ["zulip", "zulip2"] {
        let placeholder = fixture
            .store
            .get_realm_by_string_id(old_subdomain)
            .await
            .unwrap()
            .unwrap();
        assert!(placeholder.deactivated);
        assert_eq!(
            placeholder.deactivated_redirect.as_deref(),
            Some("https://zulip3.localhost:9991")
        );
    }
    assert_eq!(fixture.reload(zulip.realm.id).await.string_id, "zulip3");
}

#[tokio::test]
async fn test_root_domain_realm() {
    let fixture = TestFixture::new();
    let realm = fixture
        .service
        .create_realm("", "Root org", Default::default())
        .await
        .unwrap();

    assert_eq!(realm.string_id, "");
    assert_eq!(realm.host("localhost:9991"), "localhost:9991");
    assert_eq!(realm.url("localhost:9991"), "https://localhost:9991");

    let err = fixture
        .service
        .create_realm("", "Second root org", Default::default())
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::SubdomainUnavailable);

    // A realm can move off the root domain and back.
    fixture
        .service
        .change_realm_subdomain(realm.id, "rooted", None, false)
        .await
        .unwrap();
    let moved = fixture
        .service
        .change_realm_subdomain(realm.id, "", None, false)
        .await
        .unwrap();
    assert_eq!(moved.url("localhost:9991"), "https://localhost:9991");
}

#[tokio::test]
async fn test_root_domain_reserved_for_landing_page() {
    let fixture = TestFixture::with_config(RealmConfig {
        root_domain_landing_page: true,
        ..RealmConfig::default()
    });
    let zulip = fixture.realm("zulip").await;

    let err = fixture
        .service
        .create_realm("", "Root org", Default::default())
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::SubdomainUnavailable);

    let err = fixture
        .service
        .change_realm_subdomain(zulip.realm.id, "", None, false)
        .await
        .unwrap_err();
    assert_eq!(err, RealmError::SubdomainUnavailable);
    assert_eq!(fixture.reload(zulip.realm.id).await.string_id, "zulip");
}

#[tokio::test]
async fn test_add_deactivated_redirect() {
    let fixture = TestFixture::new();
    let zulip = fixture.realm("zulip").await;

    let realm = fixture
        .service
        .add_deactivated_redirect(zulip.realm.id, "https://example.com")
        .await
        .unwrap();
    assert_eq!(realm.deactivated_redirect.as_deref(), Some("https://example.com"));
    assert_eq!(
        fixture.reload(zulip.realm.id).await.deactivated_redirect.as_deref(),
        Some("https://example.com")
    );
}
