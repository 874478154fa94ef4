//! Integration tests for the billing email sync.
//!
//! Direction A: a CiviCRM Email edit updates the WordPress user.
//! Direction B: a WooCommerce address save updates the CiviCRM Contact.

#![allow(clippy::unwrap_used)]

use serde_json::json;
use woo_civi_core::{ContactId, EmailId, EmailRole, UserId};
use woo_civi_integration_tests::{
    BILLING_LOCATION, FakeCivi, InMemoryStore, Notification, SHIPPING_LOCATION, recording_hooks,
    settings,
};
use woo_civi_sync::civicrm::EmailRecord;
use woo_civi_sync::settings::LocationTypeMap;
use woo_civi_sync::{
    CiviPostEvent, CustomerAddressEvent, EmailSync, EmailSyncOutcome, Hooks, Settings, SkipReason,
};

fn email_edit(contact_id: i64, location_type_id: i64, email: &str) -> CiviPostEvent {
    CiviPostEvent {
        op: "edit".to_string(),
        object_name: "Email".to_string(),
        object_id: json!(31),
        object_ref: json!({
            "id": "31",
            "contact_id": contact_id.to_string(),
            "location_type_id": location_type_id.to_string(),
            "email": email,
            "is_primary": "1"
        }),
    }
}

fn address_saved(user_id: i64, load_address: &str) -> CustomerAddressEvent {
    CustomerAddressEvent {
        user_id: UserId::new(user_id),
        load_address: load_address.to_string(),
    }
}

// =============================================================================
// Direction A: CiviCRM to WooCommerce
// =============================================================================

#[tokio::test]
async fn test_billing_email_edit_updates_user() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().with_customer(12, "old@example.org");
    let settings = settings();
    let (hooks, listener) = recording_hooks();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_civi_contact_email(&email_edit(7, BILLING_LOCATION.as_i64(), "new@example.org"))
        .await;

    assert_eq!(
        outcome,
        EmailSyncOutcome::WooCommerceUpdated {
            user_id: UserId::new(12),
            role: EmailRole::Billing,
            written: true,
        }
    );
    assert_eq!(woo.billing_email(12).as_deref(), Some("new@example.org"));
    assert_eq!(
        listener.seen(),
        vec![Notification::WcEmailUpdated(UserId::new(12), EmailRole::Billing)]
    );
}

#[tokio::test]
async fn test_shipping_email_edit_broadcasts_without_write() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().with_customer(12, "old@example.org");
    let settings = settings();
    let (hooks, listener) = recording_hooks();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_civi_contact_email(&email_edit(7, SHIPPING_LOCATION.as_i64(), "ship@example.org"))
        .await;

    assert_eq!(
        outcome,
        EmailSyncOutcome::WooCommerceUpdated {
            user_id: UserId::new(12),
            role: EmailRole::Shipping,
            written: false,
        }
    );
    assert!(woo.customer_writes().is_empty());
    assert_eq!(woo.billing_email(12).as_deref(), Some("old@example.org"));
    assert_eq!(
        listener.seen(),
        vec![Notification::WcEmailUpdated(UserId::new(12), EmailRole::Shipping)]
    );
}

#[tokio::test]
async fn test_direction_a_guards() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().with_customer(12, "old@example.org");
    let (hooks, listener) = recording_hooks();
    let enabled = settings();
    let disabled = Settings {
        sync_contact_email: false,
        ..settings()
    };

    let billing = BILLING_LOCATION.as_i64();
    let cases = [
        (&disabled, email_edit(7, billing, "a@example.org"), SkipReason::SyncDisabled),
        (
            &enabled,
            CiviPostEvent {
                op: "create".to_string(),
                ..email_edit(7, billing, "a@example.org")
            },
            SkipReason::NotAnEdit,
        ),
        (
            &enabled,
            CiviPostEvent {
                object_name: "Phone".to_string(),
                ..email_edit(7, billing, "a@example.org")
            },
            SkipReason::NotAnEmail,
        ),
        (&enabled, email_edit(7, 99, "a@example.org"), SkipReason::UnmappedLocationType),
        (
            &enabled,
            CiviPostEvent {
                object_ref: json!({"location_type_id": billing, "email": "a@example.org"}),
                ..email_edit(7, billing, "a@example.org")
            },
            SkipReason::MissingContact,
        ),
        (&enabled, email_edit(8, billing, "a@example.org"), SkipReason::NoLinkedUser),
    ];

    for (settings, event, expected) in cases {
        let sync = EmailSync::new(&civi, &woo, settings, &hooks);
        let outcome = sync.sync_civi_contact_email(&event).await;
        assert_eq!(outcome.skip_reason(), Some(expected), "event: {event:?}");
    }

    assert!(woo.customer_writes().is_empty());
    assert!(listener.seen().is_empty());
}

#[tokio::test]
async fn test_empty_civicrm_address_is_written_and_broadcast() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().with_customer(12, "old@example.org");
    let settings = settings();
    let (hooks, listener) = recording_hooks();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_civi_contact_email(&email_edit(7, BILLING_LOCATION.as_i64(), ""))
        .await;

    assert_eq!(
        outcome,
        EmailSyncOutcome::WooCommerceUpdated {
            user_id: UserId::new(12),
            role: EmailRole::Billing,
            written: true,
        }
    );
    assert_eq!(woo.billing_email(12).as_deref(), Some(""));
    assert_eq!(
        listener.seen(),
        vec![Notification::WcEmailUpdated(UserId::new(12), EmailRole::Billing)]
    );
}

#[tokio::test]
async fn test_uf_match_failure_counts_as_unlinked() {
    let civi = FakeCivi::new().link(7, 12).fail_uf_match();
    let woo = InMemoryStore::new();
    let settings = settings();
    let hooks = Hooks::new();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_civi_contact_email(&email_edit(7, BILLING_LOCATION.as_i64(), "a@example.org"))
        .await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::NoLinkedUser));
}

#[tokio::test]
async fn test_shipping_only_mapping_still_resolves_role() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new();
    let settings = Settings {
        location_types: LocationTypeMap {
            billing: None,
            shipping: Some(SHIPPING_LOCATION),
        },
        ..settings()
    };
    let hooks = Hooks::new();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_civi_contact_email(&email_edit(7, BILLING_LOCATION.as_i64(), "a@example.org"))
        .await;
    assert_eq!(outcome.skip_reason(), Some(SkipReason::UnmappedLocationType));
}

// =============================================================================
// Direction B: WooCommerce to CiviCRM
// =============================================================================

#[tokio::test]
async fn test_address_save_updates_existing_email() {
    let existing = EmailRecord {
        id: Some(EmailId::new(31)),
        ..EmailRecord::for_location(ContactId::new(7), BILLING_LOCATION)
            .with_email("old@example.org")
    };
    let civi = FakeCivi::new().link(7, 12).with_email(existing);
    let woo = InMemoryStore::new().with_customer(12, "new@example.org");
    let settings = settings();
    let (hooks, listener) = recording_hooks();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
        .await;

    let created = civi.created_emails();
    assert_eq!(created.len(), 1);
    assert_eq!(created[0].id, Some(EmailId::new(31)));
    assert_eq!(created[0].contact_id, Some(ContactId::new(7)));
    assert_eq!(created[0].location_type_id, Some(BILLING_LOCATION));
    assert_eq!(created[0].email.as_deref(), Some("new@example.org"));

    assert_eq!(
        outcome,
        EmailSyncOutcome::CiviCrmUpdated {
            contact_id: ContactId::new(7),
            email: Some(created[0].clone()),
        }
    );
    assert_eq!(
        listener.seen(),
        vec![Notification::CiviEmailUpdated(
            ContactId::new(7),
            Some(created[0].clone())
        )]
    );
}

#[tokio::test]
async fn test_failed_fetch_still_attempts_create() {
    let civi = FakeCivi::new().link(7, 12).fail_email_get();
    let woo = InMemoryStore::new().with_customer(12, "new@example.org");
    let settings = settings();
    let hooks = Hooks::new();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
        .await;

    let expected = EmailRecord::for_location(ContactId::new(7), BILLING_LOCATION)
        .with_email("new@example.org");
    assert_eq!(civi.created_emails(), vec![expected.clone()]);
    assert_eq!(
        outcome,
        EmailSyncOutcome::CiviCrmUpdated {
            contact_id: ContactId::new(7),
            email: Some(expected),
        }
    );
    assert_eq!(
        civi.debug_log(),
        vec!["CiviCRM Email.getsingle failed: Expected one Email but found 0".to_string()]
    );
}

#[tokio::test]
async fn test_failed_create_is_absorbed_and_broadcast() {
    let civi = FakeCivi::new().link(7, 12).fail_email_create();
    let woo = InMemoryStore::new().with_customer(12, "new@example.org");
    let settings = settings();
    let (hooks, listener) = recording_hooks();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
        .await;

    assert_eq!(
        outcome,
        EmailSyncOutcome::CiviCrmUpdated {
            contact_id: ContactId::new(7),
            email: None,
        }
    );
    assert_eq!(
        listener.seen(),
        vec![Notification::CiviEmailUpdated(ContactId::new(7), None)]
    );
    assert!(
        civi.debug_log()
            .iter()
            .any(|m| m.contains("Mandatory key(s) missing"))
    );
}

#[tokio::test]
async fn test_direction_b_guards() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().with_customer(12, "new@example.org");
    let (hooks, listener) = recording_hooks();
    let enabled = settings();
    let disabled = Settings {
        sync_contact_email: false,
        ..settings()
    };
    let no_billing = Settings {
        location_types: LocationTypeMap {
            billing: None,
            shipping: Some(SHIPPING_LOCATION),
        },
        ..settings()
    };
    let sync = EmailSync::new(&civi, &woo, &disabled, &hooks);
    assert_eq!(
        sync.sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
            .await
            .skip_reason(),
        Some(SkipReason::SyncDisabled)
    );

    let sync = EmailSync::new(&civi, &woo, &enabled, &hooks);
    assert_eq!(
        sync.sync_wp_user_woocommerce_email(&address_saved(12, "shipping"))
            .await
            .skip_reason(),
        Some(SkipReason::NotBillingAddress)
    );
    assert_eq!(
        sync.sync_wp_user_woocommerce_email(&address_saved(99, "billing"))
            .await
            .skip_reason(),
        Some(SkipReason::NoLinkedContact)
    );

    let sync = EmailSync::new(&civi, &woo, &no_billing, &hooks);
    assert_eq!(
        sync.sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
            .await
            .skip_reason(),
        Some(SkipReason::NoBillingLocationType)
    );

    assert!(civi.created_emails().is_empty());
    assert!(listener.seen().is_empty());
}

#[tokio::test]
async fn test_empty_billing_email_still_creates() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().with_customer(12, "");
    let settings = settings();
    let (hooks, listener) = recording_hooks();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
        .await;

    let created = civi.created_emails();
    assert_eq!(created.len(), 1);
    assert_eq!(created.first().and_then(|e| e.email.as_deref()), Some(""));
    assert!(matches!(
        outcome,
        EmailSyncOutcome::CiviCrmUpdated { email: Some(_), .. }
    ));
    assert_eq!(listener.seen().len(), 1);
}

#[tokio::test]
async fn test_unreadable_customer_is_reported() {
    let civi = FakeCivi::new().link(7, 12);
    let woo = InMemoryStore::new().fail_customer_reads();
    let settings = settings();
    let hooks = Hooks::new();
    let sync = EmailSync::new(&civi, &woo, &settings, &hooks);

    let outcome = sync
        .sync_wp_user_woocommerce_email(&address_saved(12, "billing"))
        .await;

    assert_eq!(outcome.skip_reason(), Some(SkipReason::CustomerUnavailable));
    assert!(civi.created_emails().is_empty());
    assert_eq!(civi.debug_log().len(), 1);
}
