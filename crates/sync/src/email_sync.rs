//! Keeping a customer's billing email in step between CiviCRM and WooCommerce.
//!
//! Two independent handlers, one per direction. Neither returns an error:
//! every failure is reported and the handler finishes with an
//! [`EmailSyncOutcome`] describing how far it got.

use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};
use woo_civi_core::{ContactId, EmailRole, UserId};

use crate::civicrm::{CiviApi, EmailRecord, UfMatch};
use crate::diagnostics::report_failure;
use crate::hooks::Hooks;
use crate::settings::Settings;
use crate::woocommerce::WooStore;

/// A CiviCRM `post` event, as forwarded by the CiviCRM side.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CiviPostEvent {
    /// `create`, `edit`, `delete`, ...
    pub op: String,
    /// Entity name, e.g. `Email`.
    pub object_name: String,
    #[serde(default)]
    pub object_id: Value,
    /// The saved object.
    #[serde(default)]
    pub object_ref: Value,
}

/// A WooCommerce customer address save.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CustomerAddressEvent {
    pub user_id: UserId,
    /// Address type, `billing` or `shipping`.
    pub load_address: String,
}

/// Why a handler stopped before syncing anything.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    SyncDisabled,
    NotAnEdit,
    NotAnEmail,
    MalformedEmail,
    UnmappedLocationType,
    MissingContact,
    NoLinkedUser,
    NotBillingAddress,
    NoLinkedContact,
    NoBillingLocationType,
    CustomerUnavailable,
}

/// How an email sync handler finished.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum EmailSyncOutcome {
    Skipped {
        reason: SkipReason,
    },
    /// CiviCRM to WooCommerce. `written` is false when the role has no
    /// WooCommerce field or the update failed.
    #[serde(rename = "woocommerce_updated")]
    WooCommerceUpdated {
        user_id: UserId,
        role: EmailRole,
        written: bool,
    },
    /// WooCommerce to CiviCRM. `email` is `None` when `Email.create` failed.
    #[serde(rename = "civicrm_updated")]
    CiviCrmUpdated {
        contact_id: ContactId,
        email: Option<EmailRecord>,
    },
}

impl EmailSyncOutcome {
    const fn skipped(reason: SkipReason) -> Self {
        Self::Skipped { reason }
    }

    /// The skip reason, if the handler stopped early.
    #[must_use]
    pub const fn skip_reason(&self) -> Option<SkipReason> {
        match self {
            Self::Skipped { reason } => Some(*reason),
            Self::WooCommerceUpdated { .. } | Self::CiviCrmUpdated { .. } => None,
        }
    }
}

/// The two email sync handlers.
#[derive(Clone, Copy)]
pub struct EmailSync<'a> {
    civi: &'a dyn CiviApi,
    woo: &'a dyn WooStore,
    settings: &'a Settings,
    hooks: &'a Hooks,
}

impl<'a> EmailSync<'a> {
    #[must_use]
    pub const fn new(
        civi: &'a dyn CiviApi,
        woo: &'a dyn WooStore,
        settings: &'a Settings,
        hooks: &'a Hooks,
    ) -> Self {
        Self {
            civi,
            woo,
            settings,
            hooks,
        }
    }

    /// Push an edited CiviCRM Email to the linked WordPress user.
    #[instrument(skip_all, fields(op = %event.op, object_name = %event.object_name))]
    pub async fn sync_civi_contact_email(&self, event: &CiviPostEvent) -> EmailSyncOutcome {
        if !self.settings.sync_contact_email {
            return EmailSyncOutcome::skipped(SkipReason::SyncDisabled);
        }
        if event.op != "edit" {
            return EmailSyncOutcome::skipped(SkipReason::NotAnEdit);
        }
        if event.object_name != "Email" {
            return EmailSyncOutcome::skipped(SkipReason::NotAnEmail);
        }

        let email: EmailRecord = match serde_json::from_value(event.object_ref.clone()) {
            Ok(email) => email,
            Err(e) => {
                warn!(error = %e, "Email post event carries an unreadable object");
                return EmailSyncOutcome::skipped(SkipReason::MalformedEmail);
            }
        };

        let Some(role) = email
            .location_type_id
            .and_then(|loc| self.settings.location_types.role_for(loc))
        else {
            return EmailSyncOutcome::skipped(SkipReason::UnmappedLocationType);
        };

        let Some(contact_id) = email.contact_id.filter(|id| id.is_set()) else {
            return EmailSyncOutcome::skipped(SkipReason::MissingContact);
        };

        let Some(uf_match) = self.linked_user(contact_id).await else {
            return EmailSyncOutcome::skipped(SkipReason::NoLinkedUser);
        };
        let user_id = uf_match.uf_id;

        let address = email.email.as_deref().map(str::trim).unwrap_or_default();

        // WooCommerce has no shipping email field.
        let written = if role.has_woocommerce_field() {
            match self.woo.update_customer_email(user_id, role, address).await {
                Ok(()) => {
                    info!(%user_id, %role, "WooCommerce email updated from CiviCRM");
                    true
                }
                Err(e) => {
                    report_failure(
                        self.civi,
                        "EmailSync::sync_civi_contact_email",
                        &format!("Unable to update WooCommerce customer email: {e}"),
                        &json!({ "user_id": user_id, "meta_key": role.user_meta_key() }),
                    )
                    .await;
                    false
                }
            }
        } else {
            debug!(%user_id, %role, "No WooCommerce field for this email role");
            false
        };

        self.hooks.notify_wc_email_updated(user_id, role);

        EmailSyncOutcome::WooCommerceUpdated {
            user_id,
            role,
            written,
        }
    }

    /// Push a WooCommerce customer's billing email to the linked Contact.
    #[instrument(skip_all, fields(user_id = %event.user_id, load_address = %event.load_address))]
    pub async fn sync_wp_user_woocommerce_email(
        &self,
        event: &CustomerAddressEvent,
    ) -> EmailSyncOutcome {
        if !self.settings.sync_contact_email {
            return EmailSyncOutcome::skipped(SkipReason::SyncDisabled);
        }
        if event.load_address != EmailRole::Billing.as_str() {
            return EmailSyncOutcome::skipped(SkipReason::NotBillingAddress);
        }

        let Some(uf_match) = self.linked_contact(event.user_id).await else {
            return EmailSyncOutcome::skipped(SkipReason::NoLinkedContact);
        };
        let contact_id = uf_match.contact_id;

        let Some(location_type_id) = self.settings.location_types.location_for(EmailRole::Billing)
        else {
            return EmailSyncOutcome::skipped(SkipReason::NoBillingLocationType);
        };

        let address = match self
            .woo
            .customer_email(event.user_id, EmailRole::Billing)
            .await
        {
            Ok(address) => address.unwrap_or_default(),
            Err(e) => {
                report_failure(
                    self.civi,
                    "EmailSync::sync_wp_user_woocommerce_email",
                    &format!("Unable to read WooCommerce customer: {e}"),
                    event,
                )
                .await;
                return EmailSyncOutcome::skipped(SkipReason::CustomerUnavailable);
            }
        };

        let existing = match self.civi.email_get_single(contact_id, location_type_id).await {
            Ok(existing) => existing,
            Err(e) => {
                report_failure(
                    self.civi,
                    "EmailSync::sync_wp_user_woocommerce_email",
                    &e.to_string(),
                    &EmailRecord::for_location(contact_id, location_type_id),
                )
                .await;
                EmailRecord::for_location(contact_id, location_type_id)
            }
        };

        let payload = existing.with_email(address);
        let created = match self.civi.email_create(&payload).await {
            Ok(created) => {
                info!(%contact_id, "CiviCRM email updated from WooCommerce");
                Some(created)
            }
            Err(e) => {
                report_failure(
                    self.civi,
                    "EmailSync::sync_wp_user_woocommerce_email",
                    &e.to_string(),
                    &payload,
                )
                .await;
                None
            }
        };

        self.hooks
            .notify_civi_email_updated(contact_id, created.as_ref());

        EmailSyncOutcome::CiviCrmUpdated {
            contact_id,
            email: created,
        }
    }

    async fn linked_user(&self, contact_id: ContactId) -> Option<UfMatch> {
        self.civi
            .uf_match_by_contact(contact_id)
            .await
            .unwrap_or_else(|e| {
                warn!(%contact_id, error = %e, "UF Match lookup by contact failed");
                None
            })
            .filter(|m| m.uf_id.is_set())
    }

    async fn linked_contact(&self, user_id: UserId) -> Option<UfMatch> {
        self.civi
            .uf_match_by_user(user_id)
            .await
            .unwrap_or_else(|e| {
                warn!(%user_id, error = %e, "UF Match lookup by user failed");
                None
            })
            .filter(|m| m.contact_id.is_set())
    }
}

impl std::fmt::Debug for EmailSync<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmailSync")
            .field("settings", self.settings)
            .field("hooks", self.hooks)
            .finish_non_exhaustive()
    }
}
