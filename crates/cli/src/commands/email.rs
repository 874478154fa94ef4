//! Email push commands.
//!
//! These replay the lifecycle events the server receives, so the same guards
//! apply: the sync toggle must be on and the user must be linked to a Contact.

use serde_json::json;
use woo_civi_core::{ContactId, EmailRole, LocationTypeId, UserId};
use woo_civi_sync::{CiviPostEvent, CustomerAddressEvent, EmailSync};

use super::{CommandError, Context, print_json};

fn email_sync(ctx: &Context) -> EmailSync<'_> {
    EmailSync::new(&ctx.civi, &ctx.woo, &ctx.settings, &ctx.hooks)
}

/// Push a WordPress user's billing email to CiviCRM.
pub async fn to_civicrm(ctx: &Context, user_id: UserId) -> Result<(), CommandError> {
    let event = CustomerAddressEvent {
        user_id,
        load_address: EmailRole::Billing.as_str().to_string(),
    };
    let outcome = email_sync(ctx).sync_wp_user_woocommerce_email(&event).await;
    print_json(&outcome)
}

/// Apply a CiviCRM Email edit to the linked WordPress user.
pub async fn to_woocommerce(
    ctx: &Context,
    contact_id: ContactId,
    location_type_id: LocationTypeId,
    email: &str,
) -> Result<(), CommandError> {
    let event = CiviPostEvent {
        op: "edit".to_string(),
        object_name: "Email".to_string(),
        object_id: serde_json::Value::Null,
        object_ref: json!({
            "contact_id": contact_id,
            "location_type_id": location_type_id,
            "email": email,
        }),
    };
    let outcome = email_sync(ctx).sync_civi_contact_email(&event).await;
    print_json(&outcome)
}
