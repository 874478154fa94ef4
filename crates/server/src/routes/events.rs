//! Lifecycle events forwarded by WordPress and CiviCRM.
//!
//! Both handlers always answer 200 with the sync outcome; a skipped or
//! partially failed sync is not an HTTP error.

use axum::{Json, extract::State};
use woo_civi_sync::{CiviPostEvent, CustomerAddressEvent, EmailSyncOutcome};

use crate::state::AppState;

/// POST /hooks/civicrm/post
pub async fn civicrm_post(
    State(state): State<AppState>,
    Json(event): Json<CiviPostEvent>,
) -> Json<EmailSyncOutcome> {
    Json(state.email_sync().sync_civi_contact_email(&event).await)
}

/// POST /hooks/woocommerce/customer-address
pub async fn woocommerce_customer_address(
    State(state): State<AppState>,
    Json(event): Json<CustomerAddressEvent>,
) -> Json<EmailSyncOutcome> {
    Json(
        state
            .email_sync()
            .sync_wp_user_woocommerce_email(&event)
            .await,
    )
}
