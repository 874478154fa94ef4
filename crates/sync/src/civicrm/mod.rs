//! CiviCRM APIv3 access.
//!
//! The sync only ever talks to CiviCRM through the [`CiviApi`] trait, so the
//! handlers can run against the REST client in production and an in-memory
//! fake in tests.
//!
//! # API Reference
//!
//! - Endpoint: the site's REST URL, e.g. `https://crm.example.org/civicrm/ajax/rest`
//! - Authentication: `api_key` (user key) + `key` (site key) form fields
//! - Request: `entity`, `action` and the JSON-encoded params as `json`
//! - Errors: HTTP 200 with `{"is_error": 1, "error_message": "..."}`

mod client;
mod types;

pub use client::CiviClient;
pub use types::*;

use std::collections::BTreeMap;

use async_trait::async_trait;
use serde_json::{Value, json};
use thiserror::Error;
use woo_civi_core::{ContactId, ContributionId, LineItemId, LocationTypeId, UserId};

/// Name of the reserved Price Set used for ad-hoc contributions.
pub const DEFAULT_PRICE_SET_NAME: &str = "default_contribution_amount";

/// Errors that can occur when interacting with the CiviCRM API.
#[derive(Debug, Error)]
pub enum CiviError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// CiviCRM answered with `is_error: 1`.
    #[error("CiviCRM {entity}.{action} failed: {message}")]
    Api {
        entity: String,
        action: String,
        message: String,
    },

    /// Non-success HTTP status.
    #[error("CiviCRM returned HTTP {status}: {message}")]
    Status { status: u16, message: String },

    /// JSON parsing failed.
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),

    /// The response was valid JSON but not the expected shape.
    #[error("Unexpected response: {0}")]
    UnexpectedResponse(String),
}

/// The CiviCRM operations the sync relies on.
#[async_trait]
pub trait CiviApi: Send + Sync {
    /// `LineItem.get` for one Contribution, keyed by Line Item id.
    async fn line_items_by_contribution(
        &self,
        contribution_id: ContributionId,
    ) -> Result<BTreeMap<LineItemId, LineItemRecord>, CiviError>;

    /// `PriceSet.getsingle` for the reserved default set, with its first Price Field.
    async fn default_price_set(&self) -> Result<DefaultPriceSet, CiviError>;

    /// UF Match for a Contact, `None` when the Contact has no WordPress user.
    async fn uf_match_by_contact(&self, contact_id: ContactId)
    -> Result<Option<UfMatch>, CiviError>;

    /// UF Match for a WordPress user, `None` when the user has no Contact.
    async fn uf_match_by_user(&self, user_id: UserId) -> Result<Option<UfMatch>, CiviError>;

    /// `Email.getsingle` by Contact and location type.
    async fn email_get_single(
        &self,
        contact_id: ContactId,
        location_type_id: LocationTypeId,
    ) -> Result<EmailRecord, CiviError>;

    /// `Email.create`, which updates in place when the payload carries an id.
    async fn email_create(&self, email: &EmailRecord) -> Result<EmailRecord, CiviError>;

    /// Write a message to CiviCRM's own debug log.
    async fn debug_log(&self, message: &str) -> Result<(), CiviError>;
}

/// Params of the `PriceSet.getsingle` call that finds the default Price Set.
#[must_use]
pub fn default_price_set_params() -> Value {
    json!({
        "name": DEFAULT_PRICE_SET_NAME,
        "is_reserved": 1,
        "api.PriceField.getsingle": {
            "price_set_id": "$value.id",
            "options": {
                "limit": 1,
                "sort": "id ASC",
            },
        },
    })
}
