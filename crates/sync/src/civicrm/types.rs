//! CiviCRM APIv3 record shapes.
//!
//! Only the fields the sync reads are typed; everything else a record carries
//! is kept in `extra` so that a fetched record can be sent back unchanged.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use woo_civi_core::{
    Amount, ContactId, ContributionId, EmailId, FinancialTypeId, LineItemId, LocationTypeId,
    PriceFieldId, PriceSetId, UserId,
};

/// A stored CiviCRM Line Item, as returned by `LineItem.get`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemRecord {
    pub id: LineItemId,
    #[serde(default)]
    pub contribution_id: Option<ContributionId>,
    #[serde(default)]
    pub price_field_id: Option<PriceFieldId>,
    #[serde(default)]
    pub financial_type_id: Option<FinancialTypeId>,
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub qty: Amount,
    #[serde(default)]
    pub unit_price: Amount,
    #[serde(default)]
    pub line_total: Amount,
    #[serde(default)]
    pub tax_amount: Amount,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The reserved Price Set backing ad-hoc contributions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceSet {
    pub id: PriceSetId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The Price Field every synthesized Line Item references.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PriceField {
    pub id: PriceFieldId,
    #[serde(default)]
    pub price_set_id: Option<PriceSetId>,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The default Price Set together with its first Price Field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DefaultPriceSet {
    pub price_set: PriceSet,
    pub price_field: PriceField,
}

/// A CiviCRM Email record.
///
/// `Email.getsingle` returns the full record; `Email.create` accepts the same
/// shape back, so unknown fields are preserved in `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EmailRecord {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<EmailId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub contact_id: Option<ContactId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location_type_id: Option<LocationTypeId>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl EmailRecord {
    /// An Email payload addressed only by contact and location type.
    #[must_use]
    pub fn for_location(contact_id: ContactId, location_type_id: LocationTypeId) -> Self {
        Self {
            contact_id: Some(contact_id),
            location_type_id: Some(location_type_id),
            ..Self::default()
        }
    }

    /// Replace the address, keeping every other field.
    #[must_use]
    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

/// A UF Match record linking a CiviCRM Contact to a WordPress user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct UfMatch {
    pub contact_id: ContactId,
    pub uf_id: UserId,
}
