//! Parameters of the CiviCRM Order API "create" call.
//!
//! The shape follows CiviCRM's Order API: each entry of `line_items` carries
//! the params of the entity it creates (empty for plain contributions) and a
//! list with one Line Item.
//!
//! ```json
//! {
//!   "note": "Mug x 2",
//!   "financial_type_id": 3,
//!   "line_items": {
//!     "17": {
//!       "params": {},
//!       "line_item": [{
//!         "price_field_id": 1, "unit_price": "5.00", "qty": 2,
//!         "line_total": "10.00", "tax_amount": "0.00", "label": "Mug",
//!         "entity_table": "civicrm_contribution", "financial_type_id": 3
//!       }]
//!     }
//!   }
//! }
//! ```

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use woo_civi_core::{Amount, FinancialTypeId, OrderItemId, PriceFieldId};

/// Key of the synthetic shipping Line Item.
pub const SHIPPING_LINE_ITEM_KEY: OrderItemId = OrderItemId::new(0);

/// `entity_table` of Line Items attached to the Contribution itself.
pub const CONTRIBUTION_ENTITY_TABLE: &str = "civicrm_contribution";

/// Label of the synthetic shipping Line Item.
pub const SHIPPING_LABEL: &str = "Shipping";

/// Params for creating a Contribution from an order.
///
/// Keys the mapper does not own are kept in `extra` and passed through.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContributionParams {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub line_items: Option<BTreeMap<OrderItemId, LineItemEntry>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_type_id: Option<FinancialTypeId>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl ContributionParams {
    /// The Line Items map, created empty if absent.
    pub fn line_items_mut(&mut self) -> &mut BTreeMap<OrderItemId, LineItemEntry> {
        self.line_items.get_or_insert_with(BTreeMap::new)
    }
}

/// One entry of `line_items`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemEntry {
    /// Params of the entity the Line Item creates (membership, participant).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub params: Option<Map<String, Value>>,
    pub line_item: Vec<LineItemData>,
}

impl LineItemEntry {
    /// An entry for a plain contribution Line Item.
    #[must_use]
    pub fn contribution(data: LineItemData) -> Self {
        Self {
            params: Some(Map::new()),
            line_item: vec![data],
        }
    }
}

/// A single CiviCRM Line Item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItemData {
    pub price_field_id: PriceFieldId,
    pub unit_price: Amount,
    pub qty: i64,
    /// Must equal `unit_price × qty`.
    pub line_total: Amount,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Amount>,
    pub label: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub entity_table: Option<String>,
    /// Omitted to inherit the Contribution's Financial Type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub financial_type_id: Option<FinancialTypeId>,
    /// Fields added by Line Item filters.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}
