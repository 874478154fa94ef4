//! WooCommerce domain types used by the mapper.
//!
//! These are the shapes the sync works with, converted from the REST API's
//! wire format in the client.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use woo_civi_core::{Amount, FinancialTypeSetting, OrderId, OrderItemId, ProductId};

/// A WooCommerce order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub id: OrderId,
    /// Line items keyed by WooCommerce item id.
    #[serde(default)]
    pub items: BTreeMap<OrderItemId, OrderItem>,
    /// Total shipping cost, excluding tax.
    #[serde(default)]
    pub shipping_total: Amount,
}

impl Order {
    /// Whether the order has no line items.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

/// One line of a WooCommerce order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OrderItem {
    pub id: OrderItemId,
    /// Item name as shown on the order.
    pub name: String,
    /// The product (or variation) this line refers to.
    pub product_id: ProductId,
    pub quantity: i64,
    /// Line total after discounts, excluding tax.
    pub total: Amount,
    /// Tax on the line total.
    #[serde(default)]
    pub total_tax: Amount,
}

/// A WooCommerce product, reduced to what the sync needs.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Product {
    pub id: ProductId,
    pub name: String,
    /// Current price.
    #[serde(default)]
    pub price: Amount,
    /// The CiviCRM Financial Type stored in product meta.
    #[serde(default)]
    pub financial_type: FinancialTypeSetting,
}
