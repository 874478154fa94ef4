//! WooCommerce REST API access.
//!
//! # API Reference
//!
//! - Base URL: `{site}/wp-json/wc/v3`
//! - Authentication: consumer key/secret via HTTP basic auth (HTTPS only)
//! - Product meta: `meta_data: [{"key": ..., "value": ...}]`
//! - Customer billing email: `billing.email` (stored as `billing_email` user meta)

mod client;
mod types;

pub use client::WooClient;
pub use types::*;

use async_trait::async_trait;
use thiserror::Error;
use woo_civi_core::{EmailRole, FinancialTypeId, OrderId, ProductId, UserId};

/// Errors that can occur when interacting with the WooCommerce API.
#[derive(Debug, Error)]
pub enum WooError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// API returned an error response.
    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    /// Resource not found.
    #[error("Not found: {0}")]
    NotFound(String),

    /// Unauthorized (invalid consumer key or secret).
    #[error("Unauthorized: invalid consumer credentials")]
    Unauthorized,

    /// Failed to parse response.
    #[error("Parse error: {0}")]
    Parse(String),

    /// The store has no field for the requested data.
    #[error("Unsupported: {0}")]
    Unsupported(String),
}

/// The WooCommerce operations the sync relies on.
#[async_trait]
pub trait WooStore: Send + Sync {
    /// Load an order with its line items.
    async fn order(&self, order_id: OrderId) -> Result<Order, WooError>;

    /// Load a product (or variation) with its Financial Type meta.
    async fn product(&self, product_id: ProductId) -> Result<Product, WooError>;

    /// Store a Financial Type id in the product's meta.
    async fn set_product_financial_type(
        &self,
        product_id: ProductId,
        financial_type_id: FinancialTypeId,
    ) -> Result<(), WooError>;

    /// The customer's email for an address role, `None` when empty.
    async fn customer_email(
        &self,
        user_id: UserId,
        role: EmailRole,
    ) -> Result<Option<String>, WooError>;

    /// Overwrite the customer's `<role>_email` field.
    async fn update_customer_email(
        &self,
        user_id: UserId,
        role: EmailRole,
        email: &str,
    ) -> Result<(), WooError>;
}
