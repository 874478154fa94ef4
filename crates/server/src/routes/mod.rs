//! HTTP route handlers for the sync server.
//!
//! # Route Structure
//!
//! ```text
//! GET  /health                                   - Health check
//!
//! # Lifecycle events
//! POST /hooks/civicrm/post                       - CiviCRM "post" event (Email edits)
//! POST /hooks/woocommerce/customer-address       - WooCommerce customer address saved
//!
//! # Contributions
//! POST /orders/{order_id}/contribution-params    - Add Line Items and shipping to params
//! GET  /contributions/{contribution_id}/line-items - Line Items of a Contribution
//!
//! # Products
//! GET  /products/{product_id}/financial-type     - Read the product's Financial Type
//! PUT  /products/{product_id}/financial-type     - Store a Financial Type id
//! ```

use axum::{
    Router,
    routing::{get, post},
};

use crate::state::AppState;

pub mod contributions;
pub mod events;
pub mod products;

/// Create the lifecycle event routes router.
pub fn event_routes() -> Router<AppState> {
    Router::new()
        .route("/civicrm/post", post(events::civicrm_post))
        .route(
            "/woocommerce/customer-address",
            post(events::woocommerce_customer_address),
        )
}

/// Create all routes for the sync server.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/hooks", event_routes())
        .route(
            "/orders/{order_id}/contribution-params",
            post(contributions::order_params),
        )
        .route(
            "/contributions/{contribution_id}/line-items",
            get(contributions::line_items),
        )
        .route(
            "/products/{product_id}/financial-type",
            get(products::financial_type).put(products::set_financial_type),
        )
}
