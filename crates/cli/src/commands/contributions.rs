//! Contribution params and Line Item commands.
//!
//! # Usage
//!
//! ```bash
//! woo-civi order-params 1042 --params '{"contact_id": 7, "total_amount": "42.00"}'
//! woo-civi line-items 311
//! ```

use woo_civi_core::{ContributionId, OrderId};
use woo_civi_sync::{ContributionParams, PriceSetCache, ProductSync, WooStore};

use super::{CommandError, Context, parse_object, print_json};

/// Run the "create from order" filters and print the resulting params.
pub async fn order_params(
    ctx: &Context,
    order_id: OrderId,
    raw_params: &str,
) -> Result<(), CommandError> {
    let params: ContributionParams = serde_json::from_value(parse_object(raw_params)?)?;

    tracing::info!("Loading WooCommerce order {}", order_id);
    let order = ctx.woo.order(order_id).await?;

    let price_sets = PriceSetCache::new();
    let sync = ProductSync::new(
        &ctx.civi,
        &ctx.woo,
        &ctx.settings,
        &ctx.hooks,
        &price_sets,
    );
    let params = sync.contribution_params_for_order(params, &order).await;

    print_json(&params)
}

/// Print the Line Items of a Contribution.
pub async fn line_items(ctx: &Context, contribution_id: ContributionId) -> Result<(), CommandError> {
    let price_sets = PriceSetCache::new();
    let sync = ProductSync::new(
        &ctx.civi,
        &ctx.woo,
        &ctx.settings,
        &ctx.hooks,
        &price_sets,
    );
    let items = sync.items_get_by_contribution_id(contribution_id).await;

    if items.is_empty() {
        tracing::warn!("No Line Items found for Contribution {}", contribution_id);
    }
    print_json(&items)
}
