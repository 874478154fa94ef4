//! Product Financial Type commands.

use serde_json::json;
use woo_civi_core::{FinancialTypeId, ProductId};
use woo_civi_sync::{PriceSetCache, ProductSync};

use super::{CommandError, Context, print_json};

fn product_sync<'a>(ctx: &'a Context, price_sets: &'a PriceSetCache) -> ProductSync<'a> {
    ProductSync::new(&ctx.civi, &ctx.woo, &ctx.settings, &ctx.hooks, price_sets)
}

/// Print a product's Financial Type setting.
pub async fn get(ctx: &Context, product_id: ProductId) -> Result<(), CommandError> {
    let price_sets = PriceSetCache::new();
    let setting = product_sync(ctx, &price_sets)
        .get_product_meta(product_id)
        .await?;

    print_json(&json!({ "product_id": product_id, "financial_type": setting }))
}

/// Store a Financial Type id on a product.
pub async fn set(
    ctx: &Context,
    product_id: ProductId,
    financial_type_id: FinancialTypeId,
) -> Result<(), CommandError> {
    if !financial_type_id.is_set() {
        return Err(CommandError::InvalidArgument(format!(
            "Financial Type id must be positive, got {financial_type_id}"
        )));
    }

    let price_sets = PriceSetCache::new();
    product_sync(ctx, &price_sets)
        .set_product_meta(product_id, financial_type_id)
        .await?;

    tracing::info!(
        "Stored Financial Type {} on product {}",
        financial_type_id,
        product_id
    );
    Ok(())
}
