//! Contribution params and Line Items.

use std::collections::BTreeMap;

use axum::{
    Json,
    extract::{Path, State},
};
use woo_civi_core::{ContributionId, LineItemId, OrderId};
use woo_civi_sync::civicrm::LineItemRecord;
use woo_civi_sync::{ContributionParams, PriceSetCache};

use crate::error::AppError;
use crate::state::AppState;

/// Run the "create from order" filters over the posted params.
///
/// POST /orders/{order_id}/contribution-params
///
/// # Errors
///
/// Returns `AppError` if the order cannot be loaded from WooCommerce.
pub async fn order_params(
    State(state): State<AppState>,
    Path(order_id): Path<OrderId>,
    Json(params): Json<ContributionParams>,
) -> Result<Json<ContributionParams>, AppError> {
    if !order_id.is_set() {
        return Err(AppError::BadRequest(format!("invalid order id {order_id}")));
    }

    let order = state.woo().order(order_id).await?;

    let price_sets = PriceSetCache::new();
    let params = state
        .product_sync(&price_sets)
        .contribution_params_for_order(params, &order)
        .await;

    Ok(Json(params))
}

/// The Line Items CiviCRM holds for a Contribution.
///
/// GET /contributions/{contribution_id}/line-items
pub async fn line_items(
    State(state): State<AppState>,
    Path(contribution_id): Path<ContributionId>,
) -> Json<BTreeMap<LineItemId, LineItemRecord>> {
    let price_sets = PriceSetCache::new();
    Json(
        state
            .product_sync(&price_sets)
            .items_get_by_contribution_id(contribution_id)
            .await,
    )
}
