//! Product Financial Type.

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use woo_civi_core::{FinancialTypeId, FinancialTypeSetting, ProductId};
use woo_civi_sync::PriceSetCache;

use crate::error::AppError;
use crate::state::AppState;

/// Response for the Financial Type of a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct FinancialTypeResponse {
    pub product_id: ProductId,
    /// Empty string when unset, `"exclude"`, or the id.
    pub financial_type: FinancialTypeSetting,
}

/// Request to store a Financial Type on a product.
#[derive(Debug, Serialize, Deserialize)]
pub struct SetFinancialTypeRequest {
    pub financial_type_id: FinancialTypeId,
}

/// GET /products/{product_id}/financial-type
///
/// # Errors
///
/// Returns `AppError` if the product cannot be loaded.
pub async fn financial_type(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
) -> Result<Json<FinancialTypeResponse>, AppError> {
    let price_sets = PriceSetCache::new();
    let financial_type = state
        .product_sync(&price_sets)
        .get_product_meta(product_id)
        .await?;

    Ok(Json(FinancialTypeResponse {
        product_id,
        financial_type,
    }))
}

/// PUT /products/{product_id}/financial-type
///
/// # Errors
///
/// Returns `AppError` if the id is not positive or the product cannot be
/// updated.
pub async fn set_financial_type(
    State(state): State<AppState>,
    Path(product_id): Path<ProductId>,
    Json(request): Json<SetFinancialTypeRequest>,
) -> Result<StatusCode, AppError> {
    if !request.financial_type_id.is_set() {
        return Err(AppError::BadRequest(
            "financial_type_id must be positive".to_string(),
        ));
    }

    let price_sets = PriceSetCache::new();
    state
        .product_sync(&price_sets)
        .set_product_meta(product_id, request.financial_type_id)
        .await?;

    tracing::info!(%product_id, financial_type_id = %request.financial_type_id, "Product Financial Type stored");
    Ok(StatusCode::NO_CONTENT)
}
