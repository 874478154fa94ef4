//! Mapping WooCommerce orders and products onto CiviCRM Line Items.

use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, json};
use tracing::{debug, instrument, warn};
use woo_civi_core::{
    ContributionId, FinancialTypeId, FinancialTypeSetting, LineItemId, ProductId,
};

use crate::civicrm::{CiviApi, CiviError, LineItemRecord};
use crate::diagnostics::report_failure;
use crate::hooks::{Hooks, LineItemContext};
use crate::params::{
    CONTRIBUTION_ENTITY_TABLE, ContributionParams, LineItemData, LineItemEntry, SHIPPING_LABEL,
    SHIPPING_LINE_ITEM_KEY,
};
use crate::price_set::PriceSetCache;
use crate::settings::Settings;
use crate::woocommerce::{Order, OrderItem, WooError, WooStore};

/// Builds Contribution params from WooCommerce orders and reads or writes the
/// Financial Type of products.
///
/// Borrowed for the duration of one request; the [`PriceSetCache`] decides
/// how long the default Price Set is reused.
#[derive(Clone, Copy)]
pub struct ProductSync<'a> {
    civi: &'a dyn CiviApi,
    woo: &'a dyn WooStore,
    settings: &'a Settings,
    hooks: &'a Hooks,
    price_sets: &'a PriceSetCache,
}

impl<'a> ProductSync<'a> {
    #[must_use]
    pub const fn new(
        civi: &'a dyn CiviApi,
        woo: &'a dyn WooStore,
        settings: &'a Settings,
        hooks: &'a Hooks,
        price_sets: &'a PriceSetCache,
    ) -> Self {
        Self {
            civi,
            woo,
            settings,
            hooks,
            price_sets,
        }
    }

    /// Add the order's Line Items and shipping to the Contribution params.
    pub async fn contribution_params_for_order(
        &self,
        params: ContributionParams,
        order: &Order,
    ) -> ContributionParams {
        let params = self.items_get_for_order(params, order).await;
        self.shipping_get_for_order(params, order).await
    }

    /// Set the note, reset `line_items` and add one Line Item per order item.
    #[instrument(skip(self, params, order), fields(order_id = %order.id))]
    pub async fn items_get_for_order(
        &self,
        mut params: ContributionParams,
        order: &Order,
    ) -> ContributionParams {
        params.note = Some(note_generate(order.items.values()));
        params.line_items = Some(BTreeMap::new());
        self.items_build_for_order(params, order).await
    }

    /// Add one Line Item per order item and pick the Contribution's
    /// Financial Type.
    ///
    /// Returns `params` unchanged when the order is empty or the default
    /// Price Set is unavailable.
    #[instrument(skip(self, params, order), fields(order_id = %order.id))]
    pub async fn items_build_for_order(
        &self,
        mut params: ContributionParams,
        order: &Order,
    ) -> ContributionParams {
        if order.is_empty() {
            return params;
        }

        let Some(default_price_set) = self.price_sets.get(self.civi).await else {
            return params;
        };
        let price_field_id = default_price_set.price_field.id;

        let mut financial_types = HashSet::new();

        for (item_id, item) in &order.items {
            let product = match self.woo.product(item.product_id).await {
                Ok(product) => product,
                Err(e) => {
                    warn!(
                        item_id = %item_id,
                        product_id = %item.product_id,
                        error = %e,
                        "Skipping order item whose product could not be loaded"
                    );
                    continue;
                }
            };

            if product.financial_type.is_excluded() {
                debug!(item_id = %item_id, product_id = %product.id, "Product excluded from sync");
                continue;
            }

            let data = LineItemData {
                price_field_id,
                unit_price: product.price,
                qty: item.quantity,
                line_total: item.total,
                tax_amount: Some(item.total_tax),
                label: product.name.clone(),
                entity_table: Some(CONTRIBUTION_ENTITY_TABLE.to_string()),
                financial_type_id: product.financial_type.id(),
                extra: Map::new(),
            };

            let context = LineItemContext {
                item,
                product: &product,
                order,
                params: &params,
            };
            let entry = self
                .hooks
                .apply_line_item_filters(LineItemEntry::contribution(data), &context);

            params.line_items_mut().insert(*item_id, entry);
            financial_types.insert(product.financial_type);
        }

        params.financial_type_id =
            contribution_financial_type(financial_types, self.settings.fallback_financial_type);

        params
    }

    /// Add the shipping cost as a Line Item at key `0`.
    #[instrument(skip(self, params, order), fields(order_id = %order.id))]
    pub async fn shipping_get_for_order(
        &self,
        mut params: ContributionParams,
        order: &Order,
    ) -> ContributionParams {
        if order.is_empty() {
            return params;
        }

        let Some(default_price_set) = self.price_sets.get(self.civi).await else {
            return params;
        };

        let cost = order.shipping_total;
        if !cost.is_positive() {
            return params;
        }

        let Some(shipping_financial_type) = self.settings.shipping_financial_type else {
            report_failure(
                self.civi,
                "ProductSync::shipping_get_for_order",
                "There must be a default Shipping Financial Type set.",
                &params,
            )
            .await;
            return params;
        };

        let entry = LineItemEntry {
            params: None,
            line_item: vec![LineItemData {
                price_field_id: default_price_set.price_field.id,
                unit_price: cost,
                qty: 1,
                line_total: cost,
                tax_amount: None,
                label: SHIPPING_LABEL.to_string(),
                entity_table: None,
                financial_type_id: Some(shipping_financial_type),
                extra: Map::new(),
            }],
        };

        if let Some(replaced) = params.line_items_mut().insert(SHIPPING_LINE_ITEM_KEY, entry) {
            warn!(
                replaced = ?replaced,
                "Shipping Line Item replaced an existing entry at key 0"
            );
        }

        params
    }

    /// The Line Items of an existing Contribution, keyed by Line Item id.
    ///
    /// Empty for an unset id and on any CiviCRM failure.
    #[instrument(skip(self))]
    pub async fn items_get_by_contribution_id(
        &self,
        contribution_id: ContributionId,
    ) -> BTreeMap<LineItemId, LineItemRecord> {
        if !contribution_id.is_set() {
            return BTreeMap::new();
        }

        match self.civi.line_items_by_contribution(contribution_id).await {
            Ok(items) => items,
            Err(e) => {
                let message = match &e {
                    CiviError::Api { .. } => {
                        "Error trying to find Line Items by Contribution ID".to_string()
                    }
                    other => format!("Unable to reach CiviCRM for Line Items: {other}"),
                };
                report_failure(
                    self.civi,
                    "ProductSync::items_get_by_contribution_id",
                    &message,
                    &json!({ "contribution_id": contribution_id }),
                )
                .await;
                BTreeMap::new()
            }
        }
    }

    /// The Financial Type setting stored on a product.
    ///
    /// # Errors
    ///
    /// Returns error if the product cannot be loaded.
    pub async fn get_product_meta(
        &self,
        product_id: ProductId,
    ) -> Result<FinancialTypeSetting, WooError> {
        Ok(self.woo.product(product_id).await?.financial_type)
    }

    /// Store a Financial Type id on a product. The id is not checked against
    /// CiviCRM.
    ///
    /// # Errors
    ///
    /// Returns error if the product cannot be updated.
    pub async fn set_product_meta(
        &self,
        product_id: ProductId,
        financial_type_id: FinancialTypeId,
    ) -> Result<(), WooError> {
        self.woo
            .set_product_financial_type(product_id, financial_type_id)
            .await
    }
}

impl std::fmt::Debug for ProductSync<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProductSync")
            .field("settings", self.settings)
            .field("hooks", self.hooks)
            .finish_non_exhaustive()
    }
}

/// Summarize order items as `"<name> x <quantity>"`, comma separated.
pub fn note_generate<'i, I>(items: I) -> String
where
    I: IntoIterator<Item = &'i OrderItem>,
{
    items
        .into_iter()
        .map(|item| format!("{} x {}", item.name, item.quantity))
        .collect::<Vec<_>>()
        .join(", ")
}

/// The Contribution's Financial Type given the settings of its synced items.
///
/// When every item shares one Financial Type id that id wins. Mixed types,
/// items without a type, or no items at all fall back to `fallback`.
pub fn contribution_financial_type<I>(
    settings: I,
    fallback: Option<FinancialTypeId>,
) -> Option<FinancialTypeId>
where
    I: IntoIterator<Item = FinancialTypeSetting>,
{
    let distinct: HashSet<FinancialTypeSetting> = settings.into_iter().collect();
    let mut iter = distinct.into_iter();
    match (iter.next(), iter.next()) {
        (Some(FinancialTypeSetting::Id(id)), None) => Some(id),
        _ => fallback,
    }
}
