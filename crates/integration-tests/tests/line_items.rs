//! Integration tests for the Order to Contribution Line Item mapper.
//!
//! Runs `ProductSync` against in-memory CiviCRM and WooCommerce fakes.

#![allow(clippy::unwrap_used, clippy::indexing_slicing)]

use serde_json::{Map, json};
use woo_civi_core::{
    ContributionId, FinancialTypeId, FinancialTypeSetting, LineItemId, OrderItemId, ProductId,
};
use woo_civi_integration_tests::{
    DEFAULT_PRICE_FIELD_ID, FALLBACK_FINANCIAL_TYPE, FakeCivi, InMemoryStore, cents,
    default_price_set, order, order_item, product, settings,
};
use woo_civi_sync::civicrm::LineItemRecord;
use woo_civi_sync::{ContributionParams, Hooks, PriceSetCache, ProductSync};

const DONATION: FinancialTypeId = FinancialTypeId::new(3);
const MEMBER_DUES: FinancialTypeId = FinancialTypeId::new(4);

fn seeded_params() -> ContributionParams {
    serde_json::from_value(json!({"contact_id": 7, "total_amount": "30.00"})).unwrap()
}

// =============================================================================
// Financial Type selection
// =============================================================================

#[tokio::test]
async fn test_single_shared_financial_type_becomes_contribution_type() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)))
        .with_product(product(21, "Tote", 1000, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(
        100,
        vec![
            order_item(1, 20, "Mug", 2, 1000),
            order_item(2, 21, "Tote", 1, 1000),
        ],
        0,
    );

    let params = sync.items_get_for_order(seeded_params(), &order).await;

    assert_eq!(params.financial_type_id, Some(DONATION));
    let line_items = params.line_items.as_ref().unwrap();
    assert_eq!(line_items.len(), 2);

    let mug = &line_items[&OrderItemId::new(1)];
    assert_eq!(mug.params, Some(Map::new()));
    let data = &mug.line_item[0];
    assert_eq!(data.price_field_id, DEFAULT_PRICE_FIELD_ID);
    assert_eq!(data.unit_price, cents(500));
    assert_eq!(data.qty, 2);
    assert_eq!(data.line_total, cents(1000));
    assert_eq!(data.tax_amount, Some(cents(0)));
    assert_eq!(data.label, "Mug");
    assert_eq!(data.entity_table.as_deref(), Some("civicrm_contribution"));
    assert_eq!(data.financial_type_id, Some(DONATION));

    // Caller's keys pass through
    assert_eq!(params.extra["contact_id"], json!(7));
    assert_eq!(params.extra["total_amount"], json!("30.00"));
}

#[tokio::test]
async fn test_mixed_financial_types_use_fallback() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)))
        .with_product(product(21, "Dues", 2000, FinancialTypeSetting::Id(MEMBER_DUES)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(
        101,
        vec![
            order_item(1, 20, "Mug", 1, 500),
            order_item(2, 21, "Dues", 1, 2000),
        ],
        0,
    );

    let params = sync.items_get_for_order(ContributionParams::default(), &order).await;

    assert_eq!(params.financial_type_id, Some(FALLBACK_FINANCIAL_TYPE));
    let line_items = params.line_items.unwrap();
    assert_eq!(
        line_items[&OrderItemId::new(2)].line_item[0].financial_type_id,
        Some(MEMBER_DUES)
    );
}

#[tokio::test]
async fn test_item_without_financial_type_omits_key_and_uses_fallback() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)))
        .with_product(product(22, "Sticker", 100, FinancialTypeSetting::Unset));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(
        102,
        vec![
            order_item(1, 20, "Mug", 1, 500),
            order_item(2, 22, "Sticker", 3, 300),
        ],
        0,
    );

    let params = sync.items_get_for_order(ContributionParams::default(), &order).await;

    assert_eq!(params.financial_type_id, Some(FALLBACK_FINANCIAL_TYPE));
    let serialized = serde_json::to_value(&params).unwrap();
    assert!(
        serialized["line_items"]["2"]["line_item"][0]
            .get("financial_type_id")
            .is_none()
    );
}

// =============================================================================
// Exclusion and empty input
// =============================================================================

#[tokio::test]
async fn test_excluded_product_never_appears() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)))
        .with_product(product(23, "Gift wrap", 200, FinancialTypeSetting::Exclude));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(
        103,
        vec![
            order_item(1, 20, "Mug", 1, 500),
            order_item(2, 23, "Gift wrap", 1, 200),
        ],
        0,
    );

    let params = sync.items_get_for_order(ContributionParams::default(), &order).await;

    let line_items = params.line_items.as_ref().unwrap();
    assert_eq!(line_items.len(), 1);
    assert!(!line_items.contains_key(&OrderItemId::new(2)));
    // Excluded items do not count towards the Financial Type choice
    assert_eq!(params.financial_type_id, Some(DONATION));
    // The note lists every item
    assert_eq!(params.note.as_deref(), Some("Mug x 1, Gift wrap x 1"));
}

#[tokio::test]
async fn test_empty_order_leaves_params_unchanged() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new();
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let empty = order(104, vec![], 500);
    let params = sync.items_build_for_order(seeded_params(), &empty).await;

    assert_eq!(params, seeded_params());
    assert_eq!(civi.price_set_calls(), 0);
}

#[tokio::test]
async fn test_items_get_for_order_on_empty_order_sets_note_and_empty_map() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new();
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let params = sync
        .items_get_for_order(ContributionParams::default(), &order(105, vec![], 0))
        .await;

    assert_eq!(params.note.as_deref(), Some(""));
    assert_eq!(params.line_items.map(|m| m.len()), Some(0));
    assert_eq!(params.financial_type_id, None);
}

#[tokio::test]
async fn test_missing_price_set_leaves_params_unchanged() {
    let civi = FakeCivi::without_price_set();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(106, vec![order_item(1, 20, "Mug", 1, 500)], 0);
    let params = sync.items_build_for_order(seeded_params(), &order).await;

    assert_eq!(params, seeded_params());
    assert_eq!(
        civi.debug_log(),
        vec!["Unable to retrieve default Price Set: CiviCRM PriceSet.getsingle failed: Expected one PriceSet but found 0".to_string()]
    );
}

#[tokio::test]
async fn test_unloadable_product_is_skipped() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(
        107,
        vec![
            order_item(1, 20, "Mug", 1, 500),
            order_item(2, 99, "Deleted product", 1, 700),
        ],
        0,
    );

    let params = sync.items_get_for_order(ContributionParams::default(), &order).await;

    let line_items = params.line_items.unwrap();
    assert_eq!(line_items.keys().copied().collect::<Vec<_>>(), vec![OrderItemId::new(1)]);
    assert_eq!(params.financial_type_id, Some(DONATION));
}

// =============================================================================
// Price Set cache
// =============================================================================

#[tokio::test]
async fn test_price_set_fetched_once_per_cache() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(108, vec![order_item(1, 20, "Mug", 1, 500)], 450);
    let params = sync
        .contribution_params_for_order(ContributionParams::default(), &order)
        .await;
    let _ = sync.items_build_for_order(params, &order).await;

    assert_eq!(civi.price_set_calls(), 1);

    // A new scope fetches again
    let fresh = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &fresh);
    let _ = sync
        .items_build_for_order(ContributionParams::default(), &order)
        .await;
    assert_eq!(civi.price_set_calls(), 2);
}

#[tokio::test]
async fn test_price_set_refetched_after_failure() {
    let civi = FakeCivi::new().fail_price_set_times(1);
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(109, vec![order_item(1, 20, "Mug", 1, 500)], 0);

    let first = sync
        .items_build_for_order(ContributionParams::default(), &order)
        .await;
    assert!(first.line_items.is_none());
    assert!(cache.cached().is_none());

    let second = sync
        .items_build_for_order(ContributionParams::default(), &order)
        .await;
    assert_eq!(second.line_items.map(|m| m.len()), Some(1));
    assert_eq!(civi.price_set_calls(), 2);
    assert!(cache.cached().is_some());
}

#[tokio::test]
async fn test_seeded_cache_never_fetches() {
    let civi = FakeCivi::without_price_set();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::with_data(default_price_set());
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let order = order(110, vec![order_item(1, 20, "Mug", 1, 500)], 450);
    let params = sync
        .contribution_params_for_order(ContributionParams::default(), &order)
        .await;

    let line_items = params.line_items.unwrap();
    assert_eq!(line_items.len(), 2);
    assert_eq!(
        line_items[&OrderItemId::new(1)].line_item[0].price_field_id,
        DEFAULT_PRICE_FIELD_ID
    );
    assert_eq!(civi.price_set_calls(), 0);
    assert!(civi.debug_log().is_empty());
}

// =============================================================================
// Line Item filters
// =============================================================================

#[tokio::test]
async fn test_filters_rewrite_entries_in_priority_order() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let cache = PriceSetCache::new();

    let mut hooks = Hooks::new();
    hooks
        .add_line_item_filter(20, |mut entry, _ctx| {
            entry.line_item[0].label.push_str(" (gift)");
            entry
        })
        .add_line_item_filter(10, |mut entry, ctx| {
            entry.line_item[0].label = format!("{} #{}", ctx.product.name, ctx.order.id);
            entry
                .params
                .get_or_insert_with(Map::new)
                .insert("membership_type_id".to_string(), json!(2));
            entry
        });

    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);
    let order = order(110, vec![order_item(1, 20, "Mug", 1, 500)], 0);
    let params = sync.items_get_for_order(ContributionParams::default(), &order).await;

    let entry = &params.line_items.as_ref().unwrap()[&OrderItemId::new(1)];
    assert_eq!(entry.line_item[0].label, "Mug #110 (gift)");
    assert_eq!(entry.params.as_ref().unwrap()["membership_type_id"], json!(2));
}

#[tokio::test]
async fn test_filter_sees_params_built_so_far() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Id(DONATION)))
        .with_product(product(21, "Tote", 1000, FinancialTypeSetting::Id(DONATION)));
    let settings = settings();
    let cache = PriceSetCache::new();

    let mut hooks = Hooks::new();
    hooks.add_line_item_filter(10, |mut entry, ctx| {
        let before = ctx.params.line_items.as_ref().map_or(0, |m| m.len());
        entry.line_item[0]
            .extra
            .insert("position".to_string(), json!(before));
        entry
    });

    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);
    let order = order(
        111,
        vec![
            order_item(1, 20, "Mug", 1, 500),
            order_item(2, 21, "Tote", 1, 1000),
        ],
        0,
    );
    let params = sync.items_get_for_order(ContributionParams::default(), &order).await;

    let line_items = params.line_items.unwrap();
    assert_eq!(line_items[&OrderItemId::new(1)].line_item[0].extra["position"], json!(0));
    assert_eq!(line_items[&OrderItemId::new(2)].line_item[0].extra["position"], json!(1));
}

// =============================================================================
// Line Items by Contribution
// =============================================================================

fn line_item_record(id: i64, contribution_id: i64, label: &str) -> LineItemRecord {
    serde_json::from_value(json!({
        "id": id.to_string(),
        "entity_table": "civicrm_contribution",
        "contribution_id": contribution_id.to_string(),
        "price_field_id": "11",
        "label": label,
        "qty": "1.00",
        "unit_price": "5.00",
        "line_total": "5.00",
        "tax_amount": "0.00",
        "financial_type_id": "3"
    }))
    .unwrap()
}

#[tokio::test]
async fn test_items_by_contribution_keyed_by_line_item_id() {
    let civi = FakeCivi::new().with_line_items(
        311,
        vec![line_item_record(40, 311, "Mug"), line_item_record(41, 311, "Shipping")],
    );
    let woo = InMemoryStore::new();
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let items = sync
        .items_get_by_contribution_id(ContributionId::new(311))
        .await;

    assert_eq!(items.len(), 2);
    assert_eq!(items[&LineItemId::new(41)].label, "Shipping");
    assert_eq!(items[&LineItemId::new(40)].extra["entity_table"], json!("civicrm_contribution"));
}

#[tokio::test]
async fn test_items_by_contribution_empty_for_unset_id() {
    let civi = FakeCivi::new().fail_line_items();
    let woo = InMemoryStore::new();
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let items = sync.items_get_by_contribution_id(ContributionId::new(0)).await;

    assert!(items.is_empty());
    // No remote call, nothing reported
    assert!(civi.debug_log().is_empty());
}

#[tokio::test]
async fn test_items_by_contribution_error_is_reported_and_empty() {
    let civi = FakeCivi::new().fail_line_items();
    let woo = InMemoryStore::new();
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    let items = sync
        .items_get_by_contribution_id(ContributionId::new(311))
        .await;

    assert!(items.is_empty());
    assert_eq!(
        civi.debug_log(),
        vec!["Error trying to find Line Items by Contribution ID".to_string()]
    );
}

// =============================================================================
// Product meta
// =============================================================================

#[tokio::test]
async fn test_product_meta_round_trip_through_store() {
    let civi = FakeCivi::new();
    let woo = InMemoryStore::new()
        .with_product(product(20, "Mug", 500, FinancialTypeSetting::Unset));
    let settings = settings();
    let hooks = Hooks::new();
    let cache = PriceSetCache::new();
    let sync = ProductSync::new(&civi, &woo, &settings, &hooks, &cache);

    assert_eq!(
        sync.get_product_meta(ProductId::new(20)).await.unwrap(),
        FinancialTypeSetting::Unset
    );

    sync.set_product_meta(ProductId::new(20), MEMBER_DUES)
        .await
        .unwrap();

    assert_eq!(
        sync.get_product_meta(ProductId::new(20)).await.unwrap(),
        FinancialTypeSetting::Id(MEMBER_DUES)
    );
    assert!(sync.get_product_meta(ProductId::new(404)).await.is_err());
}
