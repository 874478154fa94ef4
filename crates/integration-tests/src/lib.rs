//! Integration tests for the WooCommerce ⇄ CiviCRM sync.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p woo-civi-integration-tests
//! ```
//!
//! No live CiviCRM or WooCommerce is needed: [`FakeCivi`] and
//! [`InMemoryStore`] stand in for both remote systems and record what the
//! handlers did to them.
//!
//! # Test Categories
//!
//! - `line_items` - Order to Contribution Line Item mapping
//! - `shipping` - Shipping Line Item
//! - `email_sync` - Billing email sync in both directions
//! - `server_routes` - HTTP surface of the sync server

#![allow(clippy::missing_panics_doc)]

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex, MutexGuard};

use async_trait::async_trait;
use rust_decimal::Decimal;
use serde_json::Map;
use woo_civi_core::{
    Amount, ContactId, ContributionId, EmailRole, FinancialTypeId, FinancialTypeSetting,
    LineItemId, LocationTypeId, OrderId, OrderItemId, PriceFieldId, PriceSetId, ProductId, UserId,
};
use woo_civi_sync::civicrm::{
    CiviApi, CiviError, DefaultPriceSet, EmailRecord, LineItemRecord, PriceField, PriceSet, UfMatch,
};
use woo_civi_sync::settings::LocationTypeMap;
use woo_civi_sync::woocommerce::{Order, OrderItem, Product, WooError, WooStore};
use woo_civi_sync::{Hooks, Settings, SyncListener};

/// Price Field id of the default Price Set served by [`FakeCivi`].
pub const DEFAULT_PRICE_FIELD_ID: PriceFieldId = PriceFieldId::new(11);
/// Fallback Financial Type in [`settings`].
pub const FALLBACK_FINANCIAL_TYPE: FinancialTypeId = FinancialTypeId::new(1);
/// Shipping Financial Type in [`settings`].
pub const SHIPPING_FINANCIAL_TYPE: FinancialTypeId = FinancialTypeId::new(7);
/// Billing location type in [`settings`].
pub const BILLING_LOCATION: LocationTypeId = LocationTypeId::new(5);
/// Shipping location type in [`settings`].
pub const SHIPPING_LOCATION: LocationTypeId = LocationTypeId::new(6);

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(std::sync::PoisonError::into_inner)
}

fn api_error(entity: &str, action: &str, message: &str) -> CiviError {
    CiviError::Api {
        entity: entity.to_string(),
        action: action.to_string(),
        message: message.to_string(),
    }
}

// =============================================================================
// Fixtures
// =============================================================================

/// An amount given in cents.
#[must_use]
pub fn cents(value: i64) -> Amount {
    Amount::new(Decimal::new(value, 2))
}

/// Settings with every option configured and email sync on.
#[must_use]
pub fn settings() -> Settings {
    Settings {
        fallback_financial_type: Some(FALLBACK_FINANCIAL_TYPE),
        shipping_financial_type: Some(SHIPPING_FINANCIAL_TYPE),
        sync_contact_email: true,
        location_types: LocationTypeMap {
            billing: Some(BILLING_LOCATION),
            shipping: Some(SHIPPING_LOCATION),
        },
    }
}

/// The default Price Set as CiviCRM ships it.
#[must_use]
pub fn default_price_set() -> DefaultPriceSet {
    DefaultPriceSet {
        price_set: PriceSet {
            id: PriceSetId::new(1),
            name: "default_contribution_amount".to_string(),
            title: Some("Contribution Amount".to_string()),
            extra: Map::new(),
        },
        price_field: PriceField {
            id: DEFAULT_PRICE_FIELD_ID,
            price_set_id: Some(PriceSetId::new(1)),
            name: "contribution_amount".to_string(),
            label: Some("Contribution Amount".to_string()),
            extra: Map::new(),
        },
    }
}

/// A product with a price in cents.
#[must_use]
pub fn product(id: i64, name: &str, price_cents: i64, setting: FinancialTypeSetting) -> Product {
    Product {
        id: ProductId::new(id),
        name: name.to_string(),
        price: cents(price_cents),
        financial_type: setting,
    }
}

/// An order item for `product_id`, with the total in cents.
#[must_use]
pub fn order_item(id: i64, product_id: i64, name: &str, quantity: i64, total_cents: i64) -> OrderItem {
    OrderItem {
        id: OrderItemId::new(id),
        name: name.to_string(),
        product_id: ProductId::new(product_id),
        quantity,
        total: cents(total_cents),
        total_tax: Amount::ZERO,
    }
}

/// An order with the given items and shipping cost in cents.
#[must_use]
pub fn order(id: i64, items: Vec<OrderItem>, shipping_cents: i64) -> Order {
    Order {
        id: OrderId::new(id),
        items: items.into_iter().map(|item| (item.id, item)).collect(),
        shipping_total: cents(shipping_cents),
    }
}

// =============================================================================
// CiviCRM fake
// =============================================================================

#[derive(Default)]
struct CiviState {
    price_set: Option<DefaultPriceSet>,
    price_set_failures: usize,
    price_set_calls: usize,
    line_items: BTreeMap<ContributionId, BTreeMap<LineItemId, LineItemRecord>>,
    line_items_fail: bool,
    uf_matches: Vec<UfMatch>,
    uf_match_fails: bool,
    emails: Vec<EmailRecord>,
    email_get_fails: bool,
    email_create_fails: bool,
    created_emails: Vec<EmailRecord>,
    debug_log: Vec<String>,
}

/// In-memory CiviCRM.
#[derive(Default)]
pub struct FakeCivi {
    state: Mutex<CiviState>,
}

impl FakeCivi {
    /// A CiviCRM with the default Price Set installed.
    #[must_use]
    pub fn new() -> Self {
        let civi = Self::default();
        lock(&civi.state).price_set = Some(default_price_set());
        civi
    }

    /// A CiviCRM where the default Price Set lookup always fails.
    #[must_use]
    pub fn without_price_set() -> Self {
        Self::default()
    }

    /// Fail the next `n` Price Set lookups.
    #[must_use]
    pub fn fail_price_set_times(self, n: usize) -> Self {
        lock(&self.state).price_set_failures = n;
        self
    }

    /// Link a Contact to a WordPress user.
    #[must_use]
    pub fn link(self, contact_id: i64, user_id: i64) -> Self {
        lock(&self.state).uf_matches.push(UfMatch {
            contact_id: ContactId::new(contact_id),
            uf_id: UserId::new(user_id),
        });
        self
    }

    /// Make every UF Match lookup fail.
    #[must_use]
    pub fn fail_uf_match(self) -> Self {
        lock(&self.state).uf_match_fails = true;
        self
    }

    /// Store an existing Email record.
    #[must_use]
    pub fn with_email(self, email: EmailRecord) -> Self {
        lock(&self.state).emails.push(email);
        self
    }

    /// Make `Email.getsingle` fail.
    #[must_use]
    pub fn fail_email_get(self) -> Self {
        lock(&self.state).email_get_fails = true;
        self
    }

    /// Make `Email.create` fail.
    #[must_use]
    pub fn fail_email_create(self) -> Self {
        lock(&self.state).email_create_fails = true;
        self
    }

    /// Store the Line Items of a Contribution.
    #[must_use]
    pub fn with_line_items(self, contribution_id: i64, items: Vec<LineItemRecord>) -> Self {
        lock(&self.state).line_items.insert(
            ContributionId::new(contribution_id),
            items.into_iter().map(|item| (item.id, item)).collect(),
        );
        self
    }

    /// Make `LineItem.get` answer with an error.
    #[must_use]
    pub fn fail_line_items(self) -> Self {
        lock(&self.state).line_items_fail = true;
        self
    }

    /// Number of Price Set lookups so far, failed ones included.
    pub fn price_set_calls(&self) -> usize {
        lock(&self.state).price_set_calls
    }

    /// Payloads accepted by `Email.create`.
    pub fn created_emails(&self) -> Vec<EmailRecord> {
        lock(&self.state).created_emails.clone()
    }

    /// Messages written to the CiviCRM debug log.
    pub fn debug_log(&self) -> Vec<String> {
        lock(&self.state).debug_log.clone()
    }
}

#[async_trait]
impl CiviApi for FakeCivi {
    async fn line_items_by_contribution(
        &self,
        contribution_id: ContributionId,
    ) -> Result<BTreeMap<LineItemId, LineItemRecord>, CiviError> {
        let state = lock(&self.state);
        if state.line_items_fail {
            return Err(api_error("LineItem", "get", "DB Error: no such table"));
        }
        Ok(state
            .line_items
            .get(&contribution_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn default_price_set(&self) -> Result<DefaultPriceSet, CiviError> {
        let mut state = lock(&self.state);
        state.price_set_calls += 1;
        if state.price_set_failures > 0 {
            state.price_set_failures -= 1;
            return Err(api_error("PriceSet", "getsingle", "Temporary failure"));
        }
        state
            .price_set
            .clone()
            .ok_or_else(|| api_error("PriceSet", "getsingle", "Expected one PriceSet but found 0"))
    }

    async fn uf_match_by_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Option<UfMatch>, CiviError> {
        let state = lock(&self.state);
        if state.uf_match_fails {
            return Err(api_error("UFMatch", "get", "Connection refused"));
        }
        Ok(state
            .uf_matches
            .iter()
            .find(|m| m.contact_id == contact_id)
            .copied())
    }

    async fn uf_match_by_user(&self, user_id: UserId) -> Result<Option<UfMatch>, CiviError> {
        let state = lock(&self.state);
        if state.uf_match_fails {
            return Err(api_error("UFMatch", "get", "Connection refused"));
        }
        Ok(state.uf_matches.iter().find(|m| m.uf_id == user_id).copied())
    }

    async fn email_get_single(
        &self,
        contact_id: ContactId,
        location_type_id: LocationTypeId,
    ) -> Result<EmailRecord, CiviError> {
        let state = lock(&self.state);
        if state.email_get_fails {
            return Err(api_error("Email", "getsingle", "Expected one Email but found 0"));
        }
        state
            .emails
            .iter()
            .find(|e| {
                e.contact_id == Some(contact_id) && e.location_type_id == Some(location_type_id)
            })
            .cloned()
            .ok_or_else(|| api_error("Email", "getsingle", "Expected one Email but found 0"))
    }

    async fn email_create(&self, email: &EmailRecord) -> Result<EmailRecord, CiviError> {
        let mut state = lock(&self.state);
        if state.email_create_fails {
            return Err(api_error("Email", "create", "Mandatory key(s) missing"));
        }
        state.created_emails.push(email.clone());
        Ok(email.clone())
    }

    async fn debug_log(&self, message: &str) -> Result<(), CiviError> {
        lock(&self.state).debug_log.push(message.to_string());
        Ok(())
    }
}

// =============================================================================
// WooCommerce fake
// =============================================================================

#[derive(Default)]
struct StoreState {
    orders: BTreeMap<OrderId, Order>,
    products: BTreeMap<ProductId, Product>,
    billing_emails: BTreeMap<UserId, String>,
    customer_reads_fail: bool,
    customer_writes: Vec<(UserId, EmailRole, String)>,
}

/// In-memory WooCommerce store.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<StoreState>,
}

impl InMemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_order(self, order: Order) -> Self {
        lock(&self.state).orders.insert(order.id, order);
        self
    }

    #[must_use]
    pub fn with_product(self, product: Product) -> Self {
        lock(&self.state).products.insert(product.id, product);
        self
    }

    /// A customer with a billing email.
    #[must_use]
    pub fn with_customer(self, user_id: i64, billing_email: &str) -> Self {
        lock(&self.state)
            .billing_emails
            .insert(UserId::new(user_id), billing_email.to_string());
        self
    }

    /// Make customer reads fail.
    #[must_use]
    pub fn fail_customer_reads(self) -> Self {
        lock(&self.state).customer_reads_fail = true;
        self
    }

    /// The stored billing email of a customer.
    pub fn billing_email(&self, user_id: i64) -> Option<String> {
        lock(&self.state)
            .billing_emails
            .get(&UserId::new(user_id))
            .cloned()
    }

    /// Every customer email write, in order.
    pub fn customer_writes(&self) -> Vec<(UserId, EmailRole, String)> {
        lock(&self.state).customer_writes.clone()
    }

    /// The stored Financial Type setting of a product.
    pub fn product_setting(&self, product_id: i64) -> Option<FinancialTypeSetting> {
        lock(&self.state)
            .products
            .get(&ProductId::new(product_id))
            .map(|p| p.financial_type)
    }
}

#[async_trait]
impl WooStore for InMemoryStore {
    async fn order(&self, order_id: OrderId) -> Result<Order, WooError> {
        lock(&self.state)
            .orders
            .get(&order_id)
            .cloned()
            .ok_or_else(|| WooError::NotFound(format!("orders/{order_id}")))
    }

    async fn product(&self, product_id: ProductId) -> Result<Product, WooError> {
        lock(&self.state)
            .products
            .get(&product_id)
            .cloned()
            .ok_or_else(|| WooError::NotFound(format!("products/{product_id}")))
    }

    async fn set_product_financial_type(
        &self,
        product_id: ProductId,
        financial_type_id: FinancialTypeId,
    ) -> Result<(), WooError> {
        let mut state = lock(&self.state);
        let product = state
            .products
            .get_mut(&product_id)
            .ok_or_else(|| WooError::NotFound(format!("products/{product_id}")))?;
        product.financial_type = FinancialTypeSetting::Id(financial_type_id);
        Ok(())
    }

    async fn customer_email(
        &self,
        user_id: UserId,
        role: EmailRole,
    ) -> Result<Option<String>, WooError> {
        let state = lock(&self.state);
        if state.customer_reads_fail {
            return Err(WooError::Unauthorized);
        }
        if role != EmailRole::Billing {
            return Ok(None);
        }
        Ok(state
            .billing_emails
            .get(&user_id)
            .filter(|e| !e.is_empty())
            .cloned())
    }

    async fn update_customer_email(
        &self,
        user_id: UserId,
        role: EmailRole,
        email: &str,
    ) -> Result<(), WooError> {
        let mut state = lock(&self.state);
        if role != EmailRole::Billing {
            return Err(WooError::Unsupported("no shipping_email field".to_string()));
        }
        state.billing_emails.insert(user_id, email.to_string());
        state.customer_writes.push((user_id, role, email.to_string()));
        Ok(())
    }
}

// =============================================================================
// Listener
// =============================================================================

/// A notification received by [`RecordingListener`].
#[derive(Debug, Clone, PartialEq)]
pub enum Notification {
    WcEmailUpdated(UserId, EmailRole),
    CiviEmailUpdated(ContactId, Option<EmailRecord>),
}

/// Records every sync notification.
#[derive(Default)]
pub struct RecordingListener {
    seen: Mutex<Vec<Notification>>,
}

impl RecordingListener {
    /// Notifications received so far.
    pub fn seen(&self) -> Vec<Notification> {
        lock(&self.seen).clone()
    }
}

impl SyncListener for RecordingListener {
    fn wc_email_updated(&self, user_id: UserId, role: EmailRole) {
        lock(&self.seen).push(Notification::WcEmailUpdated(user_id, role));
    }

    fn civi_email_updated(&self, contact_id: ContactId, email: Option<&EmailRecord>) {
        lock(&self.seen).push(Notification::CiviEmailUpdated(contact_id, email.cloned()));
    }
}

/// Hooks with a single recording listener attached.
#[must_use]
pub fn recording_hooks() -> (Hooks, Arc<RecordingListener>) {
    let listener = Arc::new(RecordingListener::default());
    let mut hooks = Hooks::new();
    hooks.add_listener(listener.clone());
    (hooks, listener)
}
