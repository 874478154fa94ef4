//! WooCommerce `wc/v3` REST client.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::json;
use tracing::instrument;
use url::Url;
use woo_civi_core::{
    Amount, EmailRole, FINANCIAL_TYPE_META_KEY, FinancialTypeId, FinancialTypeSetting, OrderId,
    OrderItemId, ProductId, UserId,
};

use super::types::{Order, OrderItem, Product};
use super::{WooError, WooStore};
use crate::config::WooConfig;

/// REST namespace below the site URL.
const API_PATH: &str = "wp-json/wc/v3/";

/// WooCommerce REST API client.
#[derive(Clone)]
pub struct WooClient {
    inner: Arc<WooClientInner>,
}

struct WooClientInner {
    client: reqwest::Client,
    api_root: Url,
    consumer_key: String,
    consumer_secret: SecretString,
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Deserialize)]
struct WireOrder {
    id: OrderId,
    #[serde(default)]
    line_items: Vec<WireLineItem>,
    #[serde(default)]
    shipping_total: Amount,
}

#[derive(Debug, Deserialize)]
struct WireLineItem {
    id: OrderItemId,
    #[serde(default)]
    name: String,
    product_id: ProductId,
    #[serde(default)]
    variation_id: Option<ProductId>,
    quantity: i64,
    #[serde(default)]
    total: Amount,
    #[serde(default)]
    total_tax: Amount,
}

#[derive(Debug, Deserialize)]
struct WireProduct {
    id: ProductId,
    #[serde(default)]
    name: String,
    #[serde(default)]
    price: Amount,
    #[serde(default)]
    meta_data: Vec<WireMeta>,
}

#[derive(Debug, Deserialize)]
struct WireMeta {
    key: String,
    #[serde(default)]
    value: serde_json::Value,
}

#[derive(Debug, Deserialize)]
struct WireCustomer {
    #[serde(default)]
    billing: WireBilling,
}

#[derive(Debug, Default, Deserialize)]
struct WireBilling {
    #[serde(default)]
    email: Option<String>,
}

fn convert_order(order: WireOrder) -> Order {
    Order {
        id: order.id,
        items: order
            .line_items
            .into_iter()
            .map(|line| (line.id, convert_line_item(line)))
            .collect(),
        shipping_total: order.shipping_total,
    }
}

fn convert_line_item(line: WireLineItem) -> OrderItem {
    OrderItem {
        id: line.id,
        name: line.name,
        product_id: line
            .variation_id
            .filter(ProductId::is_set)
            .unwrap_or(line.product_id),
        quantity: line.quantity,
        total: line.total,
        total_tax: line.total_tax,
    }
}

fn convert_product(product: WireProduct) -> Product {
    let financial_type = product
        .meta_data
        .iter()
        .find(|meta| meta.key == FINANCIAL_TYPE_META_KEY)
        .map_or(FinancialTypeSetting::Unset, |meta| {
            FinancialTypeSetting::from_meta(Some(&meta.value))
        });

    Product {
        id: product.id,
        name: product.name,
        price: product.price,
        financial_type,
    }
}

impl WooClient {
    /// Create a new WooCommerce API client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build or the site URL cannot
    /// be extended with the REST path.
    pub fn new(config: &WooConfig) -> Result<Self, WooError> {
        let mut site = config.base_url.clone();
        if !site.path().ends_with('/') {
            let path = format!("{}/", site.path());
            site.set_path(&path);
        }
        let api_root = site
            .join(API_PATH)
            .map_err(|e| WooError::Parse(format!("Invalid WooCommerce URL: {e}")))?;

        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(WooClientInner {
                client,
                api_root,
                consumer_key: config.consumer_key.clone(),
                consumer_secret: config.consumer_secret.clone(),
            }),
        })
    }

    fn url(&self, path: &str) -> Result<Url, WooError> {
        self.inner
            .api_root
            .join(path)
            .map_err(|e| WooError::Parse(format!("Invalid path {path}: {e}")))
    }

    /// Execute a GET request against the REST API.
    async fn get<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, WooError> {
        let response = self
            .inner
            .client
            .get(self.url(path)?)
            .basic_auth(
                &self.inner.consumer_key,
                Some(self.inner.consumer_secret.expose_secret()),
            )
            .send()
            .await?;
        Self::handle_response(response).await
    }

    /// Execute a PUT request against the REST API.
    async fn put<B: serde::Serialize + Sync>(&self, path: &str, body: &B) -> Result<(), WooError> {
        let response = self
            .inner
            .client
            .put(self.url(path)?)
            .basic_auth(
                &self.inner.consumer_key,
                Some(self.inner.consumer_secret.expose_secret()),
            )
            .json(body)
            .send()
            .await?;
        Self::handle_response::<serde_json::Value>(response)
            .await
            .map(|_| ())
    }

    /// Handle API response and parse JSON.
    async fn handle_response<T: serde::de::DeserializeOwned>(
        response: reqwest::Response,
    ) -> Result<T, WooError> {
        let status = response.status();

        if status.is_success() {
            return response
                .json()
                .await
                .map_err(|e| WooError::Parse(format!("Failed to parse response: {e}")));
        }

        Err(Self::parse_error(response).await)
    }

    /// Parse error response from the REST API.
    async fn parse_error(response: reqwest::Response) -> WooError {
        let status = response.status().as_u16();

        if status == 401 || status == 403 {
            return WooError::Unauthorized;
        }

        let url = response.url().path().to_string();
        if status == 404 {
            return WooError::NotFound(url);
        }

        // WordPress REST errors look like {"code": "...", "message": "..."}
        let message = response
            .json::<serde_json::Value>()
            .await
            .ok()
            .and_then(|body| body.get("message").and_then(|m| m.as_str()).map(String::from))
            .unwrap_or_else(|| "Unknown error".to_string());

        WooError::Api { status, message }
    }
}

impl std::fmt::Debug for WooClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WooClient")
            .field("api_root", &self.inner.api_root.as_str())
            .field("consumer_key", &self.inner.consumer_key)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl WooStore for WooClient {
    #[instrument(skip(self))]
    async fn order(&self, order_id: OrderId) -> Result<Order, WooError> {
        let order: WireOrder = self.get(&format!("orders/{order_id}")).await?;
        Ok(convert_order(order))
    }

    #[instrument(skip(self))]
    async fn product(&self, product_id: ProductId) -> Result<Product, WooError> {
        let product: WireProduct = self.get(&format!("products/{product_id}")).await?;
        Ok(convert_product(product))
    }

    #[instrument(skip(self))]
    async fn set_product_financial_type(
        &self,
        product_id: ProductId,
        financial_type_id: FinancialTypeId,
    ) -> Result<(), WooError> {
        let body = json!({
            "meta_data": [{
                "key": FINANCIAL_TYPE_META_KEY,
                "value": financial_type_id.as_i64(),
            }],
        });
        self.put(&format!("products/{product_id}"), &body).await
    }

    #[instrument(skip(self))]
    async fn customer_email(
        &self,
        user_id: UserId,
        role: EmailRole,
    ) -> Result<Option<String>, WooError> {
        if !role.has_woocommerce_field() {
            return Ok(None);
        }
        let customer: WireCustomer = self.get(&format!("customers/{user_id}")).await?;
        Ok(customer.billing.email.filter(|e| !e.trim().is_empty()))
    }

    #[instrument(skip(self, email))]
    async fn update_customer_email(
        &self,
        user_id: UserId,
        role: EmailRole,
        email: &str,
    ) -> Result<(), WooError> {
        if !role.has_woocommerce_field() {
            return Err(WooError::Unsupported(format!(
                "WooCommerce has no {} field",
                role.user_meta_key()
            )));
        }
        let body = json!({ role.as_str(): { "email": email } });
        self.put(&format!("customers/{user_id}"), &body).await
    }
}
