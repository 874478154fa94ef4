//! CiviCRM APIv3 REST client.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use secrecy::{ExposeSecret, SecretString};
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tracing::{debug, instrument};
use url::Url;
use woo_civi_core::{ContactId, ContributionId, LineItemId, LocationTypeId, UserId};

use super::types::{DefaultPriceSet, EmailRecord, LineItemRecord, PriceField, PriceSet, UfMatch};
use super::{CiviApi, CiviError, default_price_set_params};
use crate::config::CiviConfig;

/// Key under which CiviCRM nests the chained Price Field in the Price Set reply.
const CHAINED_PRICE_FIELD: &str = "api.PriceField.getsingle";

/// CiviCRM APIv3 REST client.
///
/// Every call is a form POST to the configured REST endpoint. Calls are
/// independent; there is no session and nothing is cached here.
#[derive(Clone)]
pub struct CiviClient {
    inner: Arc<CiviClientInner>,
}

struct CiviClientInner {
    client: reqwest::Client,
    rest_url: Url,
    api_key: SecretString,
    site_key: SecretString,
}

impl CiviClient {
    /// Create a new CiviCRM client.
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client fails to build.
    pub fn new(config: &CiviConfig) -> Result<Self, CiviError> {
        let mut headers = HeaderMap::new();
        // The ajax REST route rejects requests that don't look like XHR.
        headers.insert(
            "X-Requested-With",
            HeaderValue::from_static("XMLHttpRequest"),
        );

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(30))
            .build()?;

        Ok(Self {
            inner: Arc::new(CiviClientInner {
                client,
                rest_url: config.rest_url.clone(),
                api_key: config.api_key.clone(),
                site_key: config.site_key.clone(),
            }),
        })
    }

    /// Call `entity.action` with the given params and return the raw reply.
    ///
    /// # Errors
    ///
    /// Returns `CiviError::Api` when CiviCRM reports `is_error`, and
    /// `CiviError::Http`/`CiviError::Status` on transport failures.
    #[instrument(skip(self, params))]
    pub async fn call(&self, entity: &str, action: &str, params: &Value) -> Result<Value, CiviError> {
        let mut params = params.clone();
        if let Value::Object(map) = &mut params {
            map.insert("version".to_string(), json!(3));
        }
        let encoded = serde_json::to_string(&params)?;

        let form = [
            ("entity", entity),
            ("action", action),
            ("json", encoded.as_str()),
            ("api_key", self.inner.api_key.expose_secret()),
            ("key", self.inner.site_key.expose_secret()),
        ];

        let response = self
            .inner
            .client
            .post(self.inner.rest_url.clone())
            .form(&form)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let message = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(CiviError::Status {
                status: status.as_u16(),
                message,
            });
        }

        let body: Value = response.json().await?;
        if is_error(&body) {
            let message = body
                .get("error_message")
                .and_then(Value::as_str)
                .unwrap_or("Unknown error")
                .to_string();
            return Err(CiviError::Api {
                entity: entity.to_string(),
                action: action.to_string(),
                message,
            });
        }

        debug!(entity, action, "CiviCRM call succeeded");
        Ok(body)
    }

    async fn get_single<T: DeserializeOwned>(
        &self,
        entity: &str,
        params: &Value,
    ) -> Result<T, CiviError> {
        let mut body = self.call(entity, "getsingle", params).await?;
        strip_envelope(&mut body);
        Ok(serde_json::from_value(body)?)
    }

    async fn uf_match(&self, params: Value) -> Result<Option<UfMatch>, CiviError> {
        let body = self.call("UFMatch", "get", &params).await?;
        let mut matches = values_of::<UfMatch>(&body)?;
        Ok(matches.pop_first().map(|(_, m)| m))
    }
}

impl std::fmt::Debug for CiviClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CiviClient")
            .field("rest_url", &self.inner.rest_url.as_str())
            .field("api_key", &"[REDACTED]")
            .field("site_key", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl CiviApi for CiviClient {
    async fn line_items_by_contribution(
        &self,
        contribution_id: ContributionId,
    ) -> Result<BTreeMap<LineItemId, LineItemRecord>, CiviError> {
        let body = self
            .call(
                "LineItem",
                "get",
                &json!({ "contribution_id": contribution_id }),
            )
            .await?;
        let records = values_of::<LineItemRecord>(&body)?;
        Ok(records.into_values().map(|r| (r.id, r)).collect())
    }

    async fn default_price_set(&self) -> Result<DefaultPriceSet, CiviError> {
        let mut body = self
            .call("PriceSet", "getsingle", &default_price_set_params())
            .await?;
        strip_envelope(&mut body);
        split_default_price_set(body)
    }

    async fn uf_match_by_contact(
        &self,
        contact_id: ContactId,
    ) -> Result<Option<UfMatch>, CiviError> {
        self.uf_match(json!({ "contact_id": contact_id })).await
    }

    async fn uf_match_by_user(&self, user_id: UserId) -> Result<Option<UfMatch>, CiviError> {
        self.uf_match(json!({ "uf_id": user_id })).await
    }

    async fn email_get_single(
        &self,
        contact_id: ContactId,
        location_type_id: LocationTypeId,
    ) -> Result<EmailRecord, CiviError> {
        self.get_single(
            "Email",
            &json!({
                "contact_id": contact_id,
                "location_type_id": location_type_id,
            }),
        )
        .await
    }

    async fn email_create(&self, email: &EmailRecord) -> Result<EmailRecord, CiviError> {
        let body = self
            .call("Email", "create", &serde_json::to_value(email)?)
            .await?;
        values_of::<EmailRecord>(&body)?
            .pop_first()
            .map(|(_, record)| record)
            .ok_or_else(|| CiviError::UnexpectedResponse("Email.create returned no values".into()))
    }

    async fn debug_log(&self, message: &str) -> Result<(), CiviError> {
        self.call(
            "System",
            "log",
            &json!({ "level": "debug", "message": message }),
        )
        .await
        .map(|_| ())
    }
}

/// CiviCRM flags errors with `is_error: 1` (occasionally as a string).
fn is_error(body: &Value) -> bool {
    match body.get("is_error") {
        Some(Value::Number(n)) => n.as_i64() == Some(1),
        Some(Value::String(s)) => s == "1",
        Some(Value::Bool(b)) => *b,
        _ => false,
    }
}

/// Drop the envelope keys `getsingle` mixes into the returned record.
fn strip_envelope(body: &mut Value) {
    if let Value::Object(map) = body {
        map.remove("is_error");
    }
}

/// Decode the `values` of a `get`/`create` reply.
///
/// CiviCRM returns an object keyed by id for non-empty results and `[]` for
/// empty ones; sequential replies are arrays. All three decode to a map keyed
/// by position in id order.
fn values_of<T: DeserializeOwned>(body: &Value) -> Result<BTreeMap<usize, T>, CiviError> {
    let records: Vec<Value> = match body.get("values") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items.clone(),
        Some(Value::Object(map)) => {
            let mut keyed: Vec<(i64, Value)> = map
                .iter()
                .map(|(k, v)| (k.parse().unwrap_or(i64::MAX), v.clone()))
                .collect();
            keyed.sort_by_key(|(k, _)| *k);
            keyed.into_iter().map(|(_, v)| v).collect()
        }
        Some(other) => {
            return Err(CiviError::UnexpectedResponse(format!(
                "values is neither a list nor a map: {other}"
            )));
        }
    };

    records
        .into_iter()
        .enumerate()
        .map(|(i, v)| Ok((i, serde_json::from_value(v)?)))
        .collect()
}

/// Split the Price Set reply into the set and its chained Price Field.
fn split_default_price_set(body: Value) -> Result<DefaultPriceSet, CiviError> {
    let Value::Object(mut map) = body else {
        return Err(CiviError::UnexpectedResponse(
            "PriceSet.getsingle did not return an object".into(),
        ));
    };
    let price_field = map.remove(CHAINED_PRICE_FIELD).ok_or_else(|| {
        CiviError::UnexpectedResponse("default Price Set has no Price Field".into())
    })?;
    if is_error(&price_field) {
        return Err(CiviError::UnexpectedResponse(
            "default Price Set has no Price Field".into(),
        ));
    }

    let price_field: PriceField = serde_json::from_value(price_field)?;
    let price_set: PriceSet = serde_json::from_value(Value::Object(map))?;

    Ok(DefaultPriceSet {
        price_set,
        price_field,
    })
}
