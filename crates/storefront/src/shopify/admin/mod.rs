//! Shopify Admin REST API client.
//!
//! Only customer metafields are used. The BFF stores each customer's active
//! cart ID there, so the Admin token never leaves this module.

use std::sync::Arc;

use async_trait::async_trait;
use reqwest::Method;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use tracing::instrument;

use headless_bff_core::CustomerId;

use crate::config::ShopifyConfig;
use crate::shopify::storefront::{retry_after, truncate};
use crate::shopify::types::{Metafield, MetafieldInput};
use crate::shopify::{CustomerMetafieldStore, ShopifyError};

/// Header carrying the Admin API access token.
const ACCESS_TOKEN_HEADER: &str = "X-Shopify-Access-Token";

// =============================================================================
// Wire Types
// =============================================================================

#[derive(Debug, Deserialize)]
struct MetafieldRecord {
    id: i64,
    namespace: String,
    key: String,
    value: serde_json::Value,
    #[serde(rename = "type")]
    kind: String,
}

impl From<MetafieldRecord> for Metafield {
    fn from(record: MetafieldRecord) -> Self {
        // Text metafields come back as JSON strings; anything else is kept verbatim.
        let value = match record.value {
            serde_json::Value::String(s) => s,
            serde_json::Value::Null => String::new(),
            other => other.to_string(),
        };
        Self {
            id: record.id,
            namespace: record.namespace,
            key: record.key,
            value,
            kind: record.kind,
        }
    }
}

#[derive(Debug, Deserialize)]
struct MetafieldList {
    metafields: Vec<MetafieldRecord>,
}

#[derive(Debug, Deserialize)]
struct MetafieldEnvelope {
    metafield: MetafieldRecord,
}

#[derive(Debug, Serialize)]
struct NewMetafield<'a> {
    namespace: &'a str,
    key: &'a str,
    value: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct MetafieldUpdate<'a> {
    id: i64,
    value: &'a str,
    #[serde(rename = "type")]
    kind: &'a str,
}

#[derive(Debug, Serialize)]
struct Wrapped<T> {
    metafield: T,
}

// =============================================================================
// AdminClient
// =============================================================================

/// Client for the Shopify Admin REST API.
#[derive(Clone)]
pub struct AdminClient {
    inner: Arc<AdminClientInner>,
}

struct AdminClientInner {
    client: reqwest::Client,
    base_url: String,
    access_token: SecretString,
}

impl AdminClient {
    /// Create a new Admin API client sharing the given HTTP client.
    #[must_use]
    pub fn new(config: &ShopifyConfig, client: reqwest::Client) -> Self {
        let base_url = format!("https://{}/admin/api/{}", config.store, config.api_version);

        Self {
            inner: Arc::new(AdminClientInner {
                client,
                base_url,
                access_token: config.admin_token.clone(),
            }),
        }
    }

    fn metafields_path(customer: CustomerId) -> String {
        format!("/customers/{customer}/metafields.json")
    }

    /// Listing path narrowed to one namespace and key, so the match is never
    /// pushed off the first page.
    fn filtered_metafields_path(customer: CustomerId, namespace: &str, key: &str) -> String {
        format!(
            "{}?namespace={}&key={}",
            Self::metafields_path(customer),
            urlencoding::encode(namespace),
            urlencoding::encode(key)
        )
    }

    fn metafield_path(customer: CustomerId, metafield_id: i64) -> String {
        format!("/customers/{customer}/metafields/{metafield_id}.json")
    }

    /// Send a request and return the raw response body.
    ///
    /// 404 maps to `NotFound`, 422 to `UserError`, 429 to `RateLimited`.
    async fn send<B: Serialize + Sync>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<String, ShopifyError> {
        let url = format!("{}{path}", self.inner.base_url);

        let mut request = self
            .inner
            .client
            .request(method.clone(), &url)
            .header(ACCESS_TOKEN_HEADER, self.inner.access_token.expose_secret());
        if let Some(body) = body {
            request = request.json(body);
        }

        let response = request.send().await?;
        let status = response.status();

        if status == reqwest::StatusCode::TOO_MANY_REQUESTS {
            return Err(ShopifyError::RateLimited(retry_after(&response)));
        }

        let text = response.text().await?;

        match status {
            s if s.is_success() => Ok(text),
            reqwest::StatusCode::NOT_FOUND => Err(ShopifyError::NotFound(path.to_string())),
            reqwest::StatusCode::UNPROCESSABLE_ENTITY => {
                Err(ShopifyError::UserError(truncate(&text, 200)))
            }
            _ => {
                tracing::error!(
                    method = %method,
                    path = %path,
                    status = %status,
                    body = %truncate(&text, 500),
                    "Shopify Admin API returned non-success status"
                );
                Err(ShopifyError::Status {
                    status: status.as_u16(),
                    body: truncate(&text, 200),
                })
            }
        }
    }

    async fn send_json<B: Serialize + Sync, T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> Result<T, ShopifyError> {
        let text = self.send(method, path, body).await?;
        Ok(serde_json::from_str(&text)?)
    }

    /// List a customer's metafields with the given namespace and key.
    ///
    /// # Errors
    ///
    /// Returns an error if the customer does not exist or the request fails.
    #[instrument(skip(self), fields(customer = %customer))]
    pub async fn list_metafields(
        &self,
        customer: CustomerId,
        namespace: &str,
        key: &str,
    ) -> Result<Vec<Metafield>, ShopifyError> {
        let path = Self::filtered_metafields_path(customer, namespace, key);
        let list: MetafieldList = self.send_json::<(), _>(Method::GET, &path, None).await?;
        Ok(list.metafields.into_iter().map(Metafield::from).collect())
    }
}

#[async_trait]
impl CustomerMetafieldStore for AdminClient {
    async fn find_metafield(
        &self,
        customer: CustomerId,
        namespace: &str,
        key: &str,
    ) -> Result<Option<Metafield>, ShopifyError> {
        Ok(self
            .list_metafields(customer, namespace, key)
            .await?
            .into_iter()
            .find(|m| m.namespace == namespace && m.key == key))
    }

    #[instrument(skip(self, input), fields(customer = %customer, key = %input.key))]
    async fn upsert_metafield(
        &self,
        customer: CustomerId,
        input: &MetafieldInput,
    ) -> Result<Metafield, ShopifyError> {
        let existing = self
            .find_metafield(customer, &input.namespace, &input.key)
            .await?;

        let envelope: MetafieldEnvelope = match existing {
            Some(current) => {
                let body = Wrapped {
                    metafield: MetafieldUpdate {
                        id: current.id,
                        value: &input.value,
                        kind: &input.kind,
                    },
                };
                self.send_json(
                    Method::PUT,
                    &Self::metafield_path(customer, current.id),
                    Some(&body),
                )
                .await?
            }
            None => {
                let body = Wrapped {
                    metafield: NewMetafield {
                        namespace: &input.namespace,
                        key: &input.key,
                        value: &input.value,
                        kind: &input.kind,
                    },
                };
                self.send_json(Method::POST, &Self::metafields_path(customer), Some(&body))
                    .await?
            }
        };

        Ok(envelope.metafield.into())
    }
}
