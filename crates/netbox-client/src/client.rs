//! NetBox REST client (reqwest-based).
//!
//! Implements [`InventoryApi`] over the NetBox REST conventions:
//! `{server}/api/{endpoint}/` for collections, `{server}/api/{endpoint}/{id}/`
//! for single objects, `Authorization: Token <token>`, and
//! `{"count": n, "results": [...]}` list pages.

use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderName, HeaderValue, ACCEPT};
use reqwest::{Client, StatusCode};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::{debug, warn};

use netbox_reconcile::api::{InventoryApi, ListPage, ListQuery};
use netbox_reconcile::error::{ReconcileError, ReconcileResult};
use netbox_reconcile::ids::ObjectId;
use netbox_reconcile::record::{RemotePayload, RemoteRecord};

use crate::auth::ApiToken;
use crate::config::{ClientConfig, ConfigError};

/// Response of `GET /api/status/`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerStatus {
    #[serde(rename = "netbox-version")]
    pub netbox_version: String,

    #[serde(rename = "python-version", default, skip_serializing_if = "Option::is_none")]
    pub python_version: Option<String>,
}

/// One page of a list endpoint, as sent by the server.
#[derive(Debug, Deserialize)]
struct ListResponse {
    #[serde(default)]
    count: u64,
    #[serde(default)]
    results: Vec<RemoteRecord>,
}

/// NetBox HTTP client.
///
/// Wraps `reqwest::Client` with token authentication and the status mapping
/// the reconciliation core expects: 404 is `NotFound`, 5xx and transport
/// failures are `Unavailable`, any other 4xx is `Rejected`.
#[derive(Debug, Clone)]
pub struct NetboxClient {
    /// Server URL without trailing slash (e.g. "<https://netbox.example.com>").
    base_url: String,
    token: ApiToken,
    http_client: Client,
}

impl NetboxClient {
    /// Create a client from validated settings.
    pub fn new(config: &ClientConfig) -> Result<Self, ConfigError> {
        config.validate()?;

        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        for (name, value) in &config.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| ConfigError::InvalidValue("NETBOX_HEADERS".into(), e.to_string()))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| ConfigError::InvalidValue("NETBOX_HEADERS".into(), e.to_string()))?;
            headers.insert(name, value);
        }

        let http_client = Client::builder()
            .timeout(config.request_timeout())
            .danger_accept_invalid_certs(config.allow_insecure_https)
            .default_headers(headers)
            .user_agent(concat!("netbox-client/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| ConfigError::HttpClient(e.to_string()))?;

        Ok(Self::with_http_client(
            config.server_url.clone(),
            config.api_token.clone(),
            http_client,
        ))
    }

    /// Create a client with a pre-built `reqwest::Client` (for testing).
    #[must_use]
    pub fn with_http_client(base_url: String, token: ApiToken, http_client: Client) -> Self {
        let base_url = base_url.trim_end_matches('/').to_string();
        Self {
            base_url,
            token,
            http_client,
        }
    }

    /// Get the base URL.
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Probe the server (GET /api/status/).
    pub async fn server_status(&self) -> ReconcileResult<ServerStatus> {
        let url = format!("{}/api/status/", self.base_url);
        debug!("NetBox GET {}", url);
        let builder = self.token.apply(self.http_client.get(&url));
        let response = builder.send().await.map_err(transport_error)?;
        self.handle_response("status", response).await
    }

    fn collection_url(&self, endpoint: &str) -> String {
        format!("{}/api/{}/", self.base_url, endpoint.trim_matches('/'))
    }

    fn object_url(&self, endpoint: &str, id: ObjectId) -> String {
        format!("{}/api/{}/{}/", self.base_url, endpoint.trim_matches('/'), id)
    }

    // ── Response Handling ─────────────────────────────────────────────

    async fn handle_response<T: DeserializeOwned>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> ReconcileResult<T> {
        let status = response.status();

        if status.is_success() {
            let body = response.text().await.map_err(transport_error)?;
            serde_json::from_str(&body).map_err(|e| {
                ReconcileError::invalid_response(format!("failed to parse {endpoint} response: {e}"))
            })
        } else {
            self.handle_error_response(endpoint, response).await
        }
    }

    async fn handle_error_response<T>(
        &self,
        endpoint: &str,
        response: reqwest::Response,
    ) -> ReconcileResult<T> {
        let status = response.status();
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| "<no body>".to_string());
        let detail = if body.is_empty() {
            format!("HTTP {status}")
        } else {
            body
        };

        match status {
            StatusCode::NOT_FOUND => Err(ReconcileError::not_found(endpoint, detail)),
            s if s.is_server_error() => {
                warn!("NetBox server error on {}: {}", endpoint, status);
                Err(ReconcileError::unavailable(format!("HTTP {status}: {detail}")))
            }
            s if s.is_client_error() => {
                if s == StatusCode::TOO_MANY_REQUESTS {
                    warn!("NetBox rate limited requests to {}", endpoint);
                }
                Err(ReconcileError::Rejected {
                    status: status.as_u16(),
                    detail,
                })
            }
            _ => Err(ReconcileError::invalid_response(format!(
                "unexpected HTTP {status} from {endpoint}"
            ))),
        }
    }
}

fn transport_error(e: reqwest::Error) -> ReconcileError {
    warn!("NetBox request failed: {}", e);
    ReconcileError::unavailable_with_source("request to NetBox failed", e)
}

#[async_trait]
impl InventoryApi for NetboxClient {
    async fn list(&self, endpoint: &str, query: &ListQuery) -> ReconcileResult<ListPage> {
        let url = self.collection_url(endpoint);
        debug!("NetBox GET {} (filters={:?})", url, query.filters);

        let mut params: Vec<(&str, String)> = query
            .filters
            .iter()
            .map(|(k, v)| (k.as_str(), v.clone()))
            .collect();
        if let Some(limit) = query.limit {
            params.push(("limit", limit.to_string()));
        }

        let builder = self.token.apply(self.http_client.get(&url).query(&params));
        let response = builder.send().await.map_err(transport_error)?;
        let page: ListResponse = self.handle_response(endpoint, response).await?;
        Ok(ListPage {
            count: page.count,
            results: page.results,
        })
    }

    async fn create(&self, endpoint: &str, payload: &RemotePayload) -> ReconcileResult<RemoteRecord> {
        let url = self.collection_url(endpoint);
        debug!("NetBox POST {}", url);
        let builder = self.token.apply(self.http_client.post(&url)).json(payload);
        let response = builder.send().await.map_err(transport_error)?;
        self.handle_response(endpoint, response).await
    }

    async fn read(&self, endpoint: &str, id: ObjectId) -> ReconcileResult<RemoteRecord> {
        let url = self.object_url(endpoint, id);
        debug!("NetBox GET {}", url);
        let builder = self.token.apply(self.http_client.get(&url));
        let response = builder.send().await.map_err(transport_error)?;
        self.handle_response(endpoint, response).await
    }

    async fn update(
        &self,
        endpoint: &str,
        id: ObjectId,
        payload: &RemotePayload,
    ) -> ReconcileResult<RemoteRecord> {
        let url = self.object_url(endpoint, id);
        debug!("NetBox PUT {}", url);
        let builder = self.token.apply(self.http_client.put(&url)).json(payload);
        let response = builder.send().await.map_err(transport_error)?;
        self.handle_response(endpoint, response).await
    }

    async fn delete(&self, endpoint: &str, id: ObjectId) -> ReconcileResult<()> {
        let url = self.object_url(endpoint, id);
        debug!("NetBox DELETE {}", url);
        let builder = self.token.apply(self.http_client.delete(&url));
        let response = builder.send().await.map_err(transport_error)?;

        if response.status().is_success() {
            Ok(())
        } else {
            self.handle_error_response(endpoint, response).await
        }
    }
}
