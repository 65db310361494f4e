//! HTTP transport and the API client built on it.
//!
//! [`ApiClient`] is the only way requests leave the process. For every call it
//! reads the access token fresh from persisted storage, attaches it as a
//! bearer header, unwraps the `{ success: true, data }` envelope, and purges
//! both stored credentials when the server answers 401. Requests are never
//! retried.

use crate::error::{ApiError, ApiResult};
use async_trait::async_trait;
use folio_storage::CredentialStore;
use reqwest::Method;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use tracing::{debug, warn};
use url::Url;

/// A fully resolved request, ready for the wire.
#[derive(Debug, Clone)]
pub struct HttpRequest {
    pub method: Method,
    pub url: Url,
    pub bearer: Option<String>,
    pub body: Option<Value>,
}

/// Status code and raw body of a response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub body: String,
}

impl HttpResponse {
    pub fn new(status: u16, body: impl Into<String>) -> Self {
        Self {
            status,
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends one request and returns whatever the server answered.
///
/// Implementations only fail for requests that never got a response;
/// non-2xx statuses are returned as ordinary responses.
#[async_trait]
pub trait HttpTransport: Send + Sync {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse>;
}

/// Transport backed by a shared reqwest client.
#[derive(Debug, Clone, Default)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl HttpTransport for ReqwestTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let mut builder = self.client.request(request.method, request.url);
        if let Some(token) = &request.bearer {
            builder = builder.bearer_auth(token);
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        let status = response.status().as_u16();
        let body = response.text().await?;
        Ok(HttpResponse { status, body })
    }
}

/// Synchronous access to the persisted credentials.
pub trait CredentialProvider: Send + Sync {
    /// Current access token, read from storage at call time.
    fn access_token(&self) -> Option<String>;

    /// Remove both stored credentials.
    fn purge(&self);
}

impl CredentialProvider for CredentialStore {
    fn access_token(&self) -> Option<String> {
        match CredentialStore::access_token(self) {
            Ok(token) => token,
            Err(e) => {
                warn!(error = %e, "Failed to read access token, sending request unauthenticated");
                None
            }
        }
    }

    fn purge(&self) {
        if let Err(e) = self.clear() {
            warn!(error = %e, "Failed to purge stored credentials");
        }
    }
}

/// Per-request options.
#[derive(Debug, Clone, Default)]
pub struct RequestConfig {
    /// Query parameters appended to the endpoint URL, in order.
    pub query: Vec<(String, String)>,
}

impl RequestConfig {
    pub fn with_query<K, V>(pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            query: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Strip the `{ success: true, data }` envelope. Anything else passes through untouched.
pub fn unwrap_envelope(payload: Value) -> Value {
    match payload {
        Value::Object(mut map)
            if map.get("success") == Some(&Value::Bool(true)) && map.contains_key("data") =>
        {
            map.remove("data").unwrap_or(Value::Null)
        }
        other => other,
    }
}

/// Empty bodies decode as `null`; non-JSON bodies as a JSON string.
fn parse_body(body: &str) -> Value {
    if body.trim().is_empty() {
        return Value::Null;
    }
    serde_json::from_str(body).unwrap_or_else(|_| Value::String(body.to_string()))
}

/// Client for the storefront API.
pub struct ApiClient {
    base_url: Url,
    transport: Arc<dyn HttpTransport>,
    credentials: Arc<dyn CredentialProvider>,
}

impl ApiClient {
    pub fn new(
        base_url: Url,
        transport: Arc<dyn HttpTransport>,
        credentials: Arc<dyn CredentialProvider>,
    ) -> ApiResult<Self> {
        if base_url.cannot_be_a_base() {
            return Err(ApiError::InvalidUrl(format!(
                "{} cannot be used as a base URL",
                base_url
            )));
        }
        Ok(Self {
            base_url,
            transport,
            credentials,
        })
    }

    /// Client using the reqwest transport.
    pub fn with_reqwest(
        base_url: Url,
        credentials: Arc<dyn CredentialProvider>,
    ) -> ApiResult<Self> {
        Self::new(base_url, Arc::new(ReqwestTransport::new()), credentials)
    }

    pub fn base_url(&self) -> &Url {
        &self.base_url
    }

    /// Resolve `path` relative to the base URL, keeping any base path prefix.
    pub fn endpoint_url(&self, path: &str) -> ApiResult<Url> {
        let mut url = self.base_url.clone();
        {
            let mut segments = url
                .path_segments_mut()
                .map_err(|_| ApiError::InvalidUrl(self.base_url.to_string()))?;
            segments.pop_if_empty();
            for segment in path.split('/').filter(|s| !s.is_empty()) {
                segments.push(segment);
            }
        }
        Ok(url)
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::GET, path, None, RequestConfig::default())
            .await
    }

    pub async fn get_with<T: DeserializeOwned>(
        &self,
        path: &str,
        config: RequestConfig,
    ) -> ApiResult<T> {
        self.request(Method::GET, path, None, config).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = encode(body)?;
        self.request(Method::POST, path, Some(body), RequestConfig::default())
            .await
    }

    pub async fn patch<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> ApiResult<T> {
        let body = encode(body)?;
        self.request(Method::PATCH, path, Some(body), RequestConfig::default())
            .await
    }

    pub async fn delete<T: DeserializeOwned>(&self, path: &str) -> ApiResult<T> {
        self.request(Method::DELETE, path, None, RequestConfig::default())
            .await
    }

    /// Issue a request and decode the unwrapped payload as `T`.
    pub async fn request<T: DeserializeOwned>(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        config: RequestConfig,
    ) -> ApiResult<T> {
        let payload = self.request_value(method, path, body, config).await?;
        serde_json::from_value(payload).map_err(|e| ApiError::Decode(format!("{}: {}", path, e)))
    }

    async fn request_value(
        &self,
        method: Method,
        path: &str,
        body: Option<Value>,
        config: RequestConfig,
    ) -> ApiResult<Value> {
        let mut url = self.endpoint_url(path)?;
        if !config.query.is_empty() {
            url.query_pairs_mut().extend_pairs(config.query.iter());
        }

        let bearer = self.credentials.access_token();
        debug!(
            method = %method,
            path = %path,
            authenticated = bearer.is_some(),
            "API request"
        );

        let response = self
            .transport
            .send(HttpRequest {
                method: method.clone(),
                url,
                bearer,
                body,
            })
            .await
            .inspect_err(|e| warn!(method = %method, path = %path, error = %e, "API request failed"))?;

        if response.status == 401 {
            warn!(method = %method, path = %path, "Unauthorized response, purging stored credentials");
            self.credentials.purge();
        }

        if !response.is_success() {
            debug!(method = %method, path = %path, status = response.status, "API error response");
            return Err(ApiError::Http {
                status: response.status,
                body: response.body,
            });
        }

        Ok(unwrap_envelope(parse_body(&response.body)))
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}

fn encode<B: Serialize + ?Sized>(body: &B) -> ApiResult<Value> {
    serde_json::to_value(body).map_err(|e| ApiError::Encode(e.to_string()))
}
