//! Test doubles: a scripted transport and a fully wired in-memory stack.

use crate::download_tokens::DownloadTokenCache;
use crate::error::{ApiError, ApiResult};
use crate::session::SessionStore;
use crate::transport::{ApiClient, HttpRequest, HttpResponse, HttpTransport};
use async_trait::async_trait;
use folio_storage::{CredentialStore, KeyValueStore, MemoryStore};
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Base URL used by [`TestStack`].
pub const TEST_BASE_URL: &str = "http://localhost:3000/api";

enum Reply {
    Response(HttpResponse),
    Error(ApiError),
}

/// Transport that answers from a queue and records every request.
///
/// Replies are consumed in order. When the queue is empty the request fails
/// with a network error.
#[derive(Default)]
pub struct MockTransport {
    replies: Mutex<VecDeque<Reply>>,
    requests: Mutex<Vec<HttpRequest>>,
    delay: Option<Duration>,
    path_delays: Mutex<Vec<(String, Duration)>>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every reply waits `delay` before it is returned.
    pub fn with_delay(delay: Duration) -> Self {
        Self {
            delay: Some(delay),
            ..Self::default()
        }
    }

    /// Replies to paths ending with `suffix` wait `delay` instead of the default.
    pub fn delay_requests_to(&self, suffix: &str, delay: Duration) {
        self.path_delays.lock().push((suffix.to_string(), delay));
    }

    pub fn push(&self, response: HttpResponse) {
        self.replies.lock().push_back(Reply::Response(response));
    }

    pub fn push_json(&self, status: u16, body: Value) {
        self.push(HttpResponse::new(status, body.to_string()));
    }

    pub fn push_network_error(&self, message: &str) {
        self.replies
            .lock()
            .push_back(Reply::Error(ApiError::Network(message.to_string())));
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().clone()
    }

    pub fn last_request(&self) -> Option<HttpRequest> {
        self.requests.lock().last().cloned()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().len()
    }

    /// Requests whose path ends with `suffix`.
    pub fn requests_to(&self, suffix: &str) -> usize {
        self.requests
            .lock()
            .iter()
            .filter(|r| r.url.path().ends_with(suffix))
            .count()
    }
}

#[async_trait]
impl HttpTransport for MockTransport {
    async fn send(&self, request: HttpRequest) -> ApiResult<HttpResponse> {
        let delay = self
            .path_delays
            .lock()
            .iter()
            .find(|(suffix, _)| request.url.path().ends_with(suffix.as_str()))
            .map(|(_, delay)| *delay)
            .or(self.delay);
        self.requests.lock().push(request);
        let reply = self.replies.lock().pop_front();

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        match reply {
            Some(Reply::Response(response)) => Ok(response),
            Some(Reply::Error(e)) => Err(e),
            None => Err(ApiError::Network("no response queued".to_string())),
        }
    }
}

/// Storage, transport, API client, token cache, and session wired together.
pub struct TestStack {
    pub storage: Arc<dyn KeyValueStore>,
    pub transport: Arc<MockTransport>,
    pub credentials: CredentialStore,
    pub api: Arc<ApiClient>,
    pub tokens: Arc<DownloadTokenCache>,
    pub session: Arc<SessionStore>,
}

impl TestStack {
    pub fn new() -> Self {
        Self::build(Arc::new(MemoryStore::new()), Arc::new(MockTransport::new()))
    }

    /// Stack whose storage already holds a credential pair.
    pub fn with_credentials(access_token: &str, refresh_token: &str) -> Self {
        let storage = Arc::new(MemoryStore::new());
        CredentialStore::new(storage.clone())
            .set_pair(access_token, refresh_token)
            .expect("memory store write");
        Self::build(storage, Arc::new(MockTransport::new()))
    }

    /// Stack over caller-supplied storage and transport.
    pub fn build(storage: Arc<dyn KeyValueStore>, transport: Arc<MockTransport>) -> Self {
        let credentials = CredentialStore::new(storage.clone());
        let base = Url::parse(TEST_BASE_URL).expect("valid test URL");
        let api = Arc::new(
            ApiClient::new(base, transport.clone(), Arc::new(credentials.clone()))
                .expect("valid base URL"),
        );
        let tokens = Arc::new(DownloadTokenCache::new(storage.clone(), api.clone()));
        let session = Arc::new(SessionStore::new(
            api.clone(),
            credentials.clone(),
            tokens.clone(),
        ));

        Self {
            storage,
            transport,
            credentials,
            api,
            tokens,
            session,
        }
    }
}

impl Default for TestStack {
    fn default() -> Self {
        Self::new()
    }
}
