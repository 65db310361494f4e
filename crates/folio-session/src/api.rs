//! Typed endpoint groups over [`ApiClient`].
//!
//! Each group borrows the client: `client.auth().login(&input)`.

use crate::error::ApiResult;
use crate::transport::{ApiClient, RequestConfig};
use crate::types::{
    AdminOrder, AuthPayload, AuthUser, CreateOrderInput, CredentialPair, DownloadToken,
    EbookDetail, EbookInput, EbookQuery, EbookSummary, LoginInput, Order, OrderSummary,
    Paginated, ReadingProgress, RegisterInput, Tag,
};
use reqwest::Method;
use serde_json::{json, Value};

impl ApiClient {
    pub fn auth(&self) -> AuthApi<'_> {
        AuthApi { client: self }
    }

    pub fn users(&self) -> UsersApi<'_> {
        UsersApi { client: self }
    }

    pub fn ebooks(&self) -> EbooksApi<'_> {
        EbooksApi { client: self }
    }

    pub fn tags(&self) -> TagsApi<'_> {
        TagsApi { client: self }
    }

    pub fn orders(&self) -> OrdersApi<'_> {
        OrdersApi { client: self }
    }

    pub fn downloads(&self) -> DownloadApi<'_> {
        DownloadApi { client: self }
    }

    pub fn reader(&self) -> ReaderApi<'_> {
        ReaderApi { client: self }
    }
}

pub struct AuthApi<'a> {
    client: &'a ApiClient,
}

impl AuthApi<'_> {
    pub async fn register(&self, input: &RegisterInput) -> ApiResult<AuthPayload> {
        self.client.post("/auth/register", input).await
    }

    pub async fn login(&self, input: &LoginInput) -> ApiResult<AuthPayload> {
        self.client.post("/auth/login", input).await
    }

    /// Exchange a refresh token for a new credential pair.
    pub async fn refresh(&self, refresh_token: &str) -> ApiResult<CredentialPair> {
        self.client
            .post("/auth/refresh", &json!({ "refreshToken": refresh_token }))
            .await
    }
}

pub struct UsersApi<'a> {
    client: &'a ApiClient,
}

impl UsersApi<'_> {
    /// The account the current access token belongs to.
    pub async fn me(&self) -> ApiResult<AuthUser> {
        self.client.get("/users/me").await
    }
}

pub struct EbooksApi<'a> {
    client: &'a ApiClient,
}

impl EbooksApi<'_> {
    pub async fn list(&self, query: &EbookQuery) -> ApiResult<Paginated<EbookSummary>> {
        self.client
            .get_with("/ebooks", RequestConfig { query: query.to_pairs() })
            .await
    }

    pub async fn detail(&self, id: &str) -> ApiResult<EbookDetail> {
        self.client.get(&format!("/ebooks/{}", id)).await
    }

    pub async fn create(&self, input: &EbookInput) -> ApiResult<EbookDetail> {
        self.client.post("/ebooks", input).await
    }

    pub async fn update(&self, id: &str, input: &EbookInput) -> ApiResult<EbookDetail> {
        self.client.patch(&format!("/ebooks/{}", id), input).await
    }

    pub async fn publish(&self, id: &str) -> ApiResult<Value> {
        self.client
            .patch(&format!("/ebooks/{}/publish", id), &json!({}))
            .await
    }

    pub async fn remove(&self, id: &str) -> ApiResult<Value> {
        self.client.delete(&format!("/ebooks/{}", id)).await
    }
}

pub struct TagsApi<'a> {
    client: &'a ApiClient,
}

impl TagsApi<'_> {
    pub async fn list(&self) -> ApiResult<Vec<Tag>> {
        self.client.get("/tags").await
    }

    pub async fn create(&self, name: &str) -> ApiResult<Tag> {
        self.client.post("/tags", &json!({ "name": name })).await
    }
}

pub struct OrdersApi<'a> {
    client: &'a ApiClient,
}

impl OrdersApi<'_> {
    pub async fn create(&self, input: &CreateOrderInput) -> ApiResult<OrderSummary> {
        self.client.post("/orders/create", input).await
    }

    pub async fn list_mine(&self) -> ApiResult<Vec<Order>> {
        self.client.get("/orders/me").await
    }

    /// Every order in the store. Admin only.
    pub async fn list_all(&self) -> ApiResult<Vec<AdminOrder>> {
        self.client.get("/orders").await
    }

    pub async fn detail(&self, order_id: &str) -> ApiResult<Order> {
        self.client.get(&format!("/orders/{}", order_id)).await
    }

    /// Ask the server to re-check the payment provider for this order.
    pub async fn refresh(&self, order_id: &str) -> ApiResult<Order> {
        self.client
            .request(
                Method::POST,
                &format!("/orders/{}/refresh", order_id),
                None,
                RequestConfig::default(),
            )
            .await
    }
}

pub struct DownloadApi<'a> {
    client: &'a ApiClient,
}

impl DownloadApi<'_> {
    /// Issue a fresh download token. Never consults the token cache.
    pub async fn request_token(&self, ebook_id: &str) -> ApiResult<DownloadToken> {
        self.client
            .post(&format!("/ebooks/{}/token", ebook_id), &json!({}))
            .await
    }
}

pub struct ReaderApi<'a> {
    client: &'a ApiClient,
}

impl ReaderApi<'_> {
    pub async fn update_progress(&self, progress: &ReadingProgress) -> ApiResult<Value> {
        self.client.patch("/reader/update-progress", progress).await
    }

    /// Last saved position, or `None` if the book was never opened.
    pub async fn get_progress(&self, ebook_id: &str) -> ApiResult<Option<ReadingProgress>> {
        self.client.get(&format!("/reader/{}", ebook_id)).await
    }
}
