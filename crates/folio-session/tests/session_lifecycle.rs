//! Session restoration, sign-in, sign-out, and credential rotation.

use folio_session::testutil::{MockTransport, TestStack};
use folio_session::{ApiError, LoginInput, RegisterInput, SessionError, SessionPhase};
use folio_storage::{KeyValueStore, MemoryStore, StorageKeys};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;

fn user_json(role: &str) -> Value {
    json!({"id": "u1", "name": "Ada", "email": "ada@example.com", "role": role})
}

fn auth_payload(access: &str, refresh: &str) -> Value {
    json!({
        "success": true,
        "data": {"user": user_json("USER"), "accessToken": access, "refreshToken": refresh}
    })
}

fn login_input() -> LoginInput {
    LoginInput {
        email: "ada@example.com".into(),
        password: "correct horse".into(),
    }
}

fn stored(stack: &TestStack, key: &str) -> Option<String> {
    stack.storage.get(key).unwrap()
}

#[tokio::test]
async fn hydrate_without_token_is_anonymous_and_offline() {
    let stack = TestStack::new();

    stack.session.hydrate().await;

    assert_eq!(stack.transport.request_count(), 0);
    let snapshot = stack.session.snapshot();
    assert!(snapshot.initialized);
    assert_eq!(snapshot.phase, SessionPhase::Anonymous);
    assert!(snapshot.user.is_none());
}

#[tokio::test]
async fn hydrate_with_valid_token_restores_user() {
    let stack = TestStack::with_credentials("a1", "r1");
    stack
        .transport
        .push_json(200, json!({"success": true, "data": user_json("ADMIN")}));

    stack.session.hydrate().await;

    let request = stack.transport.last_request().unwrap();
    assert_eq!(request.url.path(), "/api/users/me");
    assert_eq!(request.bearer.as_deref(), Some("a1"));

    let user = stack.session.user().unwrap();
    assert!(user.is_admin());
    assert_eq!(stack.session.phase(), SessionPhase::Authenticated);
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN).as_deref(), Some("a1"));
}

#[tokio::test]
async fn hydrate_is_idempotent() {
    let stack = TestStack::with_credentials("a1", "r1");
    stack.transport.push_json(200, user_json("USER"));

    stack.session.hydrate().await;
    stack.session.hydrate().await;
    stack.session.hydrate().await;

    assert_eq!(stack.transport.request_count(), 1);
    assert!(stack.session.is_authenticated());
}

#[tokio::test]
async fn hydrate_failure_logs_out_completely() {
    let stack = TestStack::with_credentials("stale", "r1");
    stack.storage.set(StorageKeys::DOWNLOAD_TOKENS, "{}").unwrap();
    stack
        .transport
        .push_json(401, json!({"statusCode": 401, "message": "Unauthorized"}));

    stack.session.hydrate().await;

    let snapshot = stack.session.snapshot();
    assert!(snapshot.initialized);
    assert_eq!(snapshot.phase, SessionPhase::Anonymous);
    assert!(snapshot.user.is_none());
    assert!(!stack.session.has_credentials());
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN), None);
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN), None);
    assert_eq!(stored(&stack, StorageKeys::DOWNLOAD_TOKENS), None);
}

#[tokio::test]
async fn hydrate_network_failure_also_logs_out() {
    let stack = TestStack::with_credentials("a1", "r1");
    stack.transport.push_network_error("connection refused");

    stack.session.hydrate().await;

    assert_eq!(stack.session.phase(), SessionPhase::Anonymous);
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN), None);
}

#[tokio::test]
async fn concurrent_hydrations_share_one_request() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(StorageKeys::ACCESS_TOKEN, "a1").unwrap();
    storage.set(StorageKeys::REFRESH_TOKEN, "r1").unwrap();
    let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(20)));
    transport.push_json(200, user_json("USER"));
    let stack = TestStack::build(storage, transport);

    tokio::join!(
        stack.session.hydrate(),
        stack.session.hydrate(),
        stack.session.hydrate()
    );

    assert_eq!(stack.transport.requests_to("/users/me"), 1);
    assert!(stack.session.is_authenticated());
}

#[tokio::test]
async fn login_persists_pair_and_authenticates() {
    let stack = TestStack::new();
    stack.transport.push_json(200, auth_payload("a1", "r1"));

    let user = stack.session.login(&login_input()).await.unwrap();

    assert_eq!(user.email, "ada@example.com");
    let snapshot = stack.session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Authenticated);
    assert!(snapshot.initialized);
    assert!(!snapshot.loading);
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN).as_deref(), Some("a1"));
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN).as_deref(), Some("r1"));

    let request = stack.transport.last_request().unwrap();
    assert_eq!(request.url.path(), "/api/auth/login");
    assert_eq!(
        request.body,
        Some(json!({"email": "ada@example.com", "password": "correct horse"}))
    );
}

#[tokio::test]
async fn login_failure_leaves_session_unchanged() {
    let stack = TestStack::new();
    stack.session.hydrate().await;
    stack
        .transport
        .push_json(400, json!({"message": "Invalid credentials"}));

    let err = stack.session.login(&login_input()).await.unwrap_err();

    let api_error = err.api_error().unwrap();
    assert_eq!(api_error.status(), Some(400));
    assert_eq!(api_error.server_message().as_deref(), Some("Invalid credentials"));
    let snapshot = stack.session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Anonymous);
    assert!(snapshot.user.is_none());
    assert!(!snapshot.loading);
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN), None);
}

#[tokio::test]
async fn loading_is_visible_while_login_is_in_flight() {
    let transport = Arc::new(MockTransport::with_delay(Duration::from_millis(50)));
    transport.push_json(200, auth_payload("a1", "r1"));
    let stack = TestStack::build(Arc::new(MemoryStore::new()), transport);

    let session = stack.session.clone();
    let login = tokio::spawn(async move { session.login(&login_input()).await });

    tokio::time::sleep(Duration::from_millis(10)).await;
    assert!(stack.session.is_loading());

    login.await.unwrap().unwrap();
    assert!(!stack.session.is_loading());
}

#[tokio::test]
async fn register_establishes_session() {
    let stack = TestStack::new();
    stack.transport.push_json(201, auth_payload("a9", "r9"));

    let user = stack
        .session
        .register(&RegisterInput {
            name: "Ada".into(),
            email: "ada@example.com".into(),
            password: "correct horse".into(),
        })
        .await
        .unwrap();

    assert_eq!(user.id, "u1");
    assert!(stack.session.is_authenticated());
    assert_eq!(stack.transport.last_request().unwrap().url.path(), "/api/auth/register");
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN).as_deref(), Some("a9"));
}

#[tokio::test]
async fn logout_clears_memory_storage_and_download_tokens() {
    let stack = TestStack::new();
    stack.transport.push_json(200, auth_payload("a1", "r1"));
    stack.session.login(&login_input()).await.unwrap();
    stack
        .storage
        .set(
            StorageKeys::DOWNLOAD_TOKENS,
            r#"{"b1":{"token":"dl","expiresAt":"2099-01-01T00:00:00Z"}}"#,
        )
        .unwrap();

    stack.session.logout();

    let snapshot = stack.session.snapshot();
    assert_eq!(snapshot.phase, SessionPhase::Anonymous);
    assert!(snapshot.initialized);
    assert!(snapshot.user.is_none());
    for key in StorageKeys::ALL {
        assert_eq!(stored(&stack, key), None, "{} should be removed", key);
    }

    // Idempotent
    stack.session.logout();
    assert_eq!(stack.session.phase(), SessionPhase::Anonymous);
}

#[tokio::test]
async fn logout_before_restore_makes_hydrate_a_noop() {
    let stack = TestStack::with_credentials("a1", "r1");
    assert_eq!(stack.session.phase(), SessionPhase::Restoring);

    stack.session.logout();
    stack.session.hydrate().await;

    assert_eq!(stack.transport.request_count(), 0);
    assert_eq!(stack.session.phase(), SessionPhase::Anonymous);
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN), None);
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN), None);
}

#[tokio::test]
async fn login_during_hydration_wins() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(StorageKeys::ACCESS_TOKEN, "stale").unwrap();
    storage.set(StorageKeys::REFRESH_TOKEN, "stale-refresh").unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.delay_requests_to("/users/me", Duration::from_millis(80));
    transport.delay_requests_to("/auth/login", Duration::from_millis(10));
    transport.push_json(401, json!({"message": "Unauthorized"}));
    transport.push_json(200, auth_payload("a1", "r1"));
    let stack = TestStack::build(storage, transport);

    let session = stack.session.clone();
    let hydrate = tokio::spawn(async move { session.hydrate().await });
    tokio::time::sleep(Duration::from_millis(5)).await;

    stack.session.login(&login_input()).await.unwrap();
    assert_eq!(stack.session.phase(), SessionPhase::Authenticated);
    hydrate.await.unwrap();

    // The identity check settled last, and its 401 must not undo the login
    assert_eq!(stack.transport.requests_to("/users/me"), 1);
    assert_eq!(stack.session.phase(), SessionPhase::Authenticated);
    assert!(stack.session.is_authenticated());
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN).as_deref(), Some("a1"));
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN).as_deref(), Some("r1"));
}

#[tokio::test]
async fn hydration_that_settles_before_login_signs_out_then_login_succeeds() {
    let storage = Arc::new(MemoryStore::new());
    storage.set(StorageKeys::ACCESS_TOKEN, "stale").unwrap();
    let transport = Arc::new(MockTransport::new());
    transport.delay_requests_to("/users/me", Duration::from_millis(10));
    transport.delay_requests_to("/auth/login", Duration::from_millis(60));
    transport.push_json(401, json!({"message": "Unauthorized"}));
    transport.push_json(200, auth_payload("a1", "r1"));
    let stack = TestStack::build(storage, transport);

    let session = stack.session.clone();
    let hydrate = tokio::spawn(async move { session.hydrate().await });
    tokio::time::sleep(Duration::from_millis(5)).await;

    let input = login_input();
    let login = stack.session.login(&input);
    let (user, _) = tokio::join!(login, async {
        hydrate.await.unwrap();
        assert_eq!(stack.session.phase(), SessionPhase::Anonymous);
    });

    assert_eq!(user.unwrap().id, "u1");
    assert_eq!(stack.session.phase(), SessionPhase::Authenticated);
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN).as_deref(), Some("a1"));
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN).as_deref(), Some("r1"));
}

#[tokio::test]
async fn refresh_rotates_credentials() {
    let stack = TestStack::new();
    stack.transport.push_json(200, auth_payload("a1", "r1"));
    stack
        .transport
        .push_json(200, json!({"accessToken": "a2", "refreshToken": "r2"}));
    stack.session.login(&login_input()).await.unwrap();

    stack.session.refresh().await.unwrap();

    assert_eq!(
        stack.transport.last_request().unwrap().body,
        Some(json!({"refreshToken": "r1"}))
    );
    assert_eq!(stored(&stack, StorageKeys::ACCESS_TOKEN).as_deref(), Some("a2"));
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN).as_deref(), Some("r2"));
    assert!(stack.session.is_authenticated());
}

#[tokio::test]
async fn refresh_without_session_is_rejected_offline() {
    let stack = TestStack::new();
    stack.session.hydrate().await;

    let err = stack.session.refresh().await.unwrap_err();

    assert!(matches!(err, SessionError::NotAuthenticated));
    assert_eq!(stack.transport.request_count(), 0);
}

#[tokio::test]
async fn rejected_refresh_signs_out() {
    let stack = TestStack::new();
    stack.transport.push_json(200, auth_payload("a1", "r1"));
    stack
        .transport
        .push_json(401, json!({"message": "Refresh token expired"}));
    stack.session.login(&login_input()).await.unwrap();

    let err = stack.session.refresh().await.unwrap_err();

    assert!(matches!(
        err,
        SessionError::Api(ApiError::Http { status: 401, .. })
    ));
    assert_eq!(stack.session.phase(), SessionPhase::Anonymous);
    assert_eq!(stored(&stack, StorageKeys::REFRESH_TOKEN), None);
}
