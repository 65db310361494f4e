//! Navigation through the router with session restoration.

use folio_session::testutil::TestStack;
use folio_session::{redirect_href, LoginInput, Navigation, Redirect, RouteName, Router};
use serde_json::json;

fn href(navigation: &Navigation) -> Option<String> {
    match navigation {
        Navigation::Redirected { to, .. } => Some(redirect_href(to)),
        _ => None,
    }
}

#[tokio::test]
async fn first_navigation_restores_session_once() {
    let stack = TestStack::with_credentials("a1", "r1");
    stack.transport.push_json(
        200,
        json!({"id": "u1", "name": "Ada", "email": "ada@example.com", "role": "USER"}),
    );
    let router = Router::new(stack.session.clone());

    let library = router.navigate("/library").await;
    let reader = router.navigate("/reader/b1").await;

    assert!(matches!(library, Navigation::Allowed(ref t) if t.name == RouteName::Library));
    assert!(matches!(reader, Navigation::Allowed(ref t) if t.params["id"] == "b1"));
    assert_eq!(stack.transport.requests_to("/users/me"), 1);
}

#[tokio::test]
async fn anonymous_user_is_sent_to_login_and_back() {
    let stack = TestStack::new();
    let router = Router::new(stack.session.clone());

    let attempt = router.navigate("/checkout/b1").await;
    assert_eq!(
        href(&attempt).as_deref(),
        Some("/login?redirect=%2Fcheckout%2Fb1")
    );
    assert_eq!(stack.transport.request_count(), 0);

    stack.transport.push_json(
        200,
        json!({
            "user": {"id": "u1", "name": "Ada", "email": "ada@example.com", "role": "USER"},
            "accessToken": "a1",
            "refreshToken": "r1"
        }),
    );
    stack
        .session
        .login(&LoginInput {
            email: "ada@example.com".into(),
            password: "pw".into(),
        })
        .await
        .unwrap();

    // The login page now bounces to the remembered destination
    let back = router.navigate("/login?redirect=%2Fcheckout%2Fb1").await;
    assert!(matches!(
        back,
        Navigation::Redirected { to: Redirect::Path(ref path), .. } if path == "/checkout/b1"
    ));

    let checkout = router.navigate("/checkout/b1").await;
    assert!(matches!(checkout, Navigation::Allowed(_)));
}

#[tokio::test]
async fn rejected_credentials_fall_back_to_login() {
    let stack = TestStack::with_credentials("revoked", "r1");
    stack.transport.push_json(401, json!({"message": "Unauthorized"}));
    let router = Router::new(stack.session.clone());

    let navigation = router.navigate("/admin").await;

    assert_eq!(href(&navigation).as_deref(), Some("/login?redirect=%2Fadmin"));
    assert!(!stack.session.has_credentials());
}

#[tokio::test]
async fn non_admin_is_sent_home() {
    let stack = TestStack::with_credentials("a1", "r1");
    stack.transport.push_json(
        200,
        json!({"id": "u1", "name": "Ada", "email": "ada@example.com", "role": "USER"}),
    );
    let router = Router::new(stack.session.clone());

    let navigation = router.navigate("/admin/upload").await;

    assert_eq!(href(&navigation).as_deref(), Some("/"));
}

#[tokio::test]
async fn unknown_paths_are_not_found() {
    let stack = TestStack::new();
    let router = Router::new(stack.session.clone());

    assert_eq!(
        router.navigate("/settings").await,
        Navigation::NotFound("/settings".to_string())
    );
}
