//! Integration tests for the routes the app answers itself: OAuth begin and
//! callback, the session-token bounce page and the exit-iframe page.

mod common;

use axum::http::header::{CONTENT_SECURITY_POLICY, CONTENT_TYPE, SET_COOKIE};
use axum::http::{Request, StatusCode};
use serde_json::json;
use shopify_app::auth::oauth::hmac::compute_signature;
use shopify_app::logger::LogSeverity;
use shopify_app::{AuthQuery, AuthResponse, SessionStorage};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use common::*;

async fn run(app: &TestApp, request: Request<()>) -> AuthResponse {
    app.shopify_app()
        .authenticate_admin(&request)
        .await
        .expect_err("expected the app to answer the request")
}

fn set_cookies(response: &AuthResponse) -> Vec<String> {
    response
        .headers()
        .get_all(SET_COOKIE)
        .iter()
        .map(|v| v.to_str().unwrap().to_string())
        .collect()
}

/// A signed callback URL for `TEST_SHOP` carrying `state`.
fn callback_url(state: &str) -> String {
    let pairs = [
        ("code", "auth-code".to_string()),
        ("host", base64_host()),
        ("shop", TEST_SHOP.to_string()),
        ("state", state.to_string()),
        ("timestamp", "1700000000".to_string()),
    ]
    .map(|(k, v)| (k.to_string(), v));

    let query = AuthQuery::from_pairs(pairs.clone());
    let hmac = compute_signature(&query.to_signable_string(), API_SECRET_KEY);

    let query = url::form_urlencoded::Serializer::new(String::new())
        .extend_pairs(pairs)
        .append_pair("hmac", &hmac)
        .finish();
    format!("{APP_URL}/auth/callback?{query}")
}

fn callback_request(state: &str, cookie_state: Option<&str>) -> Request<()> {
    let mut builder = Request::get(callback_url(state));
    if let Some(cookie_state) = cookie_state {
        builder = builder.header("Cookie", signed_cookie("shopify_app_state", cookie_state));
    }
    builder.body(()).unwrap()
}

async fn mock_token_endpoint(server: &MockServer, body: serde_json::Value) {
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .and(body_string_contains("auth-code"))
        .respond_with(ResponseTemplate::new(200).set_body_json(body))
        .expect(1)
        .mount(server)
        .await;
}

// ============================================================================
// Begin auth
// ============================================================================

#[tokio::test]
async fn test_auth_path_begins_oauth_with_state_cookie() {
    let app = TestApp::embedded(None);
    let request = Request::get(format!("{APP_URL}/auth?shop={TEST_SHOP}"))
        .body(())
        .unwrap();

    let response = run(&app, request).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    let location = response.location().unwrap();
    assert!(location.starts_with(&format!("https://{TEST_SHOP}/admin/oauth/authorize?")));

    let state = query_value(location, "state").unwrap();
    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("shopify_app_state={state};"))));
    assert!(cookies.iter().any(|c| c.starts_with("shopify_app_state.sig=")));
    assert!(cookies.iter().all(|c| c.contains("Path=/auth/callback")));
}

#[tokio::test]
async fn test_auth_path_rejects_invalid_shop() {
    let app = TestApp::embedded(None);
    let request = Request::get(format!("{APP_URL}/auth?shop=evil.example.com"))
        .body(())
        .unwrap();

    let response = run(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.body().contains("Shop param is invalid"));
}

// ============================================================================
// Callback
// ============================================================================

#[tokio::test]
async fn test_callback_stores_session_and_redirects_into_admin() {
    let server = MockServer::start().await;
    let app = TestApp::embedded(Some(&server.uri()));
    mock_token_endpoint(
        &server,
        json!({"access_token": "offline-token", "scope": SCOPES}),
    )
    .await;

    let response = run(&app, callback_request("nonce", Some("nonce"))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert_eq!(
        response.location(),
        Some(format!("https://{SHOPIFY_HOST}/apps/{API_KEY}").as_str())
    );

    let stored = app
        .storage
        .load_session(&format!("offline_{TEST_SHOP}"))
        .await
        .unwrap()
        .expect("session stored");
    assert_eq!(stored.access_token, "offline-token");
    assert_eq!(stored.state.as_deref(), Some("nonce"));

    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("shopify_app_state=;") && c.contains("Max-Age=0")));
    assert!(!cookies.iter().any(|c| c.starts_with("shopify_app_session=")));
}

#[tokio::test]
async fn test_callback_for_non_embedded_app_sets_session_cookie() {
    let server = MockServer::start().await;
    let app = TestApp::non_embedded(Some(&server.uri()));
    mock_token_endpoint(
        &server,
        json!({"access_token": "offline-token", "scope": SCOPES}),
    )
    .await;

    let response = run(&app, callback_request("nonce", Some("nonce"))).await;

    let location = response.location().unwrap();
    assert!(location.starts_with("/?"));
    assert_eq!(query_value(location, "shop").as_deref(), Some(TEST_SHOP));
    assert_eq!(query_value(location, "host"), Some(base64_host()));

    let cookies = set_cookies(&response);
    assert!(cookies
        .iter()
        .any(|c| c.starts_with(&format!("shopify_app_session=offline_{TEST_SHOP};"))));
    assert!(cookies
        .iter()
        .any(|c| c.starts_with("shopify_app_session.sig=")));
}

#[tokio::test]
async fn test_callback_asks_for_online_token_after_offline_one() {
    let server = MockServer::start().await;
    let (builder, logs) = config_builder(Some(&server.uri()));
    let app = TestApp::new(builder.use_online_tokens(true), logs);
    mock_token_endpoint(
        &server,
        json!({"access_token": "offline-token", "scope": SCOPES}),
    )
    .await;

    let response = run(&app, callback_request("nonce", Some("nonce"))).await;

    let location = response.location().unwrap();
    assert!(location.starts_with(&format!("https://{TEST_SHOP}/admin/oauth/authorize?")));
    assert_eq!(
        query_value(location, "grant_options[]").as_deref(),
        Some("per-user")
    );
    assert!(app.logs.contains(
        LogSeverity::Info,
        "Requesting online access token for offline session"
    ));
    assert_eq!(app.storage.len().await, 1);
}

#[tokio::test]
async fn test_callback_without_state_cookie_restarts_oauth() {
    let app = TestApp::embedded(None);

    let response = run(&app, callback_request("nonce", None)).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(response
        .location()
        .unwrap()
        .starts_with(&format!("https://{TEST_SHOP}/admin/oauth/authorize?")));
    assert!(app
        .logs
        .contains(LogSeverity::Error, "Error during OAuth callback"));
    assert!(app.storage.is_empty().await);
}

#[tokio::test]
async fn test_callback_with_mismatched_state_restarts_oauth() {
    let app = TestApp::embedded(None);

    let response = run(&app, callback_request("nonce", Some("another-nonce"))).await;

    assert_eq!(response.status(), StatusCode::FOUND);
    assert!(response
        .location()
        .unwrap()
        .contains("/admin/oauth/authorize?"));
    assert!(app.storage.is_empty().await);
}

#[tokio::test]
async fn test_callback_with_bad_hmac_is_a_bad_request() {
    let app = TestApp::embedded(None);
    let url = callback_url("nonce").replace("code=auth-code", "code=tampered");
    let request = Request::get(url)
        .header("Cookie", signed_cookie("shopify_app_state", "nonce"))
        .body(())
        .unwrap();

    let response = run(&app, request).await;

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert!(response.body().contains("Invalid OAuth Request"));
}

#[tokio::test]
async fn test_callback_token_failure_is_a_server_error() {
    let server = MockServer::start().await;
    let app = TestApp::embedded(Some(&server.uri()));
    Mock::given(method("POST"))
        .and(path("/admin/oauth/access_token"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&server)
        .await;

    let response = run(&app, callback_request("nonce", Some("nonce"))).await;

    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    assert!(response.body().is_empty());
}

// ============================================================================
// App Bridge pages
// ============================================================================

#[tokio::test]
async fn test_session_token_path_renders_bounce_page() {
    let app = TestApp::embedded(None);
    let request = Request::get(format!(
        "{APP_URL}/auth/session-token?shop={TEST_SHOP}&shopify-reload={APP_URL}/"
    ))
    .body(())
    .unwrap();

    let response = run(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(response.headers()[CONTENT_TYPE], "text/html;charset=utf-8");
    assert_eq!(
        response.body(),
        format!(
            r#"<script data-api-key="{API_KEY}" src="https://cdn.shopify.com/shopifycloud/app-bridge.js"></script>"#
        )
    );
    assert_eq!(
        response.headers()[CONTENT_SECURITY_POLICY],
        format!("frame-ancestors https://{TEST_SHOP} https://admin.shopify.com https://*.spin.dev;")
            .as_str()
    );
}

#[tokio::test]
async fn test_exit_iframe_path_opens_destination_in_top_window() {
    let app = TestApp::embedded(None);
    let destination = format!("/auth?shop={TEST_SHOP}");
    let query = url::form_urlencoded::Serializer::new(String::new())
        .append_pair("shop", TEST_SHOP)
        .append_pair("host", &base64_host())
        .append_pair("exitIframe", &destination)
        .finish();
    let request = Request::get(format!("{APP_URL}/auth/exit-iframe?{query}"))
        .body(())
        .unwrap();

    let response = run(&app, request).await;

    assert_eq!(response.status(), StatusCode::OK);
    assert!(response.body().ends_with(&format!(
        r#"<script>window.open("{APP_URL}/auth?shop={TEST_SHOP}", "_top")</script>"#
    )));
}

#[tokio::test]
async fn test_exit_iframe_path_rejects_foreign_destinations() {
    let app = TestApp::embedded(None);

    for destination in ["https://evil.example.com/", "//evil.example.com/x", ""] {
        let query = url::form_urlencoded::Serializer::new(String::new())
            .append_pair("shop", TEST_SHOP)
            .append_pair("exitIframe", destination)
            .finish();
        let request = Request::get(format!("{APP_URL}/auth/exit-iframe?{query}"))
            .body(())
            .unwrap();

        let response = run(&app, request).await;

        assert_eq!(response.status(), StatusCode::BAD_REQUEST, "{destination}");
    }
}
