use axum::{
    Router,
    body::Body,
    http::{Method, Request, StatusCode, header},
};
use serde_json::{Value, json};
use std::sync::Arc;
use storefront_router::{
    AppConfig, AppState, FixedClock, InMemorySessionStore, NavigationGuard, RouteTable,
    SessionStore, SessionStoreState, create_router,
    config::SessionStorage,
    session::{REDIRECT_TO_KEY, TOKEN_EXPIRY_KEY, TOKEN_KEY},
};
use tower::ServiceExt;

const NOW: i64 = 1_700_000_000_000;

// --- Setup Utilities ---

fn app_with(store: Arc<InMemorySessionStore>, config: AppConfig) -> Router {
    let state = AppState {
        routes: Arc::new(RouteTable::storefront().unwrap()),
        guard: NavigationGuard::new(
            store as SessionStoreState,
            Arc::new(FixedClock::at(NOW)),
            config.diagnostics_enabled,
        ),
        config,
    };
    create_router(state)
}

fn app(store: Arc<InMemorySessionStore>) -> Router {
    app_with(store, AppConfig::default())
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn location_header(response: &axum::response::Response) -> &str {
    response
        .headers()
        .get(header::LOCATION)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
}

// --- Page Routes ---

#[tokio::test]
async fn test_public_page_renders_view_with_scroll_reset() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(get("/products"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["view"], "product-list");
    assert_eq!(body["scroll"]["top"], 0);
}

#[tokio::test]
async fn test_protected_page_redirects_and_stashes_path() {
    let store = Arc::new(InMemorySessionStore::new());

    let response = app(store.clone())
        .oneshot(get("/admin/products?page=2"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_header(&response), "/login");
    assert_eq!(
        store.get(REDIRECT_TO_KEY).unwrap().as_deref(),
        Some("/admin/products?page=2")
    );
}

#[tokio::test]
async fn test_edit_page_passes_id_as_props() {
    let store = Arc::new(InMemorySessionStore::with_entries([(TOKEN_KEY, "abc")]));

    let response = app(store).oneshot(get("/products/edit/77")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["view"], "product-edit-form");
    assert_eq!(body["lazy"], true);
    assert_eq!(body["props"]["id"], "77");
}

#[tokio::test]
async fn test_guest_page_with_session_redirects_to_dashboard() {
    let store = Arc::new(InMemorySessionStore::with_entries([
        (TOKEN_KEY, "abc".to_string()),
        (TOKEN_EXPIRY_KEY, (NOW + 1_000).to_string()),
    ]));

    let response = app(store).oneshot(get("/login")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_header(&response), "/dashboard");
}

#[tokio::test]
async fn test_expired_session_is_cleared_even_on_unknown_page() {
    let store = Arc::new(InMemorySessionStore::with_entries([
        (TOKEN_KEY, "abc".to_string()),
        (TOKEN_EXPIRY_KEY, (NOW - 1_000).to_string()),
    ]));

    let response = app(store.clone()).oneshot(get("/no-such-page")).await.unwrap();

    assert_eq!(response.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_header(&response), "/login");
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_unknown_page_is_not_found() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(get("/no-such-page"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_pages_mounted_under_base_url() {
    let config = AppConfig {
        base_url: "/shop".to_string(),
        ..AppConfig::default()
    };
    let app = app_with(Arc::new(InMemorySessionStore::new()), config);

    let redirect = app.clone().oneshot(get("/shop/cart")).await.unwrap();
    assert_eq!(redirect.status(), StatusCode::TEMPORARY_REDIRECT);
    assert_eq!(location_header(&redirect), "/shop/login");

    let page = app.oneshot(get("/shop/categories")).await.unwrap();
    assert_eq!(page.status(), StatusCode::OK);
    assert_eq!(body_json(page).await["view"], "category-list");
}

#[tokio::test]
async fn test_disabled_storage_still_guards_pages() {
    let config = AppConfig {
        session_storage: SessionStorage::Disabled,
        ..AppConfig::default()
    };
    let state = AppState::from_config(config, Arc::new(FixedClock::at(NOW))).unwrap();
    let app = create_router(state);

    let protected = app.clone().oneshot(get("/dashboard")).await.unwrap();
    assert_eq!(protected.status(), StatusCode::TEMPORARY_REDIRECT);

    let guest = app.oneshot(get("/register")).await.unwrap();
    assert_eq!(guest.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_request_id_is_propagated() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(get("/"))
        .await
        .unwrap();

    assert!(response.headers().contains_key("x-request-id"));
}

// --- API Routes ---

#[tokio::test]
async fn test_routes_endpoint_lists_table() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(get("/api/routes"))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    let routes = body.as_array().unwrap();
    assert_eq!(routes.len(), 10);
    assert_eq!(routes[6]["path"], "/products/edit/:id");
    assert_eq!(routes[6]["access_policy"], "requires_auth");
}

#[tokio::test]
async fn test_navigate_endpoint_reports_outcome() {
    let store = Arc::new(InMemorySessionStore::new());

    let response = app(store.clone())
        .oneshot(post_json("/api/navigate", json!({ "to": "/cart", "from": "/products" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({ "outcome": "redirect_to", "path": "/login" })
    );
    assert_eq!(store.get(REDIRECT_TO_KEY).unwrap().as_deref(), Some("/cart"));
}

#[tokio::test]
async fn test_navigate_endpoint_proceeds_on_public_route() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(post_json("/api/navigate", json!({ "to": "/" })))
        .await
        .unwrap();

    assert_eq!(body_json(response).await, json!({ "outcome": "proceed" }));
}

#[tokio::test]
async fn test_login_completion_resumes_pending_redirect() {
    let store = Arc::new(InMemorySessionStore::with_entries([(REDIRECT_TO_KEY, "/cart")]));

    let response = app(store.clone())
        .oneshot(post_json(
            "/api/session",
            json!({ "token": "abc", "expires_at": NOW + 3_600_000 }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(body_json(response).await["redirect_to"], "/cart");
    assert_eq!(store.get(TOKEN_KEY).unwrap().as_deref(), Some("abc"));
    assert_eq!(store.get(REDIRECT_TO_KEY).unwrap(), None);
}

#[tokio::test]
async fn test_login_completion_defaults_to_dashboard() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(post_json("/api/session", json!({ "token": "abc" })))
        .await
        .unwrap();

    assert_eq!(body_json(response).await["redirect_to"], "/dashboard");
}

#[tokio::test]
async fn test_login_completion_rejects_empty_token() {
    let response = app(Arc::new(InMemorySessionStore::new()))
        .oneshot(post_json("/api/session", json!({ "token": "" })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_logout_clears_session() {
    let store = Arc::new(InMemorySessionStore::with_entries([
        (TOKEN_KEY, "abc"),
        (TOKEN_EXPIRY_KEY, "1"),
    ]));

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/session")
        .body(Body::empty())
        .unwrap();
    let response = app(store.clone()).oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::NO_CONTENT);
    assert!(store.is_empty());
}

#[tokio::test]
async fn test_logout_reports_unavailable_storage() {
    let config = AppConfig {
        session_storage: SessionStorage::Disabled,
        ..AppConfig::default()
    };
    let app = create_router(AppState::from_config(config, Arc::new(FixedClock::at(NOW))).unwrap());

    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/session")
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
}

#[tokio::test]
async fn test_session_is_shared_by_every_client() {
    let store = Arc::new(InMemorySessionStore::new());
    let app = app(store.clone());

    // One client logs in through the API...
    let login = app
        .clone()
        .oneshot(post_json("/api/session", json!({ "token": "abc" })))
        .await
        .unwrap();
    assert_eq!(login.status(), StatusCode::OK);

    // ...and an unrelated request, with no credentials of its own, sees that session.
    let cart = app.clone().oneshot(get("/cart")).await.unwrap();
    assert_eq!(cart.status(), StatusCode::OK);

    // Logging out through the API closes the cart for everyone again.
    let request = Request::builder()
        .method(Method::DELETE)
        .uri("/api/session")
        .body(Body::empty())
        .unwrap();
    app.clone().oneshot(request).await.unwrap();

    let cart = app.oneshot(get("/cart")).await.unwrap();
    assert_eq!(cart.status(), StatusCode::TEMPORARY_REDIRECT);
}
