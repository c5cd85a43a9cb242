// crates/backend-lib/tests/access.rs
mod test_utils;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use axum::{
    body::Body,
    http::{header::COOKIE, Request, StatusCode},
    middleware::from_fn_with_state,
    routing::get,
    Router,
};
use tower::ServiceExt;
use warden_backend::{
    auth::{Requirement, ROLE_DENIED_STATUS},
    middleware::{enforce, session_layer},
    store::MemoryCredentialStore,
};
use warden_common::Role;

use test_utils::{setup_test_state, Browser};

#[tokio::test]
async fn test_user_is_denied_admin_but_allowed_profile() {
    let state = setup_test_state().await;
    let mut browser = Browser::new(state);

    let page = browser.login("awilliams", "boomstick").await;
    assert_eq!(page.location.as_deref(), Some("/profile"));

    let page = browser.get("/admin").await;
    assert_eq!(page.status, ROLE_DENIED_STATUS);
    assert_eq!(page.status, StatusCode::UNAUTHORIZED);
    assert!(page.body.contains("Not authorized"));
    assert!(!page.body.contains("Only administrators"));

    let page = browser.get("/profile").await;
    assert_eq!(page.status, StatusCode::OK);
}

#[tokio::test]
async fn test_admin_reaches_both() {
    let state = setup_test_state().await;
    let mut browser = Browser::new(state);

    browser.login("kraken", "releaseTheKraken").await;
    assert_eq!(browser.get("/admin").await.status, StatusCode::OK);
    assert_eq!(browser.get("/profile").await.status, StatusCode::OK);
}

#[tokio::test]
async fn test_denied_role_never_reaches_handler() {
    let state = setup_test_state().await;
    let mut browser = Browser::new(state.clone());
    browser.login("awilliams", "boomstick").await;
    let token = browser.session_token().unwrap().to_string();

    let reached = Arc::new(AtomicBool::new(false));
    let flag = reached.clone();
    let app = Router::new()
        .route(
            "/admin",
            get(move || {
                let flag = flag.clone();
                async move {
                    flag.store(true, Ordering::SeqCst);
                    "secret"
                }
            })
            .route_layer(from_fn_with_state(
                (state.clone(), Requirement::Role(Role::Admin)),
                enforce::<MemoryCredentialStore>,
            )),
        )
        .layer(from_fn_with_state(
            state.clone(),
            session_layer::<MemoryCredentialStore>,
        ))
        .with_state(state.clone());

    let request = Request::builder()
        .uri("/admin")
        .header(COOKIE, format!("{}={token}", state.settings.session.cookie_name))
        .body(Body::empty())
        .unwrap();
    let response = app.oneshot(request).await.unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(!reached.load(Ordering::SeqCst));
}

#[tokio::test]
async fn test_unknown_cookie_is_treated_as_anonymous() {
    let state = setup_test_state().await;
    let mut browser = Browser::new(state);
    browser.set_session_token(Some("forged-token".to_string()));

    let page = browser.get("/profile").await;
    assert_eq!(page.status, StatusCode::FOUND);
    assert_eq!(page.location.as_deref(), Some("/login"));
    assert_ne!(browser.session_token(), Some("forged-token"));
}
