// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router: public pages, the login flow and the guarded pages.
use std::sync::Arc;

use axum::{middleware::from_fn_with_state, routing::get, Router};
use tower_http::trace::TraceLayer;
use warden_common::{routes, Role};

use crate::auth::Requirement;
use crate::handlers::{admin, index, login_submit, login_view, logout, profile};
use crate::middleware::{enforce, session_layer};
use crate::store::CredentialStore;
use crate::AppState;

/// Create the application router
pub fn create_router<S: CredentialStore + 'static>(state: Arc<AppState<S>>) -> Router {
    let signed_in = from_fn_with_state((state.clone(), Requirement::Authenticated), enforce::<S>);
    let admin_only = from_fn_with_state(
        (state.clone(), Requirement::Role(Role::Admin)),
        enforce::<S>,
    );

    Router::new()
        .route(routes::INDEX, get(index))
        .route(
            routes::LOGIN,
            get(login_view::<S>).post(login_submit::<S>),
        )
        .route(routes::LOGOUT, get(logout::<S>))
        .route(routes::PROFILE, get(profile).route_layer(signed_in))
        .route(routes::ADMIN, get(admin).route_layer(admin_only))
        .layer(from_fn_with_state(state.clone(), session_layer::<S>))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
