// ============================
// crates/backend-lib/src/handlers/mod.rs
// ============================
//! HTTP handlers for the login flow and the pages behind it.
use axum::{
    http::{header::LOCATION, HeaderValue, StatusCode},
    response::{IntoResponse, Response},
};

pub mod login;
pub mod pages;

pub use login::{login_submit, login_view, logout};
pub use pages::{admin, index, profile};

/// `302 Found` redirect to `location`
pub fn found(location: &str) -> Response {
    match HeaderValue::from_str(location) {
        Ok(value) => (StatusCode::FOUND, [(LOCATION, value)]).into_response(),
        Err(_) => {
            tracing::error!(location, "refusing redirect to an invalid location");
            StatusCode::INTERNAL_SERVER_ERROR.into_response()
        },
    }
}
