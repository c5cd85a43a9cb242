//! Test utilities for the Warden backend
//!
//! Builds an application over an in-memory store seeded with the demo
//! accounts, and a tiny browser that carries the session cookie between
//! requests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::{to_bytes, Body},
    http::{
        header::{CONTENT_TYPE, COOKIE, LOCATION, SET_COOKIE},
        Request, StatusCode,
    },
    response::Response,
    Router,
};
use tower::ServiceExt;
use warden_backend::{
    config::Settings,
    router::create_router,
    store::{CredentialStore, MemoryCredentialStore},
    AppState,
};

/// Settings with a cheap work factor so tests stay fast
pub fn test_settings() -> Settings {
    let mut settings = Settings::default();
    settings.hashing.work_factor = 4;
    settings
}

/// Sets up application state over a seeded in-memory store
pub async fn setup_test_state() -> Arc<AppState<MemoryCredentialStore>> {
    let state = AppState::new(MemoryCredentialStore::new(), &test_settings()).unwrap();
    state.provision().await.unwrap();
    Arc::new(state)
}

/// A response reduced to what the tests look at
pub struct Page {
    pub status: StatusCode,
    pub location: Option<String>,
    pub set_cookie: Vec<String>,
    pub body: String,
}

impl Page {
    async fn from_response(response: Response) -> Self {
        let status = response.status();
        let location = response
            .headers()
            .get(LOCATION)
            .map(|value| value.to_str().unwrap().to_string());
        let set_cookie = response
            .headers()
            .get_all(SET_COOKIE)
            .iter()
            .map(|value| value.to_str().unwrap().to_string())
            .collect();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        Self {
            status,
            location,
            set_cookie,
            body: String::from_utf8(bytes.to_vec()).unwrap(),
        }
    }
}

/// Drives the router like a browser with a single cookie
pub struct Browser {
    app: Router,
    cookie_name: String,
    cookie: Option<String>,
}

impl Browser {
    pub fn new<S: CredentialStore + 'static>(state: Arc<AppState<S>>) -> Self {
        let cookie_name = state.settings.session.cookie_name.clone();
        Self {
            app: create_router(state),
            cookie_name,
            cookie: None,
        }
    }

    /// Current session token, if the server has handed one out
    pub fn session_token(&self) -> Option<&str> {
        self.cookie.as_deref()
    }

    pub fn set_session_token(&mut self, token: Option<String>) {
        self.cookie = token;
    }

    pub async fn get(&mut self, path: &str) -> Page {
        let request = self.request("GET", path).body(Body::empty()).unwrap();
        self.send(request).await
    }

    pub async fn post_form(&mut self, path: &str, form: &str) -> Page {
        let request = self
            .request("POST", path)
            .header(CONTENT_TYPE, "application/x-www-form-urlencoded")
            .body(Body::from(form.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn login(&mut self, login: &str, password: &str) -> Page {
        self.post_form("/login", &format!("login={login}&password={password}"))
            .await
    }

    fn request(&self, method: &str, path: &str) -> axum::http::request::Builder {
        let builder = Request::builder().method(method).uri(path);
        match &self.cookie {
            Some(token) => builder.header(COOKIE, format!("{}={token}", self.cookie_name)),
            None => builder,
        }
    }

    async fn send(&mut self, request: Request<Body>) -> Page {
        let response = self.app.clone().oneshot(request).await.unwrap();
        let page = Page::from_response(response).await;
        for cookie in &page.set_cookie {
            let pair = cookie.split(';').next().unwrap_or_default();
            if let Some((name, value)) = pair.split_once('=') {
                if name == self.cookie_name {
                    self.cookie = (!value.is_empty()).then(|| value.to_string());
                }
            }
        }
        page
    }
}
