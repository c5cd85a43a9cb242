//! Session cookie handling and current-identity injection.
use std::convert::Infallible;
use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{
        header::{InvalidHeaderValue, COOKIE, SET_COOKIE},
        request::Parts,
        HeaderMap, HeaderValue, Method,
    },
    middleware::Next,
    response::Response,
};
use tracing::error;
use warden_common::routes;

use crate::auth::{SessionId, SessionManager, SIGN_IN_UNAVAILABLE};
use crate::config::SessionSettings;
use crate::error::AppError;
use crate::handlers::found;
use crate::identity::Identity;
use crate::store::CredentialStore;
use crate::AppState;

/// Identity resolved from the session for this request, if any
#[derive(Debug, Clone, Default)]
pub struct CurrentIdentity(pub Option<Identity>);

/// A signed-in identity; handlers taking this redirect to login otherwise
#[derive(Debug, Clone)]
pub struct SignedIn(pub Identity);

/// Resolve the session cookie into a session and an identity.
///
/// A missing, unknown or expired cookie yields a freshly allocated token;
/// its cookie is only handed back once the request stored something in it.
///
/// When the store cannot resolve the identity, the request is sent to the
/// login view with the generic sign-in failure message. The session keeps
/// its identity, so recovery does not sign anyone out.
pub async fn session_layer<S: CredentialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    mut request: Request,
    next: Next,
) -> Response {
    let settings = &state.settings.session;
    let presented = extract_session_token(request.headers(), &settings.cookie_name);
    let (session, fresh) = state.sessions.resume_or_allocate(presented.as_deref());

    let identity = match state.auth.current_identity(&session).await {
        Ok(identity) => identity,
        Err(err) => {
            error!(path = %request.uri().path(), error = %err, "could not resolve the session identity");
            let on_login = request.uri().path() == routes::LOGIN;
            // A failing POST queues its own message
            if on_login && request.method() == Method::GET {
                state.sessions.push_flash(&session, SIGN_IN_UNAVAILABLE);
            }
            if !on_login {
                let mut response = found(routes::LOGIN);
                attach_fresh_cookie(&state.sessions, settings, &session, fresh, &mut response);
                return response;
            }
            None
        },
    };

    request.extensions_mut().insert(session.clone());
    request.extensions_mut().insert(CurrentIdentity(identity));

    let mut response = next.run(request).await;
    attach_fresh_cookie(&state.sessions, settings, &session, fresh, &mut response);
    response
}

// Sign-in and logout retire the session and set their own cookie
fn attach_fresh_cookie(
    sessions: &SessionManager,
    settings: &SessionSettings,
    session: &SessionId,
    fresh: bool,
    response: &mut Response,
) {
    if !fresh || !sessions.contains(session) {
        return;
    }
    match session_cookie(settings, session) {
        Ok(cookie) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        },
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
}

/// Build a secure `HttpOnly` cookie for the session token.
pub fn session_cookie(
    settings: &SessionSettings,
    session: &SessionId,
) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}={}; Path=/; HttpOnly; SameSite=Lax; Max-Age={}",
        settings.cookie_name,
        session.as_str(),
        settings.ttl_secs
    );
    if settings.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

/// Cookie that makes the browser forget the session token
pub fn clear_session_cookie(settings: &SessionSettings) -> Result<HeaderValue, InvalidHeaderValue> {
    let mut cookie = format!(
        "{}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0",
        settings.cookie_name
    );
    if settings.cookie_secure {
        cookie.push_str("; Secure");
    }
    HeaderValue::from_str(&cookie)
}

pub fn extract_session_token(headers: &HeaderMap, cookie_name: &str) -> Option<String> {
    for header in headers.get_all(COOKIE) {
        let Ok(value) = header.to_str() else {
            continue;
        };
        for pair in value.split(';') {
            let mut parts = pair.trim().splitn(2, '=');
            let key = parts.next().unwrap_or_default().trim();
            let val = parts.next().unwrap_or_default().trim();
            if key == cookie_name && !val.is_empty() {
                return Some(val.to_string());
            }
        }
    }
    None
}

impl<S: Send + Sync> FromRequestParts<S> for SessionId {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<SessionId>()
            .cloned()
            .ok_or(AppError::MissingSession)
    }
}

impl<S: Send + Sync> FromRequestParts<S> for CurrentIdentity {
    type Rejection = Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<CurrentIdentity>()
            .cloned()
            .unwrap_or_default())
    }
}

impl<S: Send + Sync> FromRequestParts<S> for SignedIn {
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        match parts.extensions.get::<CurrentIdentity>() {
            Some(CurrentIdentity(Some(identity))) => Ok(SignedIn(identity.clone())),
            _ => Err(found(routes::LOGIN)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_session_token() {
        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("theme=dark; warden_session=abc123; x=1"));
        assert_eq!(
            extract_session_token(&headers, "warden_session"),
            Some("abc123".to_string())
        );
        assert_eq!(extract_session_token(&headers, "other"), None);

        let mut headers = HeaderMap::new();
        headers.append(COOKIE, HeaderValue::from_static("theme=dark"));
        headers.append(COOKIE, HeaderValue::from_static("warden_session=def456"));
        assert_eq!(
            extract_session_token(&headers, "warden_session"),
            Some("def456".to_string())
        );

        let mut headers = HeaderMap::new();
        headers.insert(COOKIE, HeaderValue::from_static("warden_session="));
        assert_eq!(extract_session_token(&headers, "warden_session"), None);
    }

    #[test]
    fn test_session_cookie_attributes() {
        let mut settings = SessionSettings::default();
        let sessions = crate::auth::SessionManager::default();
        let (id, _) = sessions.resume_or_allocate(None);

        let cookie = session_cookie(&settings, &id).unwrap();
        let cookie = cookie.to_str().unwrap();
        assert!(cookie.starts_with(&format!("warden_session={}", id.as_str())));
        assert!(cookie.contains("HttpOnly"));
        assert!(cookie.contains("SameSite=Lax"));
        assert!(!cookie.contains("Secure"));

        settings.cookie_secure = true;
        let cleared = clear_session_cookie(&settings).unwrap();
        let cleared = cleared.to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));
        assert!(cleared.ends_with("; Secure"));
    }
}
