// ============================
// crates/backend-lib/src/handlers/login.rs
// ============================
//! Login view, credential submission and logout.
use std::sync::Arc;

use axum::{
    extract::State,
    http::header::SET_COOKIE,
    response::{IntoResponse, Response},
    Form,
};
use tracing::{debug, error};
use warden_common::LoginForm;

use super::found;
use crate::auth::{LoginResult, SessionId};
use crate::middleware::{clear_session_cookie, session_cookie, CurrentIdentity};
use crate::store::CredentialStore;
use crate::{views, AppState};

/// `GET /login`: the form plus any queued failure messages, shown once
pub async fn login_view<S: CredentialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: SessionId,
    CurrentIdentity(current): CurrentIdentity,
) -> Response {
    let messages = state.auth.take_messages(&session);
    let summary = current.map(|identity| identity.summary());
    views::login(summary.as_ref(), &messages).into_response()
}

/// `POST /login`
pub async fn login_submit<S: CredentialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: SessionId,
    Form(form): Form<LoginForm>,
) -> Response {
    match state.auth.login(&session, form).await {
        LoginResult::SignedIn {
            session,
            redirect_to,
            identity,
        } => {
            debug!(login = %identity.login, redirect_to = %redirect_to, "redirecting after sign-in");
            let mut response = found(&redirect_to);
            match session_cookie(&state.settings.session, &session) {
                Ok(cookie) => {
                    response.headers_mut().append(SET_COOKIE, cookie);
                },
                Err(err) => error!("Failed to build session cookie: {err}"),
            }
            response
        },
        LoginResult::Rejected { redirect_to } => found(redirect_to),
    }
}

/// `GET /logout`
pub async fn logout<S: CredentialStore + 'static>(
    State(state): State<Arc<AppState<S>>>,
    session: SessionId,
) -> Response {
    state.auth.logout(&session);
    let mut response = found(&state.settings.routes.logout_landing);
    match clear_session_cookie(&state.settings.session) {
        Ok(cookie) => {
            response.headers_mut().append(SET_COOKIE, cookie);
        },
        Err(err) => error!("Failed to build session cookie: {err}"),
    }
    response
}
