//! Route guard middleware.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
};
use metrics::counter;
use tracing::{debug, warn};
use warden_common::routes;

use super::session::CurrentIdentity;
use crate::auth::{decide, GuardDecision, Requirement, SessionId, ROLE_DENIED_STATUS};
use crate::error::AppError;
use crate::handlers::found;
use crate::metrics::{GUARD_FORBIDDEN, GUARD_REDIRECT};
use crate::store::CredentialStore;
use crate::{views, AppState};

/// Apply the access policy for `requirement` to the wrapped routes.
///
/// Must run inside [`super::session_layer`], which supplies the session and
/// the resolved identity.
pub async fn enforce<S: CredentialStore + 'static>(
    State((state, requirement)): State<(Arc<AppState<S>>, Requirement)>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let session = request
        .extensions()
        .get::<SessionId>()
        .cloned()
        .ok_or(AppError::MissingSession)?;
    let identity = request
        .extensions()
        .get::<CurrentIdentity>()
        .and_then(|current| current.0.as_ref());

    match decide(identity, requirement, request.uri()) {
        GuardDecision::Proceed => Ok(next.run(request).await),
        GuardDecision::RedirectToLogin(destination) => {
            counter!(GUARD_REDIRECT).increment(1);
            debug!(path = %request.uri().path(), "unauthenticated request sent to login");
            if let Some(destination) = destination {
                state.auth.remember_destination(&session, destination);
            }
            Ok(found(routes::LOGIN))
        },
        GuardDecision::Forbidden => {
            counter!(GUARD_FORBIDDEN).increment(1);
            let summary = identity.map(|identity| identity.summary());
            warn!(
                path = %request.uri().path(),
                login = summary.as_ref().map(|s| s.login.as_str()).unwrap_or_default(),
                required = ?requirement,
                "role check failed"
            );
            Ok((ROLE_DENIED_STATUS, views::role_denied(summary.as_ref())).into_response())
        },
    }
}
