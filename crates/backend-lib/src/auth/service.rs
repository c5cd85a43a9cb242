// =============
// crates/backend-lib/src/auth/service.rs
// =============
//! This module defines the `AuthService` trait, the seam between the HTTP
//! handlers and the authentication pipeline.
use async_trait::async_trait;
use warden_common::{IdentitySummary, LoginForm};

use super::{PendingDestination, SessionId};
use crate::identity::Identity;
use crate::store::StoreError;

/// Where the browser goes after a login attempt
#[derive(Debug, Clone)]
pub enum LoginResult {
    /// Signed in under a new session token
    SignedIn {
        session: SessionId,
        redirect_to: String,
        identity: IdentitySummary,
    },
    /// Rejected; a message has been queued on the session
    Rejected { redirect_to: &'static str },
}

#[async_trait]
pub trait AuthService: Send + Sync {
    /// Verify posted credentials against the store
    async fn login(&self, session: &SessionId, form: LoginForm) -> LoginResult;

    /// Forget the session entirely
    fn logout(&self, session: &SessionId) -> bool;

    /// Identity bound to the session, if any
    async fn current_identity(&self, session: &SessionId) -> Result<Option<Identity>, StoreError>;

    /// Drain the one-shot messages queued for the login view
    fn take_messages(&self, session: &SessionId) -> Vec<String>;

    /// Remember where to go once the session signs in
    fn remember_destination(&self, session: &SessionId, destination: PendingDestination);
}
