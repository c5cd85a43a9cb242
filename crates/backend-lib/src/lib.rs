// ============================
// warden-backend/src/lib.rs
// ============================
//! Core functionality for the Warden authentication gate.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod identity;
pub mod metrics;
pub mod middleware;
pub mod provision;
pub mod router;
pub mod store;
pub mod views;

use std::sync::Arc;

use crate::auth::{
    AuthService, CredentialVerifier, DefaultAuth, PasswordHasher, SessionIdentityCodec,
    SessionManager, WorkFactor,
};
use crate::config::Settings;
use crate::error::AppError;
use crate::provision::{provision_accounts, ProvisionReport};
use crate::store::CredentialStore;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Authentication service
    pub auth: Arc<dyn AuthService>,
    /// Session manager
    pub sessions: SessionManager,
    pub hasher: PasswordHasher,
    pub settings: Arc<Settings>,
    /// Credential store backend
    pub store: Arc<S>,
}

impl<S: CredentialStore + 'static> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, config: &Settings) -> Result<Self, AppError> {
        config.validate()?;

        let store = Arc::new(store);
        let shared: Arc<dyn CredentialStore> = store.clone();
        let hasher = PasswordHasher::new(
            WorkFactor::new(config.hashing.work_factor)?,
            config.hashing.max_concurrent,
        );
        let sessions = SessionManager::new(config.session_ttl());
        let auth = Arc::new(DefaultAuth::new(
            CredentialVerifier::new(shared.clone(), hasher.clone()),
            SessionIdentityCodec::new(shared),
            sessions.clone(),
            config.routes.default_landing.clone(),
        ));

        Ok(Self {
            auth,
            sessions,
            hasher,
            settings: Arc::new(config.clone()),
            store,
        })
    }

    /// Create the configured seed accounts that do not exist yet
    pub async fn provision(&self) -> Result<ProvisionReport, AppError> {
        provision_accounts(self.store.as_ref(), &self.hasher, &self.settings.seed).await
    }
}
