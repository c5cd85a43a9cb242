// ============================
// crates/backend-lib/src/auth/verifier.rs
// ============================
//! Credential verification: one store lookup, one password check.
use std::sync::Arc;

use zeroize::Zeroizing;

use super::password::PasswordHasher;
use crate::error::AppError;
use crate::identity::Identity;
use crate::store::CredentialStore;

/// Shown when the login does not resolve to an identity
pub const LOGIN_NOT_FOUND: &str = "Login not found";
/// Shown when the password does not match
pub const INCORRECT_PASSWORD: &str = "Incorrect Password";
/// Shown when verification could not be carried out at all
pub const SIGN_IN_UNAVAILABLE: &str = "Unable to sign in right now, please try again later";

/// Result of a single verification attempt
#[derive(Debug)]
pub enum VerificationOutcome {
    Success(Identity),
    NotFound,
    PasswordMismatch,
    StoreError(AppError),
}

impl VerificationOutcome {
    /// Message queued for the user when the attempt failed
    pub fn user_message(&self) -> Option<&'static str> {
        match self {
            VerificationOutcome::Success(_) => None,
            VerificationOutcome::NotFound => Some(LOGIN_NOT_FOUND),
            VerificationOutcome::PasswordMismatch => Some(INCORRECT_PASSWORD),
            VerificationOutcome::StoreError(_) => Some(SIGN_IN_UNAVAILABLE),
        }
    }

    /// Short label used for logs and metrics
    pub fn label(&self) -> &'static str {
        match self {
            VerificationOutcome::Success(_) => "success",
            VerificationOutcome::NotFound => "not_found",
            VerificationOutcome::PasswordMismatch => "password_mismatch",
            VerificationOutcome::StoreError(_) => "store_error",
        }
    }
}

/// Resolves a login and checks the password against the stored digest
#[derive(Clone)]
pub struct CredentialVerifier {
    store: Arc<dyn CredentialStore>,
    hasher: PasswordHasher,
}

impl CredentialVerifier {
    pub fn new(store: Arc<dyn CredentialStore>, hasher: PasswordHasher) -> Self {
        Self { store, hasher }
    }

    // NOTE: password verification is CPU-bound; the hasher moves it off the request worker.
    pub async fn verify(&self, login: &str, plain: Zeroizing<String>) -> VerificationOutcome {
        let identity = match self.store.find_by_login(login).await {
            Ok(Some(identity)) => identity,
            Ok(None) => return VerificationOutcome::NotFound,
            Err(err) => return VerificationOutcome::StoreError(err.into()),
        };

        match self
            .hasher
            .verify(plain, identity.password_hash().clone())
            .await
        {
            Ok(true) => VerificationOutcome::Success(identity),
            Ok(false) => VerificationOutcome::PasswordMismatch,
            Err(err) => VerificationOutcome::StoreError(err.into()),
        }
    }
}
