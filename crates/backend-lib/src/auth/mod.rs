// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

pub mod codec;
pub mod guard;
pub mod password;
pub mod pending;
pub mod session;
pub mod token_generator;
pub mod verifier;
mod service;
mod service_impl;

pub use codec::SessionIdentityCodec;
pub use guard::{decide, GuardDecision, Requirement, ROLE_DENIED_STATUS};
pub use password::{
    hash_password, verify_password, PasswordDigest, PasswordHasher, WorkFactor,
    DEFAULT_WORK_FACTOR,
};
pub use pending::{PendingDestination, PendingDestinationTracker};
pub use service::{AuthService, LoginResult};
pub use service_impl::{DefaultAuth, MISSING_CREDENTIALS};
pub use session::{SessionId, SessionManager, MAX_SESSION_TTL, SESSION_TTL};
pub use verifier::{
    CredentialVerifier, VerificationOutcome, INCORRECT_PASSWORD, LOGIN_NOT_FOUND,
    SIGN_IN_UNAVAILABLE,
};
