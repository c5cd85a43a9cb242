// ============================
// crates/backend-lib/src/auth/guard.rs
// ============================
//! Access policy for protected routes.
//!
//! [`decide`] is a pure function of the resolved identity, the route's
//! requirement and the requested URI. Applying the decision (recording the
//! pending destination, redirecting, rendering the error view) happens in
//! `middleware::access`.
use axum::http::{StatusCode, Uri};
use warden_common::Role;

use super::pending::PendingDestination;
use crate::identity::Identity;

/// Status returned when a signed-in identity lacks the required role.
///
/// 401 rather than the more usual 403, matching the application this gate
/// was built for.
pub const ROLE_DENIED_STATUS: StatusCode = StatusCode::UNAUTHORIZED;

/// What a route demands of the caller
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Requirement {
    /// Any signed-in identity
    Authenticated,
    /// A signed-in identity holding this role
    Role(Role),
}

impl Requirement {
    pub fn admits(&self, identity: &Identity) -> bool {
        match self {
            Requirement::Authenticated => true,
            Requirement::Role(required) => identity.has_role(*required),
        }
    }
}

/// Outcome of evaluating a request against a requirement
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    /// Hand the request to the route handler
    Proceed,
    /// Not signed in: remember where they were going and send them to log in.
    /// `None` when the requested URI cannot be safely replayed.
    RedirectToLogin(Option<PendingDestination>),
    /// Signed in without the required role
    Forbidden,
}

pub fn decide(identity: Option<&Identity>, requirement: Requirement, requested: &Uri) -> GuardDecision {
    match identity {
        None => GuardDecision::RedirectToLogin(PendingDestination::from_uri(requested)),
        Some(identity) if requirement.admits(identity) => GuardDecision::Proceed,
        Some(_) => GuardDecision::Forbidden,
    }
}
