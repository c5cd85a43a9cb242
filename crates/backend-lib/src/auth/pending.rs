// ============================
// crates/backend-lib/src/auth/pending.rs
// ============================
//! Where to send a user after they sign in.
use axum::http::Uri;
use std::fmt;

use super::session::{SessionId, SessionManager};

/// A local path (with query) the user was turned away from.
///
/// Always starts with a single `/`, so it can only ever redirect back into
/// this application.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingDestination(String);

impl PendingDestination {
    /// Capture the path and query of a denied request
    pub fn from_uri(uri: &Uri) -> Option<Self> {
        let path_and_query = uri.path_and_query()?.as_str();
        Self::parse(path_and_query)
    }

    /// Accept only same-origin absolute paths
    pub fn parse(path: &str) -> Option<Self> {
        if !path.starts_with('/') || path.starts_with("//") || path.contains('\\') {
            return None;
        }
        Some(Self(path.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for PendingDestination {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Remembers, per session, the destination a login should resume at
#[derive(Debug, Clone)]
pub struct PendingDestinationTracker {
    sessions: SessionManager,
}

impl PendingDestinationTracker {
    pub fn new(sessions: SessionManager) -> Self {
        Self { sessions }
    }

    /// Record a destination; the latest denial wins
    pub fn set(&self, session: &SessionId, destination: PendingDestination) {
        self.sessions
            .with_stored(session, move |entry| entry.pending = Some(destination));
    }

    /// Hand out the pending destination exactly once
    pub fn take_and_clear(&self, session: &SessionId) -> Option<PendingDestination> {
        self.sessions
            .with_live(session, |entry| entry.pending.take())
            .flatten()
    }
}
