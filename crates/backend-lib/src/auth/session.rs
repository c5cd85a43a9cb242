// ============================
// crates/backend-lib/src/auth/session.rs
// ============================
//! Session token handling and management.
//!
//! A session maps an opaque cookie token to per-browser state: the id of the
//! signed-in identity (if any), the pending post-login destination and the
//! queue of one-shot flash messages. Nothing in one session is reachable
//! through another session's token.
//!
//! A session is only stored once something is written to it, so anonymous
//! browsing leaves nothing behind.
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};

use dashmap::DashMap;
use metrics::{counter, gauge};
use tokio::task::JoinHandle;
use warden_common::IdentityId;

use super::pending::PendingDestination;
use super::token_generator::generate_secure_token;
use crate::metrics::{SESSION_ACTIVE, SESSION_CREATED, SESSION_DESTROYED, SESSION_EXPIRED};

/// Default session TTL (7 days)
pub const SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 7);

/// Longest accepted session TTL (365 days)
pub const MAX_SESSION_TTL: Duration = Duration::from_secs(60 * 60 * 24 * 365);

/// Opaque session token as carried by the session cookie
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct SessionId(String);

impl SessionId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Enough to correlate log lines, not enough to replay the cookie
        let prefix: String = self.0.chars().take(6).collect();
        write!(f, "SessionId({prefix}…)")
    }
}

/// Per-session state
#[derive(Debug, Clone)]
pub struct SessionEntry {
    pub(crate) identity: Option<IdentityId>,
    pub(crate) pending: Option<PendingDestination>,
    pub(crate) flashes: Vec<String>,
    expires_at: Instant,
}

impl SessionEntry {
    fn new(ttl: Duration) -> Self {
        let now = Instant::now();
        Self {
            identity: None,
            pending: None,
            flashes: Vec::new(),
            // An unrepresentable deadline leaves the entry already expired
            expires_at: now.checked_add(ttl).unwrap_or(now),
        }
    }
}

/// Session manager for handling session tokens
#[derive(Clone)]
pub struct SessionManager {
    sessions: Arc<DashMap<String, SessionEntry>>,
    ttl: Duration,
}

impl Default for SessionManager {
    fn default() -> Self {
        Self::new(SESSION_TTL)
    }
}

impl SessionManager {
    /// Create a new session manager; `ttl` is capped at [`MAX_SESSION_TTL`]
    pub fn new(ttl: Duration) -> Self {
        Self {
            sessions: Arc::new(DashMap::new()),
            ttl: ttl.min(MAX_SESSION_TTL),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Number of sessions currently held, expired ones included until pruned
    pub fn len(&self) -> usize {
        self.sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sessions.is_empty()
    }

    /// Resume the session named by `presented`, or allocate a token for a
    /// new one.
    ///
    /// Returns the session id and whether it was freshly allocated. A fresh
    /// token is not stored until the first write to it.
    pub fn resume_or_allocate(&self, presented: Option<&str>) -> (SessionId, bool) {
        if let Some(token) = presented {
            let id = SessionId(token.to_string());
            if self.with_live(&id, |_| ()).is_some() {
                return (id, false);
            }
        }
        (SessionId(generate_secure_token()), true)
    }

    /// Whether `id` names a live session
    pub fn contains(&self, id: &SessionId) -> bool {
        self.with_live(id, |_| ()).is_some()
    }

    /// Identity id bound to the session, if signed in
    pub fn identity(&self, id: &SessionId) -> Option<IdentityId> {
        self.with_live(id, |entry| entry.identity).flatten()
    }

    /// Bind an identity to a brand new session token and retire `previous`.
    ///
    /// The token changes on sign-in so a token handed out before
    /// authentication never becomes an authenticated one.
    pub fn establish(&self, previous: &SessionId, identity: IdentityId) -> SessionId {
        self.sessions.remove(previous.as_str());

        let token = generate_secure_token();
        let mut entry = SessionEntry::new(self.ttl);
        entry.identity = Some(identity);
        self.sessions.insert(token.clone(), entry);

        counter!(SESSION_CREATED).increment(1);
        gauge!(SESSION_ACTIVE).set(self.sessions.len() as f64);
        SessionId(token)
    }

    /// Drop the session and everything it holds
    pub fn destroy(&self, id: &SessionId) -> bool {
        let removed = self.sessions.remove(id.as_str()).is_some();
        if removed {
            counter!(SESSION_DESTROYED).increment(1);
            gauge!(SESSION_ACTIVE).set(self.sessions.len() as f64);
        }
        removed
    }

    /// Queue a one-shot message for the next render of the login view
    pub fn push_flash(&self, id: &SessionId, message: impl Into<String>) {
        let message = message.into();
        self.with_stored(id, move |entry| entry.flashes.push(message));
    }

    /// Drain the queued messages
    pub fn take_flashes(&self, id: &SessionId) -> Vec<String> {
        self.with_live(id, |entry| std::mem::take(&mut entry.flashes))
            .unwrap_or_default()
    }

    /// Run `f` against the live entry for `id`, removing it if it has expired
    pub(crate) fn with_live<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut SessionEntry) -> R,
    ) -> Option<R> {
        let now = Instant::now();
        let expired = match self.sessions.get_mut(id.as_str()) {
            Some(mut entry) if entry.expires_at > now => return Some(f(&mut entry)),
            Some(_) => true,
            None => false,
        };
        if expired && self.sessions.remove(id.as_str()).is_some() {
            counter!(SESSION_EXPIRED).increment(1);
        }
        None
    }

    /// Run `f` against the entry for `id`, storing a new one first if the
    /// token is not live.
    ///
    /// Only tokens handed out by [`Self::resume_or_allocate`] reach here, so a
    /// client can never choose its own token.
    pub(crate) fn with_stored<R>(
        &self,
        id: &SessionId,
        f: impl FnOnce(&mut SessionEntry) -> R,
    ) -> R {
        let now = Instant::now();
        let mut created = false;
        let result = {
            let mut entry = self
                .sessions
                .entry(id.as_str().to_string())
                .or_insert_with(|| {
                    created = true;
                    SessionEntry::new(self.ttl)
                });
            if entry.expires_at <= now {
                *entry = SessionEntry::new(self.ttl);
                created = true;
            }
            f(&mut entry)
        };
        if created {
            counter!(SESSION_CREATED).increment(1);
            gauge!(SESSION_ACTIVE).set(self.sessions.len() as f64);
        }
        result
    }

    /// Remove every expired session, returning how many were dropped
    pub fn prune_expired(&self) -> usize {
        let now = Instant::now();
        let before_count = self.sessions.len();
        self.sessions.retain(|_, entry| entry.expires_at > now);
        let after_count = self.sessions.len();
        let removed = before_count.saturating_sub(after_count);

        if removed > 0 {
            counter!(SESSION_EXPIRED).increment(removed as u64);
            gauge!(SESSION_ACTIVE).set(after_count as f64);
            tracing::debug!(removed, remaining = after_count, "pruned expired sessions");
        }
        removed
    }

    /// Spawn the task that periodically prunes expired sessions
    pub fn spawn_cleanup(&self, interval: Duration) -> JoinHandle<()> {
        let manager = self.clone();
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            // The first tick completes immediately
            ticker.tick().await;
            loop {
                ticker.tick().await;
                manager.prune_expired();
            }
        })
    }
}

impl fmt::Debug for SessionManager {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionManager")
            .field("sessions", &self.sessions.len())
            .field("ttl", &self.ttl)
            .finish()
    }
}
