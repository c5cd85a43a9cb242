use async_trait::async_trait;
use metrics::counter;
use tracing::{error, info};
use warden_common::{routes, LoginForm};
use zeroize::Zeroizing;

use crate::auth::{
    AuthService, CredentialVerifier, LoginResult, PendingDestination, PendingDestinationTracker,
    SessionId, SessionIdentityCodec, SessionManager, VerificationOutcome,
};
use crate::identity::Identity;
use crate::metrics::{LOGIN_FAILURE, LOGIN_SUCCESS};
use crate::store::StoreError;

/// Shown when the form arrives without a login or password
pub const MISSING_CREDENTIALS: &str = "Missing credentials";

pub struct DefaultAuth {
    verifier: CredentialVerifier,
    codec: SessionIdentityCodec,
    sessions: SessionManager,
    pending: PendingDestinationTracker,
    default_landing: String,
}

impl DefaultAuth {
    pub fn new(
        verifier: CredentialVerifier,
        codec: SessionIdentityCodec,
        sessions: SessionManager,
        default_landing: impl Into<String>,
    ) -> Self {
        Self {
            verifier,
            codec,
            pending: PendingDestinationTracker::new(sessions.clone()),
            sessions,
            default_landing: default_landing.into(),
        }
    }

    fn reject(&self, session: &SessionId, message: &str) -> LoginResult {
        self.sessions.push_flash(session, message);
        LoginResult::Rejected {
            redirect_to: routes::LOGIN,
        }
    }
}

#[async_trait]
impl AuthService for DefaultAuth {
    async fn login(&self, session: &SessionId, form: LoginForm) -> LoginResult {
        let LoginForm { login, password } = form;
        let password = Zeroizing::new(password);

        if login.trim().is_empty() || password.is_empty() {
            counter!(LOGIN_FAILURE, "outcome" => "missing_credentials").increment(1);
            return self.reject(session, MISSING_CREDENTIALS);
        }

        let outcome = self.verifier.verify(&login, password).await;

        // No awaits below this point: once verification has finished the
        // session is updated in one uninterrupted step.
        match outcome {
            VerificationOutcome::Success(identity) => {
                let redirect_to = self
                    .pending
                    .take_and_clear(session)
                    .map(PendingDestination::into_string)
                    .unwrap_or_else(|| self.default_landing.clone());
                let session = self
                    .sessions
                    .establish(session, self.codec.serialize(&identity));

                counter!(LOGIN_SUCCESS).increment(1);
                info!(login = %identity.login, identity_id = %identity.id, redirect_to = %redirect_to, "signed in");

                LoginResult::SignedIn {
                    session,
                    redirect_to,
                    identity: identity.summary(),
                }
            },
            failure => {
                let label = failure.label();
                counter!(LOGIN_FAILURE, "outcome" => label).increment(1);
                match &failure {
                    VerificationOutcome::StoreError(err) => {
                        error!(login = %login, error = %err, "sign-in could not be verified");
                    },
                    _ => info!(login = %login, outcome = label, "sign-in rejected"),
                }
                let message = failure.user_message().unwrap_or(MISSING_CREDENTIALS);
                self.reject(session, message)
            },
        }
    }

    fn logout(&self, session: &SessionId) -> bool {
        let had_identity = self.sessions.identity(session).is_some();
        self.sessions.destroy(session);
        if had_identity {
            info!(session = ?session, "signed out");
        }
        had_identity
    }

    async fn current_identity(&self, session: &SessionId) -> Result<Option<Identity>, StoreError> {
        match self.sessions.identity(session) {
            Some(id) => self.codec.deserialize(id).await,
            None => Ok(None),
        }
    }

    fn take_messages(&self, session: &SessionId) -> Vec<String> {
        self.sessions.take_flashes(session)
    }

    fn remember_destination(&self, session: &SessionId, destination: PendingDestination) {
        self.pending.set(session, destination);
    }
}
