// ============================
// crates/backend-lib/src/auth/codec.rs
// ============================
//! Converts between a verified identity and what the session keeps of it.
//!
//! The session keeps only the identity id. Everything else is read back
//! from the store on each request, so profile or role changes show up
//! without touching existing sessions.
use std::sync::Arc;

use warden_common::IdentityId;

use crate::identity::Identity;
use crate::store::{CredentialStore, StoreError};

#[derive(Clone)]
pub struct SessionIdentityCodec {
    store: Arc<dyn CredentialStore>,
}

impl SessionIdentityCodec {
    pub fn new(store: Arc<dyn CredentialStore>) -> Self {
        Self { store }
    }

    pub fn serialize(&self, identity: &Identity) -> IdentityId {
        identity.id
    }

    /// `Ok(None)` when the id no longer resolves; callers treat that as signed out
    pub async fn deserialize(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        let identity = self.store.find_by_id(id).await?;
        if identity.is_none() {
            tracing::debug!(identity_id = %id, "session refers to an identity that no longer exists");
        }
        Ok(identity)
    }
}
