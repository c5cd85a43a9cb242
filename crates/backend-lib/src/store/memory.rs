// ============================
// crates/backend-lib/src/store/memory.rs
// ============================
//! In-memory credential store.
use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::RwLock;
use warden_common::IdentityId;

use super::{CredentialStore, StoreError};
use crate::identity::Identity;

#[derive(Debug, Default)]
struct Records {
    by_id: HashMap<IdentityId, Identity>,
    by_login: HashMap<String, IdentityId>,
}

impl Records {
    fn upsert(&mut self, identity: &Identity) -> Result<(), StoreError> {
        if let Some(owner) = self.by_login.get(&identity.login) {
            if *owner != identity.id {
                return Err(StoreError::DuplicateLogin(identity.login.clone()));
            }
        }

        // A renamed login frees the old one
        if let Some(previous) = self.by_id.get(&identity.id) {
            if previous.login != identity.login {
                self.by_login.remove(&previous.login);
            }
        }

        self.by_login.insert(identity.login.clone(), identity.id);
        self.by_id.insert(identity.id, identity.clone());
        Ok(())
    }
}

/// Credential store kept entirely in process memory
#[derive(Debug, Clone, Default)]
pub struct MemoryCredentialStore {
    records: Arc<RwLock<Records>>,
}

impl MemoryCredentialStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a store from already-persisted identities
    pub(crate) fn from_identities<I>(identities: I) -> Result<Self, StoreError>
    where
        I: IntoIterator<Item = Identity>,
    {
        let mut records = Records::default();
        for identity in identities {
            records.upsert(&identity)?;
        }
        Ok(Self {
            records: Arc::new(RwLock::new(records)),
        })
    }

    /// Snapshot of every identity, ordered by login
    pub fn all(&self) -> Vec<Identity> {
        let records = self.records.read();
        let mut identities: Vec<Identity> = records.by_id.values().cloned().collect();
        identities.sort_by(|a, b| a.login.cmp(&b.login));
        identities
    }

    pub fn len(&self) -> usize {
        self.records.read().by_id.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub(crate) fn upsert(&self, identity: &Identity) -> Result<(), StoreError> {
        self.records.write().upsert(identity)
    }
}

#[async_trait]
impl CredentialStore for MemoryCredentialStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError> {
        let records = self.records.read();
        Ok(records
            .by_login
            .get(login)
            .and_then(|id| records.by_id.get(id))
            .cloned())
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        Ok(self.records.read().by_id.get(&id).cloned())
    }

    async fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        self.upsert(identity)
    }
}
