// ============================
// crates/backend-lib/src/store/flat_file.rs
// ============================
//! Flat-file credential store.
//!
//! All identities live in one pretty-printed JSON array at
//! `<root>/identities.json`. Reads are served from memory; every save rewrites
//! the file through a temporary sibling and a rename.
use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::{fs as tokio_fs, sync::Mutex};
use warden_common::IdentityId;

use super::{CredentialStore, MemoryCredentialStore, StoreError};
use crate::identity::Identity;

const IDENTITIES_FILE: &str = "identities.json";

/// Flat-file implementation of the CredentialStore trait
#[derive(Debug)]
pub struct FlatFileCredentialStore {
    path: PathBuf,
    cache: MemoryCredentialStore,
    write_lock: Mutex<()>,
}

impl FlatFileCredentialStore {
    /// Open (or create) the store under `root`
    pub async fn open<P: AsRef<Path>>(root: P) -> Result<Self, StoreError> {
        let root = root.as_ref().to_path_buf();
        tokio_fs::create_dir_all(&root).await?;
        let path = root.join(IDENTITIES_FILE);

        let identities: Vec<Identity> = if tokio_fs::try_exists(&path).await? {
            let content = tokio_fs::read_to_string(&path).await?;
            if content.trim().is_empty() {
                Vec::new()
            } else {
                serde_json::from_str(&content)?
            }
        } else {
            Vec::new()
        };

        tracing::debug!(path = %path.display(), count = identities.len(), "loaded identities");

        Ok(Self {
            path,
            cache: MemoryCredentialStore::from_identities(identities)?,
            write_lock: Mutex::new(()),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    async fn persist(&self, identities: &[Identity]) -> Result<(), StoreError> {
        let json = serde_json::to_string_pretty(identities)?;
        let tmp = self.path.with_extension("json.tmp");
        tokio_fs::write(&tmp, json).await?;
        tokio_fs::rename(&tmp, &self.path).await?;
        Ok(())
    }
}

#[async_trait]
impl CredentialStore for FlatFileCredentialStore {
    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError> {
        self.cache.find_by_login(login).await
    }

    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        self.cache.find_by_id(id).await
    }

    async fn save(&self, identity: &Identity) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().await;

        let mut next = self.cache.all();
        match next.iter_mut().find(|existing| existing.id == identity.id) {
            Some(existing) => *existing = identity.clone(),
            None => next.push(identity.clone()),
        }
        // Validate uniqueness before anything reaches disk
        MemoryCredentialStore::from_identities(next.iter().cloned())?;

        self.persist(&next).await?;
        self.cache.upsert(identity)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::{hash_password, WorkFactor};
    use crate::identity::NewIdentity;
    use tempfile::tempdir;
    use warden_common::Role;

    fn new_identity(login: &str, role: Role) -> NewIdentity {
        NewIdentity {
            login: login.to_string(),
            display_name: format!("{login} display"),
            password_hash: hash_password("boomstick", WorkFactor::new(2).unwrap()).unwrap(),
            role,
        }
    }

    #[tokio::test]
    async fn test_identities_survive_reopen() {
        let dir = tempdir().unwrap();
        let saved = {
            let store = FlatFileCredentialStore::open(dir.path()).await.unwrap();
            store.insert(new_identity("kraken", Role::Admin)).await.unwrap()
        };

        let reopened = FlatFileCredentialStore::open(dir.path()).await.unwrap();
        let loaded = reopened.find_by_login("kraken").await.unwrap().unwrap();
        assert_eq!(loaded, saved);
        assert_eq!(
            loaded.password_hash().as_str(),
            saved.password_hash().as_str()
        );
    }

    #[tokio::test]
    async fn test_duplicate_login_leaves_file_untouched() {
        let dir = tempdir().unwrap();
        let store = FlatFileCredentialStore::open(dir.path()).await.unwrap();
        store.insert(new_identity("kraken", Role::Admin)).await.unwrap();
        let before = std::fs::read_to_string(store.path()).unwrap();

        let err = store
            .insert(new_identity("kraken", Role::User))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::DuplicateLogin(_)));

        let after = std::fs::read_to_string(store.path()).unwrap();
        assert_eq!(before, after);
    }

    #[tokio::test]
    async fn test_corrupt_file_is_reported() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join(IDENTITIES_FILE), "{ not json").unwrap();
        let err = FlatFileCredentialStore::open(dir.path()).await.unwrap_err();
        assert!(matches!(err, StoreError::Corrupt(_)));
    }

    #[tokio::test]
    async fn test_plaintext_in_file_is_rejected() {
        let dir = tempdir().unwrap();
        let record = serde_json::json!([{
            "id": IdentityId::new(),
            "login": "kraken",
            "display_name": "Kraken McSquid",
            "password_hash": "releaseTheKraken",
            "role": "admin",
        }]);
        std::fs::write(dir.path().join(IDENTITIES_FILE), record.to_string()).unwrap();
        assert!(FlatFileCredentialStore::open(dir.path()).await.is_err());
    }
}
