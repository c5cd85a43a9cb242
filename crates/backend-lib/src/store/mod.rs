// ============================
// crates/backend-lib/src/store/mod.rs
// ============================
//! Credential store abstraction with in-memory and flat-file implementations.
use async_trait::async_trait;
use thiserror::Error;
use warden_common::IdentityId;

use crate::identity::{Identity, NewIdentity};

pub mod flat_file;
pub mod memory;

pub use flat_file::FlatFileCredentialStore;
pub use memory::MemoryCredentialStore;

/// Errors a credential store can report
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("credential store unavailable: {0}")]
    Unavailable(String),

    #[error("login `{0}` is already taken")]
    DuplicateLogin(String),

    #[error("store IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("store contents are corrupt: {0}")]
    Corrupt(#[from] serde_json::Error),
}

/// Trait for credential store backends
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Look up an identity by its unique login
    async fn find_by_login(&self, login: &str) -> Result<Option<Identity>, StoreError>;

    /// Look up an identity by id
    async fn find_by_id(&self, id: IdentityId) -> Result<Option<Identity>, StoreError>;

    /// Upsert keyed by `identity.id`.
    ///
    /// Fails with [`StoreError::DuplicateLogin`] when another identity
    /// already owns the login; the existing record is left untouched.
    async fn save(&self, identity: &Identity) -> Result<(), StoreError>;

    /// Assign an id to a new identity and save it
    async fn insert(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let identity = Identity::assign(IdentityId::new(), new);
        self.save(&identity).await?;
        Ok(identity)
    }
}
