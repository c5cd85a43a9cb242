// ============================
// crates/backend-lib/src/identity.rs
// ============================
//! Stored identity records.
use serde::{Deserialize, Serialize};
use warden_common::{IdentityId, IdentitySummary, Role};
use zeroize::Zeroizing;

use crate::auth::password::{PasswordDigest, PasswordError, PasswordHasher};

/// One registered principal as held by the credential store
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub id: IdentityId,
    pub login: String,
    pub display_name: String,
    password_hash: PasswordDigest,
    pub role: Role,
}

/// An identity that has not been given an id by a store yet
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub login: String,
    pub display_name: String,
    pub password_hash: PasswordDigest,
    pub role: Role,
}

impl Identity {
    pub(crate) fn assign(id: IdentityId, new: NewIdentity) -> Self {
        Self {
            id,
            login: new.login,
            display_name: new.display_name,
            password_hash: new.password_hash,
            role: new.role,
        }
    }

    pub fn password_hash(&self) -> &PasswordDigest {
        &self.password_hash
    }

    /// Replace the password. This is the only way a stored digest changes;
    /// saving an identity never touches its digest.
    pub async fn set_password(
        &mut self,
        hasher: &PasswordHasher,
        plain: Zeroizing<String>,
    ) -> Result<(), PasswordError> {
        self.password_hash = hasher.hash(plain).await?;
        Ok(())
    }

    pub fn has_role(&self, role: Role) -> bool {
        self.role == role
    }

    pub fn summary(&self) -> IdentitySummary {
        IdentitySummary {
            id: self.id,
            login: self.login.clone(),
            display_name: self.display_name.clone(),
            role: self.role,
        }
    }
}
