// ============================
// crates/backend-lib/src/provision.rs
// ============================
//! Startup provisioning of known accounts.
//!
//! Runs once before the server accepts requests. Accounts whose login
//! already exists are left exactly as stored; in particular their digest
//! is never recomputed.
use metrics::counter;
use tracing::{info, warn};
use zeroize::Zeroizing;

use crate::auth::PasswordHasher;
use crate::config::SeedAccount;
use crate::error::AppError;
use crate::identity::NewIdentity;
use crate::metrics::SEED_CREATED;
use crate::store::{CredentialStore, StoreError};

/// What provisioning did
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ProvisionReport {
    pub created: Vec<String>,
    pub existing: Vec<String>,
}

pub async fn provision_accounts(
    store: &dyn CredentialStore,
    hasher: &PasswordHasher,
    accounts: &[SeedAccount],
) -> Result<ProvisionReport, AppError> {
    let mut report = ProvisionReport::default();

    for account in accounts {
        if store.find_by_login(&account.login).await?.is_some() {
            report.existing.push(account.login.clone());
            continue;
        }

        let password_hash = hasher
            .hash(Zeroizing::new(account.password.clone()))
            .await?;
        let new = NewIdentity {
            login: account.login.clone(),
            display_name: account.display_name.clone(),
            password_hash,
            role: account.role,
        };

        match store.insert(new).await {
            Ok(identity) => {
                counter!(SEED_CREATED).increment(1);
                info!(login = %identity.login, role = %identity.role, "provisioned account");
                report.created.push(identity.login);
            },
            // Someone else created it between our lookup and insert
            Err(StoreError::DuplicateLogin(login)) => {
                warn!(login = %login, "account appeared during provisioning; keeping the stored one");
                report.existing.push(login);
            },
            Err(err) => return Err(err.into()),
        }
    }

    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::{verify_password, WorkFactor};
    use crate::store::MemoryCredentialStore;
    use warden_common::Role;

    fn hasher() -> PasswordHasher {
        PasswordHasher::new(WorkFactor::new(4).unwrap(), 2)
    }

    #[tokio::test]
    async fn test_creates_demo_accounts() {
        let store = MemoryCredentialStore::new();
        let report = provision_accounts(&store, &hasher(), &SeedAccount::demo_accounts())
            .await
            .unwrap();

        assert_eq!(report.created, vec!["kraken".to_string(), "awilliams".to_string()]);
        assert!(report.existing.is_empty());

        let kraken = store.find_by_login("kraken").await.unwrap().unwrap();
        assert_eq!(kraken.role, Role::Admin);
        assert_eq!(kraken.display_name, "Kraken McSquid");
        assert!(verify_password("releaseTheKraken", kraken.password_hash()));
        assert_ne!(kraken.password_hash().as_str(), "releaseTheKraken");
    }

    #[tokio::test]
    async fn test_second_run_changes_nothing() {
        let store = MemoryCredentialStore::new();
        let accounts = SeedAccount::demo_accounts();
        provision_accounts(&store, &hasher(), &accounts).await.unwrap();
        let before = store.all();

        let report = provision_accounts(&store, &hasher(), &accounts).await.unwrap();
        assert!(report.created.is_empty());
        assert_eq!(report.existing.len(), 2);
        assert_eq!(store.all(), before);
    }

    #[tokio::test]
    async fn test_existing_credentials_are_not_overwritten() {
        let store = MemoryCredentialStore::new();
        let mut accounts = SeedAccount::demo_accounts();
        provision_accounts(&store, &hasher(), &accounts).await.unwrap();

        accounts[0].password = "a different password".to_string();
        provision_accounts(&store, &hasher(), &accounts).await.unwrap();

        let kraken = store.find_by_login("kraken").await.unwrap().unwrap();
        assert!(verify_password("releaseTheKraken", kraken.password_hash()));
        assert!(!verify_password("a different password", kraken.password_hash()));
    }
}
