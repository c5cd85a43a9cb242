// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
//!
//! Digests are scrypt PHC strings (`$scrypt$ln=8,r=8,p=1$<salt>$<hash>`).
//! The work factor is the scrypt cost exponent `ln` and travels inside the
//! digest, so raising the configured work factor never invalidates digests
//! created at an older cost.
use std::fmt;
use std::sync::Arc;

use rand::RngCore;
use scrypt::{
    password_hash::{
        PasswordHash, PasswordHasher as _, PasswordVerifier as _, SaltString,
    },
    Params, Scrypt,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio::sync::Semaphore;
use zeroize::Zeroizing;

/// Work factor used when configuration does not name one
pub const DEFAULT_WORK_FACTOR: u8 = 8;

/// Highest accepted work factor (2^20 scrypt iterations)
pub const MAX_WORK_FACTOR: u8 = 20;

const SCRYPT_BLOCK_SIZE: u32 = 8;
const SCRYPT_PARALLELISM: u32 = 1;
const SCRYPT_OUTPUT_LEN: usize = 32;
const SALT_BYTES: usize = 16;

/// Errors raised while hashing or verifying
#[derive(Error, Debug)]
pub enum PasswordError {
    #[error("work factor {0} is outside 1..={MAX_WORK_FACTOR}")]
    InvalidWorkFactor(u8),

    #[error("malformed password digest")]
    MalformedDigest,

    #[error("hashing failed: {0}")]
    Hash(String),

    #[error("hashing task did not complete: {0}")]
    Task(String),
}

/// Cost parameter of the hasher, the scrypt `log2(N)`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct WorkFactor(u8);

impl WorkFactor {
    pub fn new(value: u8) -> Result<Self, PasswordError> {
        if value == 0 || value > MAX_WORK_FACTOR {
            return Err(PasswordError::InvalidWorkFactor(value));
        }
        Ok(Self(value))
    }

    pub fn get(self) -> u8 {
        self.0
    }
}

impl Default for WorkFactor {
    fn default() -> Self {
        Self(DEFAULT_WORK_FACTOR)
    }
}

/// Output of the hasher. Only ever built by hashing a plaintext or by
/// parsing a previously stored digest, never from a plaintext directly.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct PasswordDigest(String);

impl PasswordDigest {
    /// Parse a stored digest, rejecting anything that is not an scrypt PHC string
    pub fn parse(encoded: &str) -> Result<Self, PasswordError> {
        let parsed = PasswordHash::new(encoded).map_err(|_| PasswordError::MalformedDigest)?;
        if parsed.algorithm.as_str() != "scrypt" || parsed.hash.is_none() {
            return Err(PasswordError::MalformedDigest);
        }
        Ok(Self(encoded.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The work factor this digest was created with
    #[cfg(test)]
    fn work_factor(&self) -> Option<u8> {
        let parsed = PasswordHash::new(&self.0).ok()?;
        let ln = parsed.params.get_decimal("ln")?;
        u8::try_from(ln).ok()
    }
}

impl TryFrom<String> for PasswordDigest {
    type Error = PasswordError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<PasswordDigest> for String {
    fn from(digest: PasswordDigest) -> Self {
        digest.0
    }
}

impl fmt::Debug for PasswordDigest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PasswordDigest(<redacted>)")
    }
}

/// Hash a password using scrypt with a fresh random salt
pub fn hash_password(plain: &str, work_factor: WorkFactor) -> Result<PasswordDigest, PasswordError> {
    let mut salt_bytes = [0u8; SALT_BYTES];
    rand::rng().fill_bytes(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes).map_err(|e| PasswordError::Hash(e.to_string()))?;

    let params = Params::new(
        work_factor.get(),
        SCRYPT_BLOCK_SIZE,
        SCRYPT_PARALLELISM,
        SCRYPT_OUTPUT_LEN,
    )
    .map_err(|e| PasswordError::Hash(e.to_string()))?;

    let hash = Scrypt
        .hash_password_customized(plain.as_bytes(), None, None, params, &salt)
        .map_err(|e| PasswordError::Hash(e.to_string()))?
        .to_string();
    Ok(PasswordDigest(hash))
}

/// Verify a password against a digest.
///
/// The cost parameters are read back from the digest itself.
pub fn verify_password(plain: &str, digest: &PasswordDigest) -> bool {
    let parsed_hash = match PasswordHash::new(digest.as_str()) {
        Ok(h) => h,
        Err(_) => return false,
    };
    Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
}

/// Runs hashing on the blocking pool so request workers never spin on scrypt.
///
/// A semaphore bounds how many hash jobs run at once; requests beyond that
/// wait their turn instead of piling onto the blocking pool.
#[derive(Clone)]
pub struct PasswordHasher {
    work_factor: WorkFactor,
    permits: Arc<Semaphore>,
}

impl PasswordHasher {
    pub fn new(work_factor: WorkFactor, max_concurrent: usize) -> Self {
        Self {
            work_factor,
            permits: Arc::new(Semaphore::new(max_concurrent.max(1))),
        }
    }

    pub fn work_factor(&self) -> WorkFactor {
        self.work_factor
    }

    /// Hash a plaintext at the configured work factor
    pub async fn hash(&self, plain: Zeroizing<String>) -> Result<PasswordDigest, PasswordError> {
        let work_factor = self.work_factor;
        self.run_blocking(move || hash_password(&plain, work_factor))
            .await?
    }

    /// Verify a plaintext against a stored digest
    pub async fn verify(
        &self,
        plain: Zeroizing<String>,
        digest: PasswordDigest,
    ) -> Result<bool, PasswordError> {
        self.run_blocking(move || verify_password(&plain, &digest)).await
    }

    async fn run_blocking<F, T>(&self, job: F) -> Result<T, PasswordError>
    where
        F: FnOnce() -> T + Send + 'static,
        T: Send + 'static,
    {
        let _permit = self
            .permits
            .acquire()
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))?;
        tokio::task::spawn_blocking(job)
            .await
            .map_err(|e| PasswordError::Task(e.to_string()))
    }
}

impl fmt::Debug for PasswordHasher {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PasswordHasher")
            .field("work_factor", &self.work_factor)
            .field("available_permits", &self.permits.available_permits())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fast() -> WorkFactor {
        WorkFactor::new(4).unwrap()
    }

    #[test]
    fn test_hash_then_verify() {
        for wf in [1u8, 4, 6] {
            let digest = hash_password("boomstick", WorkFactor::new(wf).unwrap()).unwrap();
            assert!(verify_password("boomstick", &digest));
            assert!(!verify_password("boomstick!", &digest));
            assert!(!verify_password("", &digest));
        }
    }

    #[test]
    fn test_same_plaintext_gets_fresh_salt() {
        let first = hash_password("releaseTheKraken", fast()).unwrap();
        let second = hash_password("releaseTheKraken", fast()).unwrap();
        assert_ne!(first, second);
        assert!(verify_password("releaseTheKraken", &first));
        assert!(verify_password("releaseTheKraken", &second));
    }

    #[test]
    fn test_distinct_plaintexts_give_distinct_digests() {
        let a = hash_password("alpha", fast()).unwrap();
        let b = hash_password("bravo", fast()).unwrap();
        assert_ne!(a, b);
        assert!(!verify_password("alpha", &b));
    }

    #[test]
    fn test_digest_records_work_factor() {
        let digest = hash_password("boomstick", fast()).unwrap();
        assert!(digest.as_str().starts_with("$scrypt$"));
        assert_eq!(digest.work_factor(), Some(4));
    }

    #[tokio::test]
    async fn test_old_digest_still_verifies_after_cost_change() {
        let old = hash_password("boomstick", WorkFactor::new(2).unwrap()).unwrap();
        let current = PasswordHasher::new(WorkFactor::new(6).unwrap(), 1);
        assert!(current
            .verify(Zeroizing::new("boomstick".to_string()), old.clone())
            .await
            .unwrap());
        assert_eq!(old.work_factor(), Some(2));

        let fresh = current
            .hash(Zeroizing::new("boomstick".to_string()))
            .await
            .unwrap();
        assert_eq!(fresh.work_factor(), Some(6));
    }

    #[test]
    fn test_work_factor_bounds() {
        assert!(WorkFactor::new(0).is_err());
        assert!(WorkFactor::new(MAX_WORK_FACTOR + 1).is_err());
        assert_eq!(WorkFactor::default().get(), DEFAULT_WORK_FACTOR);
    }

    #[test]
    fn test_digest_parse_rejects_plaintext() {
        assert!(PasswordDigest::parse("boomstick").is_err());
        assert!(PasswordDigest::parse("$argon2id$v=19$m=16,t=2,p=1$c29tZXNhbHQ$aGFzaA").is_err());

        let digest = hash_password("boomstick", fast()).unwrap();
        let reparsed = PasswordDigest::parse(digest.as_str()).unwrap();
        assert_eq!(reparsed, digest);
    }

    #[test]
    fn test_digest_debug_is_redacted() {
        let digest = hash_password("boomstick", fast()).unwrap();
        assert!(!format!("{digest:?}").contains("scrypt"));
    }

    #[tokio::test]
    async fn test_async_hasher_round_trip() {
        let hasher = PasswordHasher::new(fast(), 2);
        let digest = hasher
            .hash(Zeroizing::new("boomstick".to_string()))
            .await
            .unwrap();
        assert!(hasher
            .verify(Zeroizing::new("boomstick".to_string()), digest.clone())
            .await
            .unwrap());
        assert!(!hasher
            .verify(Zeroizing::new("wrongpass".to_string()), digest)
            .await
            .unwrap());
    }
}
