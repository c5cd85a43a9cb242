// ============================
// crates/backend-lib/src/config.rs
// ============================
//! Configuration management.
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Json, Serialized, Toml, Yaml},
    Figment,
};
use serde::{Deserialize, Serialize};
use warden_common::{routes, Role};

use crate::auth::password::{DEFAULT_WORK_FACTOR, MAX_WORK_FACTOR};
use crate::auth::session::MAX_SESSION_TTL;
use crate::error::AppError;


/// Prefix of environment overrides, e.g. `WARDEN_SERVER__PORT=8080`
pub const ENV_PREFIX: &str = "WARDEN_";

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

/// Application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub server: ServerSettings,
    /// Log level
    pub log_level: String,
    /// Emit logs as JSON lines
    pub log_json: bool,
    pub hashing: HashingSettings,
    pub session: SessionSettings,
    pub storage: StorageSettings,
    pub routes: RouteSettings,
    /// Accounts provisioned at startup
    pub seed: Vec<SeedAccount>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
}

/// Password hashing settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HashingSettings {
    /// scrypt cost exponent used for new digests
    pub work_factor: u8,
    /// Upper bound on hash jobs running at once
    pub max_concurrent: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionSettings {
    pub cookie_name: String,
    /// Session TTL in seconds
    pub ttl_secs: u64,
    /// Mark the cookie `Secure` (only when served over HTTPS)
    pub cookie_secure: bool,
    pub cleanup_interval_secs: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageSettings {
    pub backend: StorageBackend,
    /// Data directory path
    pub path: PathBuf,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct RouteSettings {
    /// Where a login lands when nothing was pending
    pub default_landing: String,
    /// Where logout lands
    pub logout_landing: String,
}

/// An account created by the startup provisioning step
#[derive(Clone, Serialize, Deserialize)]
pub struct SeedAccount {
    pub login: String,
    pub display_name: String,
    pub password: String,
    pub role: Role,
}

impl fmt::Debug for SeedAccount {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SeedAccount")
            .field("login", &self.login)
            .field("display_name", &self.display_name)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server: ServerSettings::default(),
            log_level: "info".to_string(),
            log_json: false,
            hashing: HashingSettings::default(),
            session: SessionSettings::default(),
            storage: StorageSettings::default(),
            routes: RouteSettings::default(),
            seed: SeedAccount::demo_accounts(),
        }
    }
}

impl Default for ServerSettings {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

impl Default for HashingSettings {
    fn default() -> Self {
        Self {
            work_factor: DEFAULT_WORK_FACTOR,
            max_concurrent: 4,
        }
    }
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            cookie_name: "warden_session".to_string(),
            ttl_secs: 60 * 60 * 24 * 7, // 7 days
            cookie_secure: false,
            cleanup_interval_secs: 60 * 60,
        }
    }
}

impl Default for StorageSettings {
    fn default() -> Self {
        Self {
            backend: StorageBackend::File,
            path: PathBuf::from("data"),
        }
    }
}

impl Default for RouteSettings {
    fn default() -> Self {
        Self {
            default_landing: routes::PROFILE.to_string(),
            logout_landing: routes::INDEX.to_string(),
        }
    }
}

impl SeedAccount {
    /// The two accounts the demo application ships with, one per role
    pub fn demo_accounts() -> Vec<SeedAccount> {
        vec![
            SeedAccount {
                login: "kraken".to_string(),
                display_name: "Kraken McSquid".to_string(),
                password: "releaseTheKraken".to_string(),
                role: Role::Admin,
            },
            SeedAccount {
                login: "awilliams".to_string(),
                display_name: "Ash Williams".to_string(),
                password: "boomstick".to_string(),
                role: Role::User,
            },
        ]
    }
}

impl Settings {
    /// Layered sources: defaults, then `warden.{toml,yaml,json}` (or `path`),
    /// then `WARDEN_*` environment variables
    pub fn figment(path: Option<&Path>) -> Figment {
        let figment = Figment::from(Serialized::defaults(Settings::default()));
        let figment = match path {
            Some(path) => match path.extension().and_then(|ext| ext.to_str()) {
                Some("yaml") | Some("yml") => figment.merge(Yaml::file(path)),
                Some("json") => figment.merge(Json::file(path)),
                _ => figment.merge(Toml::file(path)),
            },
            None => figment
                .merge(Toml::file("warden.toml"))
                .merge(Yaml::file("warden.yaml"))
                .merge(Json::file("warden.json")),
        };
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    /// Load and validate settings from the default locations
    pub fn load() -> Result<Self, AppError> {
        Self::load_from(None)
    }

    /// Load and validate settings, reading `path` instead of the default files
    pub fn load_from(path: Option<&Path>) -> Result<Self, AppError> {
        if let Some(path) = path {
            if !path.exists() {
                return Err(AppError::Config(format!(
                    "config file {} does not exist",
                    path.display()
                )));
            }
        }
        let settings: Settings = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn validate(&self) -> Result<(), AppError> {
        if !LOG_LEVELS.contains(&self.log_level.to_ascii_lowercase().as_str()) {
            return Err(AppError::Config(format!(
                "log_level must be one of {LOG_LEVELS:?}, got `{}`",
                self.log_level
            )));
        }
        if self.session.ttl_secs == 0 || self.session.ttl_secs > MAX_SESSION_TTL.as_secs() {
            return Err(AppError::Config(format!(
                "session.ttl_secs must be within 1..={}",
                MAX_SESSION_TTL.as_secs()
            )));
        }
        if self.session.cleanup_interval_secs == 0 {
            return Err(AppError::Config(
                "session.cleanup_interval_secs must be positive".to_string(),
            ));
        }
        if self.session.cookie_name.is_empty()
            || !self
                .session
                .cookie_name
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-')
        {
            return Err(AppError::Config(format!(
                "session.cookie_name `{}` is not a valid cookie name",
                self.session.cookie_name
            )));
        }
        if self.hashing.work_factor == 0 || self.hashing.work_factor > MAX_WORK_FACTOR {
            return Err(AppError::Config(format!(
                "hashing.work_factor must be within 1..={MAX_WORK_FACTOR}"
            )));
        }
        if self.hashing.max_concurrent == 0 {
            return Err(AppError::Config("hashing.max_concurrent must be positive".to_string()));
        }
        for (name, route) in [
            ("routes.default_landing", &self.routes.default_landing),
            ("routes.logout_landing", &self.routes.logout_landing),
        ] {
            if !route.starts_with('/') || route.starts_with("//") {
                return Err(AppError::Config(format!("{name} must be a local path")));
            }
        }
        for account in &self.seed {
            if account.login.trim().is_empty() || account.password.is_empty() {
                return Err(AppError::Config(
                    "seed accounts need a login and a password".to_string(),
                ));
            }
        }
        Ok(())
    }

    pub fn session_ttl(&self) -> Duration {
        Duration::from_secs(self.session.ttl_secs)
    }

    pub fn cleanup_interval(&self) -> Duration {
        Duration::from_secs(self.session.cleanup_interval_secs)
    }
}
