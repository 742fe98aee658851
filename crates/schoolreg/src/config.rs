//! Configuration management for schoolreg.
//!
//! Configuration is layered with figment: built-in defaults, then the TOML
//! file, then `SCHOOLREG_` environment variables. Nested keys use a double
//! underscore, e.g. `SCHOOLREG_STORAGE__SEED_SAMPLE_DATA=false`.

use std::collections::HashSet;
use std::path::PathBuf;

use chrono::format::{Item, StrftimeItems};
use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use regex::Regex;
use serde::{Deserialize, Serialize};

use crate::auth::{Account, ConfigAuthenticator};
use crate::error::{Error, Result};
use crate::model::FeeSettings;
use crate::registry::RegistryOptions;

/// Default configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Directory name under the platform config and data directories.
const APP_DIR_NAME: &str = "schoolreg";

/// Default database file name.
const DATABASE_FILE_NAME: &str = "schoolreg.db";

/// Application configuration.
///
/// Configuration is loaded from (in order of precedence, highest first):
/// 1. Environment variables (prefixed with `SCHOOLREG_`)
/// 2. TOML config file at `~/.config/schoolreg/config.toml`
/// 3. Default values
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Storage configuration.
    pub storage: StorageConfig,
    /// Fee settings used until an admin changes them.
    pub fees: FeesConfig,
    /// Login accounts.
    pub auth: AuthConfig,
    /// Output formatting.
    pub display: DisplayConfig,
}

/// Storage-related configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path to the database file.
    /// Defaults to `~/.local/share/schoolreg/schoolreg.db`
    pub database_path: Option<PathBuf>,
    /// Insert sample schools and registrations into an empty database.
    pub seed_sample_data: bool,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database_path: None,
            seed_sample_data: true,
        }
    }
}

/// Initial fee settings.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeesConfig {
    /// Base registration fee.
    pub registration_fee: f64,
    /// Book fee.
    pub book_fee: f64,
    /// Late payment fee.
    pub late_fee: f64,
    /// Bulk discount in percent.
    pub bulk_discount: u32,
}

impl Default for FeesConfig {
    fn default() -> Self {
        let fees = FeeSettings::default();
        Self {
            registration_fee: fees.registration_fee,
            book_fee: fees.book_fee,
            late_fee: fees.late_fee,
            bulk_discount: fees.bulk_discount,
        }
    }
}

impl FeesConfig {
    /// The configured values as a fee settings record.
    #[must_use]
    pub fn settings(&self) -> FeeSettings {
        FeeSettings {
            registration_fee: self.registration_fee,
            book_fee: self.book_fee,
            late_fee: self.late_fee,
            bulk_discount: self.bulk_discount,
        }
    }
}

/// Accounts allowed to log in. Empty by default; nobody can log in until
/// accounts are configured.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AuthConfig {
    /// Configured accounts.
    pub accounts: Vec<Account>,
}

/// Output formatting.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Number of recent registrations shown on the dashboard.
    pub recent_limit: usize,
    /// `strftime` format for dates in tables and exports.
    pub date_format: String,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            recent_limit: 5,
            date_format: "%Y-%m-%d".to_string(),
        }
    }
}

impl Config {
    /// Load configuration from all sources.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load() -> Result<Self> {
        Self::load_from(None)
    }

    /// Load configuration with an optional custom config path.
    ///
    /// # Errors
    ///
    /// Returns an error if configuration loading, parsing or validation fails.
    pub fn load_from(config_path: Option<PathBuf>) -> Result<Self> {
        let config_file = config_path.unwrap_or_else(Self::default_config_path);

        let config: Config = Figment::new()
            .merge(Serialized::defaults(Config::default()))
            .merge(Toml::file(&config_file))
            .merge(Env::prefixed("SCHOOLREG_").split("__"))
            .extract()?;
        config.validate()?;
        Ok(config)
    }

    /// Get the default configuration file path.
    #[must_use]
    pub fn default_config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from(".config"))
            .join(APP_DIR_NAME)
            .join(CONFIG_FILE_NAME)
    }

    /// Get the default data directory path.
    #[must_use]
    pub fn default_data_dir() -> PathBuf {
        dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from(".local/share"))
            .join(APP_DIR_NAME)
    }

    /// Get the database path, resolving defaults if not set.
    #[must_use]
    pub fn database_path(&self) -> PathBuf {
        self.storage
            .database_path
            .clone()
            .unwrap_or_else(|| Self::default_data_dir().join(DATABASE_FILE_NAME))
    }

    /// Options for opening the registry.
    #[must_use]
    pub fn registry_options(&self) -> RegistryOptions {
        RegistryOptions {
            default_fees: self.fees.settings(),
            seed_sample_data: self.storage.seed_sample_data,
        }
    }

    /// An authenticator over the configured accounts.
    #[must_use]
    pub fn authenticator(&self) -> ConfigAuthenticator {
        ConfigAuthenticator::new(self.auth.accounts.clone())
    }

    /// Validate the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid.
    pub fn validate(&self) -> Result<()> {
        self.fees
            .settings()
            .validate()
            .map_err(|e| invalid(format!("fees: {e}")))?;

        let hash = Regex::new("^[0-9a-f]{64}$").map_err(|e| Error::internal(e.to_string()))?;
        let mut seen = HashSet::new();
        for account in &self.auth.accounts {
            if account.username.trim().is_empty() {
                return Err(invalid("account username cannot be empty"));
            }
            if !seen.insert(account.username.as_str()) {
                return Err(invalid(format!("duplicate account '{}'", account.username)));
            }
            if !hash.is_match(&account.password_blake3) {
                return Err(invalid(format!(
                    "account '{}' password_blake3 must be 64 lowercase hex characters",
                    account.username
                )));
            }
        }

        if self.display.recent_limit == 0 {
            return Err(invalid("recent_limit must be greater than 0"));
        }
        if self.display.date_format.is_empty()
            || StrftimeItems::new(&self.display.date_format).any(|item| matches!(item, Item::Error))
        {
            return Err(invalid(format!(
                "invalid date_format: {:?}",
                self.display.date_format
            )));
        }

        Ok(())
    }
}

fn invalid(message: impl Into<String>) -> Error {
    Error::ConfigValidation {
        message: message.into(),
    }
}
