//! Authentication and advisory section visibility.
//!
//! Credentials are checked through the [`Authenticator`] trait so the
//! account source can be swapped out. [`ConfigAuthenticator`] ships with the
//! crate and checks against accounts declared in configuration, each holding
//! a BLAKE3 password hash. No accounts are compiled in.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Error, Result};
use crate::model::{Role, User};

/// What a user presents at login.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    /// Login name.
    pub username: String,
    /// Plain-text password.
    pub password: String,
    /// Role the user is logging in as.
    pub role: Role,
}

impl Credentials {
    /// Bundle login credentials.
    #[must_use]
    pub fn new(username: impl Into<String>, password: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            role,
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("role", &self.role)
            .finish()
    }
}

/// A source of truth for login credentials.
pub trait Authenticator {
    /// Return the authenticated identity, or `None` if the credentials are rejected.
    fn authenticate(&self, credentials: &Credentials) -> Option<User>;
}

/// An account declared in configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Account {
    /// Login name.
    pub username: String,
    /// Role granted to the account.
    pub role: Role,
    /// Hex-encoded BLAKE3 hash of the password.
    pub password_blake3: String,
}

/// Authenticates against a fixed list of configured accounts.
#[derive(Debug, Clone, Default)]
pub struct ConfigAuthenticator {
    accounts: Vec<Account>,
}

impl ConfigAuthenticator {
    /// Create an authenticator over `accounts`.
    #[must_use]
    pub fn new(accounts: Vec<Account>) -> Self {
        Self { accounts }
    }

    /// Whether any accounts are configured.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

impl Authenticator for ConfigAuthenticator {
    fn authenticate(&self, credentials: &Credentials) -> Option<User> {
        let Some(account) = self
            .accounts
            .iter()
            .find(|a| a.username == credentials.username && a.role == credentials.role)
        else {
            debug!("No {} account named {}", credentials.role, credentials.username);
            return None;
        };

        let Ok(stored) = blake3::Hash::from_hex(&account.password_blake3) else {
            debug!("Account {} has an unreadable password hash", account.username);
            return None;
        };

        // blake3::Hash equality is constant-time.
        if stored == blake3::hash(credentials.password.as_bytes()) {
            Some(User::new(account.username.clone(), account.role))
        } else {
            None
        }
    }
}

/// Hex-encoded BLAKE3 hash of `password`, in the form accounts store it.
#[must_use]
pub fn hash_password(password: &str) -> String {
    blake3::hash(password.as_bytes()).to_hex().to_string()
}

/// A section of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Section {
    /// Headline numbers and recent registrations.
    Dashboard,
    /// Per-school statistics and analytics.
    Statistics,
    /// Fee settings and history.
    Fees,
    /// School management.
    Schools,
    /// Registration management.
    Registrations,
    /// Bulk imports and status updates.
    Bulk,
    /// The audit log.
    Audit,
    /// Report exports.
    Reports,
}

impl Section {
    /// Every section in navigation order.
    pub const ALL: [Self; 8] = [
        Self::Dashboard,
        Self::Statistics,
        Self::Fees,
        Self::Schools,
        Self::Registrations,
        Self::Bulk,
        Self::Audit,
        Self::Reports,
    ];

    /// The section's name.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Dashboard => "dashboard",
            Self::Statistics => "statistics",
            Self::Fees => "fees",
            Self::Schools => "schools",
            Self::Registrations => "registrations",
            Self::Bulk => "bulk",
            Self::Audit => "audit",
            Self::Reports => "reports",
        }
    }

    /// Whether the section is hidden from non-admin users.
    #[must_use]
    pub fn is_admin_only(self) -> bool {
        matches!(self, Self::Fees | Self::Bulk | Self::Audit | Self::Reports)
    }
}

impl fmt::Display for Section {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Section {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        Self::ALL
            .into_iter()
            .find(|section| section.as_str() == wanted)
            .ok_or_else(|| Error::invalid_value("section", s))
    }
}

impl Role {
    /// Whether the role sees `section`. Advisory only: operations do not check it.
    #[must_use]
    pub fn can_view(self, section: Section) -> bool {
        self.is_admin() || !section.is_admin_only()
    }

    /// The sections visible to this role.
    #[must_use]
    pub fn visible_sections(self) -> Vec<Section> {
        Section::ALL
            .into_iter()
            .filter(|section| self.can_view(*section))
            .collect()
    }
}
