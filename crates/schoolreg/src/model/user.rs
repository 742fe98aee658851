//! Users and roles.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// Access role of a user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    /// Full access to every section.
    Admin,
    /// Non-admin sections only (advisory).
    Coordinator,
}

impl Role {
    /// The stored name of the role.
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Admin => "admin",
            Self::Coordinator => "coordinator",
        }
    }

    /// Whether this is the admin role.
    #[must_use]
    pub fn is_admin(self) -> bool {
        self == Self::Admin
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "admin" => Ok(Self::Admin),
            "coordinator" => Ok(Self::Coordinator),
            _ => Err(Error::invalid_value("role", s)),
        }
    }
}

/// The identity held in the session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    /// Login name, recorded as the acting user in audit entries.
    pub username: String,
    /// Access role.
    pub role: Role,
}

impl User {
    /// Create a user identity.
    #[must_use]
    pub fn new(username: impl Into<String>, role: Role) -> Self {
        Self {
            username: username.into(),
            role,
        }
    }
}

impl fmt::Display for User {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.username, self.role)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse() {
        assert_eq!("Admin".parse::<Role>().unwrap(), Role::Admin);
        assert_eq!("coordinator".parse::<Role>().unwrap(), Role::Coordinator);
        assert!("principal".parse::<Role>().is_err());
    }

    #[test]
    fn test_user_display() {
        let user = User::new("admin", Role::Admin);
        assert_eq!(user.to_string(), "admin (admin)");
    }

    #[test]
    fn test_user_json_layout() {
        let user = User::new("coord", Role::Coordinator);
        let json = serde_json::to_string(&user).unwrap();
        assert_eq!(json, r#"{"username":"coord","role":"coordinator"}"#);
    }
}
