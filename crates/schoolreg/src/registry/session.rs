use tracing::{info, warn};

use super::{require_confirmation, Registry};
use crate::auth::{Authenticator, Credentials};
use crate::confirm::Confirm;
use crate::error::{Error, Result};
use crate::model::{AuditType, User};
use crate::storage::schema::KEY_CURRENT_USER;

impl Registry {
    /// Check `credentials` and start a session.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidCredentials`] if the authenticator rejects the
    /// credentials, or a storage error if the session cannot be saved.
    pub fn login(
        &mut self,
        authenticator: &dyn Authenticator,
        credentials: &Credentials,
    ) -> Result<User> {
        let Some(user) = authenticator.authenticate(credentials) else {
            warn!("Rejected login for {}", credentials.username);
            return Err(Error::InvalidCredentials);
        };

        let before = self.data.clone();
        self.record(
            AuditType::Login,
            format!("User {} logged in as {}", user.username, user.role),
            &user.username,
        );
        let session = serde_json::to_string(&user)?;
        self.persist_with(before, vec![(KEY_CURRENT_USER, session)], &[])?;
        self.session = Some(user.clone());

        info!("Logged in as {}", user);
        Ok(user)
    }

    /// End the session after confirmation.
    ///
    /// # Errors
    ///
    /// Returns [`Error::NotLoggedIn`] without a session, a cancellation
    /// error if the user declines, or a storage error.
    pub fn logout(&mut self, confirm: &mut dyn Confirm) -> Result<User> {
        let username = self.require_user()?;
        require_confirmation(confirm, "Are you sure you want to logout?", "logout")?;

        let before = self.data.clone();
        self.record(
            AuditType::Logout,
            format!("User {username} logged out"),
            &username,
        );
        self.persist_with(before, Vec::new(), &[KEY_CURRENT_USER])?;

        let user = self.session.take().ok_or(Error::NotLoggedIn)?;
        info!("Logged out {}", user.username);
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::super::test_support::*;
    use super::super::RegistryOptions;
    use super::*;
    use crate::auth::{hash_password, Account, ConfigAuthenticator};
    use crate::confirm::AssumeYes;
    use crate::model::Role;
    use crate::storage::Storage;

    #[test]
    fn test_login_persists_session_and_audits() {
        let mut registry = empty_registry();
        let user = registry
            .login(&AcceptAll, &Credentials::new("coord", "pw", Role::Coordinator))
            .unwrap();

        assert_eq!(registry.current_user(), Some(&user));
        let stored: User = registry.storage().get(KEY_CURRENT_USER).unwrap().unwrap();
        assert_eq!(stored, user);

        let entry = registry.data().audit_logs.last().unwrap();
        assert_eq!(entry.kind, AuditType::Login);
        assert_eq!(entry.description, "User coord logged in as coordinator");
        assert_eq!(entry.user, "coord");
    }

    #[test]
    fn test_login_with_config_accounts() {
        let auth = ConfigAuthenticator::new(vec![Account {
            username: "principal".to_string(),
            role: Role::Admin,
            password_blake3: hash_password("s3cret"),
        }]);
        let mut registry = empty_registry();

        let err = registry
            .login(&auth, &Credentials::new("principal", "guess", Role::Admin))
            .unwrap_err();
        assert!(matches!(err, Error::InvalidCredentials));
        assert!(registry.current_user().is_none());
        assert!(registry.data().audit_logs.is_empty());

        registry
            .login(&auth, &Credentials::new("principal", "s3cret", Role::Admin))
            .unwrap();
        assert_eq!(registry.current_user().unwrap().username, "principal");
    }

    #[test]
    fn test_session_survives_reopen() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schoolreg.db");
        {
            let mut registry =
                Registry::open(Storage::open(&path).unwrap(), &RegistryOptions::default()).unwrap();
            registry
                .login(&AcceptAll, &Credentials::new("admin", "pw", Role::Admin))
                .unwrap();
        }
        let registry =
            Registry::open(Storage::open(&path).unwrap(), &RegistryOptions::default()).unwrap();
        assert_eq!(registry.current_user().unwrap().role, Role::Admin);
    }

    #[test]
    fn test_logout() {
        let mut registry = admin_registry();
        let user = registry.logout(&mut AssumeYes).unwrap();
        assert_eq!(user.username, "admin");
        assert!(registry.current_user().is_none());
        assert!(registry
            .storage()
            .get::<User>(KEY_CURRENT_USER)
            .unwrap()
            .is_none());

        let entry = registry.data().audit_logs.last().unwrap();
        assert_eq!(entry.kind, AuditType::Logout);
        assert_eq!(entry.description, "User admin logged out");
    }

    #[test]
    fn test_logout_declined_keeps_session() {
        let mut registry = admin_registry();
        let before = registry.data().audit_logs.len();
        assert!(registry.logout(&mut Decline).unwrap_err().is_cancelled());
        assert!(registry.current_user().is_some());
        assert_eq!(registry.data().audit_logs.len(), before);
    }

    #[test]
    fn test_failed_logout_keeps_session_and_audit_log() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("schoolreg.db");
        let mut registry =
            Registry::open(Storage::open(&path).unwrap(), &RegistryOptions::default()).unwrap();
        registry
            .login(&AcceptAll, &Credentials::new("admin", "pw", Role::Admin))
            .unwrap();
        let audit_count = registry.data().audit_logs.len();

        rusqlite::Connection::open(&path)
            .unwrap()
            .execute_batch(
                "CREATE TRIGGER keep_entries BEFORE DELETE ON entries
                 BEGIN SELECT RAISE(ABORT, 'deletes disabled'); END;",
            )
            .unwrap();

        assert!(registry.logout(&mut AssumeYes).is_err());
        assert!(registry.current_user().is_some());
        assert_eq!(registry.data().audit_logs.len(), audit_count);

        let stored: Option<User> = registry.storage().get(KEY_CURRENT_USER).unwrap();
        assert_eq!(stored.unwrap().username, "admin");
        let reopened =
            Registry::open(Storage::open(&path).unwrap(), &RegistryOptions::default()).unwrap();
        assert_eq!(reopened.data().audit_logs.len(), audit_count);
        assert!(reopened
            .data()
            .audit_logs
            .iter()
            .all(|entry| entry.kind != AuditType::Logout));
    }

    #[test]
    fn test_logout_without_session() {
        let mut registry = empty_registry();
        assert!(registry.logout(&mut AssumeYes).unwrap_err().is_not_logged_in());
    }
}
