//! Domain operations over the persisted dataset.
//!
//! [`Registry`] owns the storage handle, the loaded [`Dataset`] and the
//! session. Every mutating operation requires a logged-in user, appends to
//! the audit log and writes the dataset back in one transaction.

mod bulk;
mod fees;
mod registrations;
mod reports;
mod schools;
mod session;

use tracing::{debug, info, warn};

use crate::confirm::Confirm;
use crate::dataset::Dataset;
use crate::error::{Error, Result};
use crate::model::{AuditLogEntry, AuditType, FeeSettings, User};
use crate::storage::schema::{KEY_CURRENT_USER, KEY_SCHOOLS};
use crate::storage::Storage;

/// How a registry is opened.
#[derive(Debug, Clone, PartialEq)]
pub struct RegistryOptions {
    /// Fee settings used when none are stored yet.
    pub default_fees: FeeSettings,
    /// Insert sample schools and registrations into an empty store.
    pub seed_sample_data: bool,
}

impl Default for RegistryOptions {
    fn default() -> Self {
        Self {
            default_fees: FeeSettings::default(),
            seed_sample_data: true,
        }
    }
}

/// The school registration store and its operations.
#[derive(Debug)]
pub struct Registry {
    storage: Storage,
    data: Dataset,
    session: Option<User>,
}

impl Registry {
    /// Load the dataset and session from `storage`.
    ///
    /// Seeds sample data into a store that has never held a school
    /// collection, when seeding is enabled. A store whose schools were all
    /// deleted is left as it is.
    ///
    /// # Errors
    ///
    /// Returns an error if the stored dataset cannot be read or the seeded
    /// data cannot be written.
    pub fn open(storage: Storage, options: &RegistryOptions) -> Result<Self> {
        let initialized = storage.get_raw(KEY_SCHOOLS)?.is_some();
        let mut data = Dataset::load(&storage, options.default_fees)?;

        if options.seed_sample_data && !initialized {
            data.seed_sample_data();
            data.save(&storage)?;
            info!("Initialized sample data");
        }

        let session = match storage.get::<User>(KEY_CURRENT_USER) {
            Ok(session) => session,
            Err(e) => {
                warn!("Ignoring unreadable session: {}", e);
                None
            }
        };

        Ok(Self {
            storage,
            data,
            session,
        })
    }

    /// The loaded dataset.
    #[must_use]
    pub fn data(&self) -> &Dataset {
        &self.data
    }

    /// The underlying storage.
    #[must_use]
    pub fn storage(&self) -> &Storage {
        &self.storage
    }

    /// The logged-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<&User> {
        self.session.as_ref()
    }

    /// Username of the logged-in user.
    fn require_user(&self) -> Result<String> {
        self.session
            .as_ref()
            .map(|user| user.username.clone())
            .ok_or(Error::NotLoggedIn)
    }

    fn record(&mut self, kind: AuditType, description: impl Into<String>, user: &str) {
        let entry = AuditLogEntry::new(kind, description, user);
        debug!("Audit [{}] {}", entry.kind, entry.description);
        self.data.audit_logs.push(entry);
    }

    /// Save the dataset, restoring `before` in memory if the write fails.
    fn persist(&mut self, before: Dataset) -> Result<()> {
        self.persist_with(before, Vec::new(), &[])
    }

    /// Like [`Self::persist`], also storing `extra` and deleting `removals`
    /// in the same transaction.
    fn persist_with(
        &mut self,
        before: Dataset,
        extra: Vec<(&'static str, String)>,
        removals: &[&str],
    ) -> Result<()> {
        let written = self.data.entries().and_then(|mut entries| {
            entries.extend(extra);
            self.storage.write(&entries, removals)
        });
        if let Err(e) = written {
            warn!("Discarding unsaved changes: {}", e);
            self.data = before;
            return Err(e);
        }
        Ok(())
    }
}

/// Ask `confirm` and turn a refusal into a cancellation error.
fn require_confirmation(confirm: &mut dyn Confirm, prompt: &str, action: &str) -> Result<()> {
    if confirm.confirm(prompt) {
        Ok(())
    } else {
        debug!("{} declined", action);
        Err(Error::cancelled(action))
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::auth::{Authenticator, Credentials};
    use crate::model::Role;

    /// Accepts any credentials.
    #[derive(Debug)]
    pub struct AcceptAll;

    impl Authenticator for AcceptAll {
        fn authenticate(&self, credentials: &Credentials) -> Option<User> {
            Some(User::new(credentials.username.clone(), credentials.role))
        }
    }

    /// Declines every prompt.
    #[derive(Debug)]
    pub struct Decline;

    impl Confirm for Decline {
        fn confirm(&mut self, _prompt: &str) -> bool {
            false
        }
    }

    /// An empty registry without a session.
    pub fn empty_registry() -> Registry {
        let options = RegistryOptions {
            seed_sample_data: false,
            ..RegistryOptions::default()
        };
        Registry::open(Storage::open_in_memory().unwrap(), &options).unwrap()
    }

    /// A registry with sample data and `admin` logged in.
    pub fn admin_registry() -> Registry {
        let storage = Storage::open_in_memory().unwrap();
        let mut registry = Registry::open(storage, &RegistryOptions::default()).unwrap();
        registry
            .login(&AcceptAll, &Credentials::new("admin", "pw", Role::Admin))
            .unwrap();
        registry
    }

    /// Number of audit entries of `kind`.
    pub fn audit_count(registry: &Registry, kind: AuditType) -> usize {
        registry
            .data()
            .audit_logs
            .iter()
            .filter(|e| e.kind == kind)
            .count()
    }
}
